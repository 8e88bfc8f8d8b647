//! Workout catalogue
//!
//! The built-in exercise definitions that drive rep targets, duration
//! targets and prompt context. Workout ids are stable across the live feed,
//! the reference motion store and saved session summaries.

use serde::{Deserialize, Serialize};

/// Muscle-group grouping used in session summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutCategory {
    Arms,
    Legs,
    Core,
    Chest,
    Back,
    Shoulders,
    Cardio,
    Stretching,
}

impl WorkoutCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutCategory::Arms => "Arms",
            WorkoutCategory::Legs => "Legs",
            WorkoutCategory::Core => "Core",
            WorkoutCategory::Chest => "Chest",
            WorkoutCategory::Back => "Back",
            WorkoutCategory::Shoulders => "Shoulders",
            WorkoutCategory::Cardio => "Cardio",
            WorkoutCategory::Stretching => "Stretching",
        }
    }
}

/// A single exercise definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workout {
    pub id: u32,
    pub title: &'static str,
    pub category: WorkoutCategory,
    /// Rep goal for one session.
    pub target_reps: u32,
    /// Duration goal in seconds.
    pub target_duration_secs: u32,
    /// One-line form cue shown to the user and fed to the coach persona.
    pub description: &'static str,
}

const fn workout(
    id: u32,
    title: &'static str,
    category: WorkoutCategory,
    target_reps: u32,
    target_duration_secs: u32,
    description: &'static str,
) -> Workout {
    Workout {
        id,
        title,
        category,
        target_reps,
        target_duration_secs,
        description,
    }
}

use WorkoutCategory::*;

/// The full catalogue, ordered by id.
pub const CATALOGUE: &[Workout] = &[
    workout(1, "Bicep Curls", Arms, 12, 300, "Control the weight on both up and down movements"),
    workout(2, "Tricep Dips", Arms, 10, 300, "Keep your body straight and control the movement"),
    workout(3, "Squats", Legs, 15, 300, "Keep your back straight and lower down slowly"),
    workout(4, "Lunges", Legs, 12, 300, "Step forward and keep your balance"),
    workout(5, "Plank", Core, 3, 180, "Hold position and keep your core tight"),
    workout(6, "Sit-ups", Core, 15, 300, "Focus on using your core, not your neck"),
    workout(7, "Hammer Curls", Arms, 12, 240, "Use neutral grip and control the weight"),
    workout(8, "Overhead Press", Arms, 10, 360, "Press straight up and lower with control"),
    workout(9, "Calf Raises", Legs, 20, 180, "Rise up on your toes and control the descent"),
    workout(10, "Wall Sits", Legs, 3, 240, "Hold position with your back against the wall"),
    workout(11, "Russian Twists", Core, 20, 240, "Rotate your torso while keeping your core engaged"),
    workout(12, "Mountain Climbers", Core, 20, 180, "Keep your core tight and maintain steady pace"),
    workout(13, "Push-ups", Chest, 12, 300, "Keep your body in a straight line from head to heels"),
    workout(14, "Chest Press", Chest, 10, 360, "Control the weight both up and down"),
    workout(15, "Chest Flys", Chest, 12, 240, "Use controlled movements and feel the stretch"),
    workout(16, "Pull-ups", Back, 8, 360, "Pull yourself up using your back muscles"),
    workout(17, "Rows", Back, 12, 300, "Pull the weight towards your torso"),
    workout(18, "Reverse Flys", Back, 15, 240, "Squeeze your shoulder blades together"),
    workout(19, "Lateral Raises", Shoulders, 12, 240, "Lift weights to the side with control"),
    workout(20, "Front Raises", Shoulders, 12, 240, "Lift weights to the front with straight arms"),
    workout(21, "Shoulder Shrugs", Shoulders, 15, 180, "Lift your shoulders up and squeeze"),
    workout(22, "Jumping Jacks", Cardio, 30, 180, "Jump with energy and maintain rhythm"),
    workout(23, "Burpees", Cardio, 10, 240, "Complete movement from squat to jump"),
    workout(24, "High Knees", Cardio, 30, 180, "Lift your knees high and pump your arms"),
    workout(25, "Forward Fold", Stretching, 1, 120, "Stretch forward slowly and hold the position"),
    workout(26, "Shoulder Rolls", Stretching, 10, 120, "Roll your shoulders in smooth circles"),
    workout(27, "Hip Circles", Stretching, 10, 180, "Move your hips in controlled circular motions"),
    workout(28, "Cat-Cow Stretch", Stretching, 10, 180, "Alternate between arching and rounding your back"),
    workout(29, "Quad Stretch", Stretching, 2, 120, "Hold your foot behind you and feel the stretch"),
    workout(30, "Child's Pose", Stretching, 1, 180, "Relax in this restorative position"),
];

/// Looks up a workout by id.
pub fn find(id: u32) -> Option<&'static Workout> {
    CATALOGUE.iter().find(|w| w.id == id)
}
