//! Coaching prompt templates
//!
//! Builds the prompts sent to the generation service: one template per
//! feedback category, each prefixed with an avoid-repetition clause made
//! from the most recent history messages, plus the coach persona system
//! instructions for live feedback and for spoken user queries.

use crate::feedback::FeedbackCategory;
use crate::workout::Workout;

/// System instruction for live feedback sentences.
pub const COACH_SYSTEM_PROMPT: &str = "You are Coach Mike, a motivational male fitness trainer. \
Give exactly ONE brief sentence of natural encouragement. Do NOT use formatting like asterisks, \
bullets, or multiple phrases. Do NOT include stage directions. Just give one natural, \
conversational sentence. Examples: \"Nice form on that rep!\" or \"Keep that energy up!\" or \
\"You're crushing it!\"";

/// System instruction for spoken user queries, with session context.
pub fn voice_query_system_prompt(workout: Option<&Workout>, rep_count: u32) -> String {
    let mut prompt = String::from(
        "You are Coach Mike, a motivational male fitness trainer with 15+ years of experience. \
You speak like a supportive gym coach: strong, encouraging, and firm. Keep responses concise \
(1-2 sentences max) but impactful. Focus on proper form, motivation, and pushing through \
challenges.",
    );

    if let Some(w) = workout {
        prompt.push_str(&format!(
            "\n\nCurrent workout: {}\nCurrent reps: {}/{}\nWorkout description: {}",
            w.title, rep_count, w.target_reps, w.description
        ));
    }

    prompt
}

/// Builds the generation prompt for a feedback category.
///
/// `recent` carries the last few already-spoken messages (oldest first) so
/// the service can avoid repeating itself.
pub fn feedback_prompt(
    category: FeedbackCategory,
    workout: &Workout,
    rep_count: u32,
    form_message: Option<&str>,
    recent: &[String],
) -> String {
    let avoid = if recent.is_empty() {
        String::new()
    } else {
        format!("Avoid repeating: \"{}\". ", recent.join("; "))
    };

    match category {
        FeedbackCategory::CriticalForm => format!(
            "URGENT: The user's back posture angle is dangerously high during {}. Tell them to \
straighten their back RIGHT NOW in one firm but encouraging sentence. Use words like \
\"straighten your back\" or \"fix your posture\".",
            workout.title
        ),
        FeedbackCategory::FormCorrection => match form_message {
            Some(issue) if !issue.is_empty() => format!(
                "{}The user has a form issue during {}: \"{}\". Give one short, natural \
correction focusing on this mistake.",
                avoid, workout.title, issue
            ),
            _ => format!(
                "{}Give a brief, natural form correction for {}. One conversational sentence \
only.",
                avoid, workout.title
            ),
        },
        FeedbackCategory::HalfwayEncouragement => format!(
            "{}The user is halfway through {}. Give one natural sentence of encouragement.",
            avoid, workout.title
        ),
        FeedbackCategory::MilestoneCelebration => format!(
            "{}The user hit {} reps for {}. Give one natural sentence of celebration.",
            avoid, rep_count, workout.title
        ),
        FeedbackCategory::WorkoutComplete => format!(
            "{}The user completed all {} reps of {}! Give one enthusiastic congratulatory \
sentence.",
            avoid, workout.target_reps, workout.title
        ),
        FeedbackCategory::PositiveReinforcement => format!(
            "{}The user is doing great with {}. Give one natural sentence of positive \
reinforcement.",
            avoid, workout.title
        ),
        FeedbackCategory::TimeEncouragement => format!(
            "{}The user has been working out for a while now. Give one sentence of time-based \
encouragement.",
            avoid
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout;

    fn squats() -> &'static Workout {
        workout::find(3).unwrap()
    }

    #[test]
    fn test_avoid_repetition_prefix() {
        let recent = vec!["Nice rep!".to_string(), "Keep going!".to_string()];
        let prompt = feedbacks(FeedbackCategory::HalfwayEncouragement, &recent);
        assert!(prompt.starts_with("Avoid repeating: \"Nice rep!; Keep going!\". "));
    }

    #[test]
    fn test_no_prefix_without_history() {
        let prompt = feedbacks(FeedbackCategory::HalfwayEncouragement, &[]);
        assert!(prompt.starts_with("The user is halfway"));
    }

    #[test]
    fn test_critical_form_has_no_avoid_prefix() {
        let recent = vec!["Nice rep!".to_string()];
        let prompt = feedbacks(FeedbackCategory::CriticalForm, &recent);
        assert!(prompt.starts_with("URGENT:"));
        assert!(prompt.contains("Squats"));
    }

    #[test]
    fn test_form_correction_embeds_raw_message() {
        let prompt = feedback_prompt(
            FeedbackCategory::FormCorrection,
            squats(),
            5,
            Some("Go deeper into your squat!"),
            &[],
        );
        assert!(prompt.contains("\"Go deeper into your squat!\""));
    }

    #[test]
    fn test_completion_mentions_target() {
        let prompt = feedbacks(FeedbackCategory::WorkoutComplete, &[]);
        assert!(prompt.contains("all 15 reps"));
    }

    #[test]
    fn test_milestone_mentions_rep_count() {
        let prompt = feedback_prompt(FeedbackCategory::MilestoneCelebration, squats(), 7, None, &[]);
        assert!(prompt.contains("hit 7 reps"));
    }

    #[test]
    fn test_voice_query_prompt_includes_context() {
        let prompt = voice_query_system_prompt(Some(squats()), 8);
        assert!(prompt.contains("Current workout: Squats"));
        assert!(prompt.contains("Current reps: 8/15"));
        assert!(prompt.contains("Keep your back straight"));
    }

    #[test]
    fn test_voice_query_prompt_without_workout() {
        let prompt = voice_query_system_prompt(None, 0);
        assert!(prompt.contains("Coach Mike"));
        assert!(!prompt.contains("Current workout"));
    }

    fn feedbacks(category: FeedbackCategory, recent: &[String]) -> String {
        feedback_prompt(category, squats(), 7, None, recent)
    }
}
