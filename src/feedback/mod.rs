//! Feedback engine
//!
//! Decides, tick by tick, whether and which coaching feedback to surface.
//! Policy lives in an ordered rule table ([`rules`]); the arbitrator walks it
//! in priority order and emits at most one decision per tick.

pub mod arbitrator;
pub mod rules;

pub use arbitrator::{Arbitrator, FeedbackDecision, TickInput};
pub use rules::FeedbackPolicy;

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum events retained for rate-limit queries.
pub const HISTORY_CAPACITY: usize = 10;

/// Number of recent messages handed to the generation service as
/// avoid-repetition context.
pub const AVOID_REPEAT_CONTEXT: usize = 3;

/// Coaching feedback categories, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    /// Back-posture deviation beyond the safety threshold.
    CriticalForm,
    /// Low accuracy or a newly-reported form issue.
    FormCorrection,
    /// Halfway through the rep target.
    HalfwayEncouragement,
    /// 50 % / 75 % rep milestones.
    MilestoneCelebration,
    /// Rep target reached.
    WorkoutComplete,
    /// Sustained high accuracy.
    PositiveReinforcement,
    /// Fixed elapsed-time checkpoint.
    TimeEncouragement,
}

impl FeedbackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::CriticalForm => "critical_form",
            FeedbackCategory::FormCorrection => "form_correction",
            FeedbackCategory::HalfwayEncouragement => "halfway_encouragement",
            FeedbackCategory::MilestoneCelebration => "milestone_celebration",
            FeedbackCategory::WorkoutComplete => "workout_complete",
            FeedbackCategory::PositiveReinforcement => "positive_reinforcement",
            FeedbackCategory::TimeEncouragement => "time_encouragement",
        }
    }
}

/// A surfaced coaching event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub category: FeedbackCategory,
    /// The generated coaching sentence.
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Bounded record of recent feedback, newest last.
///
/// Owned by one training session; queried for per-category rate limiting and
/// for avoid-repetition context.
#[derive(Debug, Clone, Default)]
pub struct FeedbackHistory {
    events: VecDeque<FeedbackEvent>,
}

impl FeedbackHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event, evicting the oldest beyond capacity.
    pub fn push(&mut self, event: FeedbackEvent) {
        if self.events.len() == HISTORY_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &FeedbackEvent> {
        self.events.iter()
    }

    /// Counts events of `category` emitted within `window` before `now`.
    pub fn count_within(
        &self,
        category: FeedbackCategory,
        window: Duration,
        now: DateTime<Utc>,
    ) -> usize {
        self.events
            .iter()
            .filter(|e| e.category == category && now - e.created_at < window)
            .count()
    }

    /// The most recent message strings, oldest first.
    pub fn recent_messages(&self) -> Vec<String> {
        let skip = self.events.len().saturating_sub(AVOID_REPEAT_CONTEXT);
        self.events
            .iter()
            .skip(skip)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Mutable per-session counters and one-shot flags.
///
/// Mutated by each tick; reset at workout reset.
#[derive(Debug, Clone, Default)]
pub struct SessionCounters {
    pub rep_count: u32,
    pub elapsed_secs: u32,
    pub target_reps: u32,
    /// One-shot per session.
    pub halfway_given: bool,
    /// One-shot per session.
    pub completion_given: bool,
    /// One-shot per session.
    pub time_encouragement_given: bool,
    /// Rep values at which a milestone celebration already fired.
    pub fired_milestones: HashSet<u32>,
}

impl SessionCounters {
    pub fn for_target(target_reps: u32) -> Self {
        Self {
            target_reps,
            ..Self::default()
        }
    }

    /// Whether the session-scoped one-shot for `category` has fired.
    /// Categories without a session one-shot always report false.
    pub fn one_shot_fired(&self, category: FeedbackCategory) -> bool {
        match category {
            FeedbackCategory::HalfwayEncouragement => self.halfway_given,
            FeedbackCategory::WorkoutComplete => self.completion_given,
            FeedbackCategory::TimeEncouragement => self.time_encouragement_given,
            _ => false,
        }
    }

    /// Marks the session-scoped one-shot for `category`.
    pub fn mark_one_shot(&mut self, category: FeedbackCategory) {
        match category {
            FeedbackCategory::HalfwayEncouragement => self.halfway_given = true,
            FeedbackCategory::WorkoutComplete => self.completion_given = true,
            FeedbackCategory::TimeEncouragement => self.time_encouragement_given = true,
            _ => {}
        }
    }

    /// Clears everything except the rep target.
    pub fn reset(&mut self) {
        let target = self.target_reps;
        *self = Self::for_target(target);
    }
}
