//! Training session orchestration
//!
//! One `TrainingSession` exclusively owns the per-session mutable state:
//! the smoothed accuracy accumulator, the counters and one-shot flags, the
//! feedback history, and the arbitrator. Ticks are processed strictly in
//! arrival order; nothing here is shared between sessions, so no locking is
//! needed.

use chrono::{DateTime, Utc};

use crate::database::summary::WorkoutSummary;
use crate::feedback::{
    Arbitrator, FeedbackCategory, FeedbackDecision, FeedbackEvent, FeedbackHistory,
    FeedbackPolicy, SessionCounters, TickInput,
};
use crate::live::LivePayload;
use crate::prompts;
use crate::reference::ReferenceSequence;
use crate::scorer::{AccuracyState, PoseScorer};
use crate::speech::SpeechState;
use crate::workout::Workout;

/// Result of processing one live tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// Smoothed accuracy after this tick, 0–100.
    pub accuracy: u8,
    /// At most one feedback decision per tick.
    pub decision: Option<FeedbackDecision>,
}

/// A single user's training run for one workout.
pub struct TrainingSession {
    workout: Workout,
    reference: ReferenceSequence,
    scorer: PoseScorer,
    accuracy: AccuracyState,
    counters: SessionCounters,
    history: FeedbackHistory,
    arbitrator: Arbitrator,
    last_accuracy: u8,
    max_accuracy: u8,
    started_at: Option<DateTime<Utc>>,
}

impl TrainingSession {
    pub fn new(workout: Workout, reference: ReferenceSequence) -> Self {
        Self::with_settings(
            workout,
            reference,
            PoseScorer::default(),
            FeedbackPolicy::default(),
        )
    }

    pub fn with_settings(
        workout: Workout,
        reference: ReferenceSequence,
        scorer: PoseScorer,
        policy: FeedbackPolicy,
    ) -> Self {
        Self {
            workout,
            reference,
            scorer,
            accuracy: AccuracyState::new(),
            counters: SessionCounters::for_target(workout.target_reps),
            history: FeedbackHistory::new(),
            arbitrator: Arbitrator::new(policy),
            last_accuracy: 0,
            max_accuracy: 0,
            started_at: None,
        }
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn history(&self) -> &FeedbackHistory {
        &self.history
    }

    pub fn rep_count(&self) -> u32 {
        self.counters.rep_count
    }

    /// Smoothed accuracy from the latest tick.
    pub fn accuracy(&self) -> u8 {
        self.last_accuracy
    }

    pub fn max_accuracy(&self) -> u8 {
        self.max_accuracy
    }

    /// Marks the session as started; elapsed time counts from here.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
            tracing::info!("Training session started: {}", self.workout.title);
        }
    }

    fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        self.started_at
            .map(|t| (now - t).num_seconds().max(0) as u32)
            .unwrap_or(0)
    }

    /// Processes one live tick: scores the sample, advances the counters and
    /// asks the arbitrator for at most one feedback decision.
    pub fn tick(
        &mut self,
        payload: &LivePayload,
        speech_state: SpeechState,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        let accuracy = self
            .scorer
            .score(&payload.landmarks, self.reference.frames(), &mut self.accuracy);
        self.last_accuracy = accuracy;
        self.max_accuracy = self.max_accuracy.max(accuracy);

        self.counters.rep_count = payload.reps;
        self.counters.elapsed_secs = self.elapsed_secs(now);

        let tick = TickInput {
            rep_count: payload.reps,
            accuracy,
            form_message: payload.message.clone(),
            elapsed_secs: self.counters.elapsed_secs,
        };

        let decision =
            self.arbitrator
                .evaluate(&tick, &mut self.counters, &self.history, speech_state, now);

        TickOutcome { accuracy, decision }
    }

    /// Builds the generation prompt for an arbitrator decision.
    pub fn feedback_prompt(&self, decision: &FeedbackDecision) -> String {
        prompts::feedback_prompt(
            decision.category,
            &self.workout,
            self.counters.rep_count,
            decision.form_message.as_deref(),
            &decision.recent_messages,
        )
    }

    /// Records a spoken feedback message in the history once the generation
    /// service has produced it.
    pub fn record_feedback(
        &mut self,
        category: FeedbackCategory,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.history.push(FeedbackEvent {
            category,
            message: message.into(),
            created_at: now,
        });
    }

    /// Restores the session to its pre-start state; the reference motion and
    /// rep target are kept.
    pub fn reset(&mut self) {
        self.accuracy.reset();
        self.counters.reset();
        self.history.clear();
        self.arbitrator.reset();
        self.last_accuracy = 0;
        self.max_accuracy = 0;
        self.started_at = None;
        tracing::info!("Training session reset: {}", self.workout.title);
    }

    /// Builds the final summary handed to persistence at workout end.
    pub fn summary(&self, ended_at: DateTime<Utc>) -> WorkoutSummary {
        WorkoutSummary::new(
            &self.workout,
            self.counters.rep_count,
            self.last_accuracy,
            self.max_accuracy,
            self.elapsed_secs(ended_at),
            self.started_at,
            ended_at,
        )
    }
}
