//! Feedback arbitration
//!
//! Consumes one (reps, accuracy, form message, elapsed time) observation per
//! tick and returns at most one feedback decision, gated by the speech
//! pipeline, a global cooldown, per-category rate limits and one-shot flags.
//! The actual sentence is produced by the generation service afterwards; the
//! arbitrator's responsibility ends at picking a category and supplying the
//! avoid-repetition context.

use chrono::{DateTime, Duration, Utc};

use super::rules::{self, FeedbackPolicy, OneShot, TickContext};
use super::{FeedbackCategory, FeedbackHistory, SessionCounters};
use crate::speech::SpeechState;

/// One tick's observation from the live feed and the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct TickInput {
    pub rep_count: u32,
    /// Smoothed accuracy from the scorer, 0–100.
    pub accuracy: u8,
    /// Raw form message from the pose-detection service, if any.
    pub form_message: Option<String>,
    pub elapsed_secs: u32,
}

/// The arbitrator's pick for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackDecision {
    pub category: FeedbackCategory,
    /// Recent history messages (oldest first) the generated sentence should
    /// avoid repeating.
    pub recent_messages: Vec<String>,
    /// The raw form message observed on the deciding tick, for correction
    /// prompts.
    pub form_message: Option<String>,
}

/// Priority state machine over the ordered rule table.
#[derive(Debug)]
pub struct Arbitrator {
    policy: FeedbackPolicy,
    /// Cleared (not stamped) by a completion emission so an immediately
    /// following event is allowed.
    last_emission_at: Option<DateTime<Utc>>,
    last_form_message: Option<String>,
    prev_rep_count: u32,
}

impl Default for Arbitrator {
    fn default() -> Self {
        Self::new(FeedbackPolicy::default())
    }
}

impl Arbitrator {
    pub fn new(policy: FeedbackPolicy) -> Self {
        Self {
            policy,
            last_emission_at: None,
            last_form_message: None,
            prev_rep_count: 0,
        }
    }

    pub fn policy(&self) -> &FeedbackPolicy {
        &self.policy
    }

    /// Evaluates one tick.
    ///
    /// While a voice interaction is mid-flight (`speech_state` not idle) no
    /// decision is made and no tracking state advances, so a completion that
    /// would have fired still fires on the first idle tick.
    pub fn evaluate(
        &mut self,
        tick: &TickInput,
        counters: &mut SessionCounters,
        history: &FeedbackHistory,
        speech_state: SpeechState,
        now: DateTime<Utc>,
    ) -> Option<FeedbackDecision> {
        if !speech_state.is_idle() {
            return None;
        }

        let form_message_changed = match tick.form_message.as_deref() {
            Some(msg) if !msg.is_empty() => self.last_form_message.as_deref() != Some(msg),
            _ => false,
        };

        let secs_since_last_emission = self
            .last_emission_at
            .map(|t| (now - t).num_milliseconds() as f64 / 1000.0);

        let ctx = TickContext {
            tick,
            counters,
            policy: &self.policy,
            form_message_changed,
            prev_rep_count: self.prev_rep_count,
            secs_since_last_emission,
        };

        let mut picked = None;
        for rule in rules::table() {
            if !self.gates_pass(rule, &ctx, history, now) {
                continue;
            }
            if (rule.trigger)(&ctx) {
                picked = Some((rule.category, rule.bypasses_cooldown, rule.one_shot));
                break;
            }
        }

        // Tracking state advances on every evaluated tick, decision or not
        self.last_form_message = tick.form_message.clone().filter(|m| !m.is_empty());
        self.prev_rep_count = tick.rep_count;

        let (category, bypasses_cooldown, one_shot) = picked?;

        match one_shot {
            OneShot::PerSession => counters.mark_one_shot(category),
            OneShot::PerMilestone => {
                counters.fired_milestones.insert(tick.rep_count);
            }
            OneShot::No => {}
        }

        if bypasses_cooldown {
            self.last_emission_at = None;
        } else {
            self.last_emission_at = Some(now);
        }

        tracing::info!(
            "Feedback decision: {} (rep {}, accuracy {})",
            category.as_str(),
            tick.rep_count,
            tick.accuracy
        );

        Some(FeedbackDecision {
            category,
            recent_messages: history.recent_messages(),
            form_message: tick.form_message.clone(),
        })
    }

    /// One-shot, cooldown and rate-limit gating for a rule.
    fn gates_pass(
        &self,
        rule: &rules::Rule,
        ctx: &TickContext,
        history: &FeedbackHistory,
        now: DateTime<Utc>,
    ) -> bool {
        match rule.one_shot {
            OneShot::PerSession if ctx.counters.one_shot_fired(rule.category) => return false,
            OneShot::PerMilestone
                if ctx.counters.fired_milestones.contains(&ctx.tick.rep_count) =>
            {
                return false
            }
            _ => {}
        }

        if !rule.bypasses_cooldown {
            if let Some(secs) = ctx.secs_since_last_emission {
                if secs < f64::from(self.policy.cooldown_secs) {
                    return false;
                }
            }
        }

        if let Some(window) = rule.window_secs {
            if history.count_within(rule.category, Duration::seconds(window), now) > 0 {
                return false;
            }
        }

        true
    }

    /// Restores the arbitrator to its session-start state.
    pub fn reset(&mut self) {
        self.last_emission_at = None;
        self.last_form_message = None;
        self.prev_rep_count = 0;
    }
}
