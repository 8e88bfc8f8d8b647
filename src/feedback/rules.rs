//! Ordered feedback rule table
//!
//! Each category's trigger, rate-limit window, one-shot discipline and
//! cooldown behaviour lives here as data. The arbitrator walks the table in
//! order; the first rule whose gating passes wins, so the table order IS the
//! priority order.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::arbitrator::TickInput;
use super::{FeedbackCategory, SessionCounters};

/// Tunable thresholds shared by the rule predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackPolicy {
    /// Minimum gap between any two emissions (completion excepted).
    pub cooldown_secs: u32,
    /// Accuracy below this invites a form correction.
    pub low_accuracy: u8,
    /// Accuracy at or above this invites positive reinforcement.
    pub high_accuracy: u8,
    /// Back-posture deviation (degrees) beyond which form becomes critical.
    pub critical_deviation_deg: f64,
    /// Corrections are withheld until this many reps are done.
    pub min_reps_for_correction: u32,
    /// Reinforcement is withheld until this many reps are done.
    pub min_reps_for_reinforcement: u32,
    /// Reinforcement additionally requires this much quiet time.
    pub reinforcement_min_gap_secs: u32,
    /// Elapsed-time checkpoint for the one-shot time encouragement.
    pub time_checkpoint_secs: u32,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self {
            cooldown_secs: 15,
            low_accuracy: 50,
            high_accuracy: 90,
            critical_deviation_deg: 30.0,
            min_reps_for_correction: 2,
            min_reps_for_reinforcement: 4,
            reinforcement_min_gap_secs: 45,
            time_checkpoint_secs: 90,
        }
    }
}

/// One-shot discipline for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    /// May fire repeatedly, subject to its window.
    No,
    /// At most once per session.
    PerSession,
    /// At most once per milestone rep value.
    PerMilestone,
}

/// Everything a trigger predicate may consult for one tick.
pub struct TickContext<'a> {
    pub tick: &'a TickInput,
    pub counters: &'a SessionCounters,
    pub policy: &'a FeedbackPolicy,
    /// The raw form message changed to a new non-empty value this tick.
    pub form_message_changed: bool,
    /// Rep count observed on the previous evaluated tick.
    pub prev_rep_count: u32,
    /// Seconds since the last emission; `None` if nothing has been emitted
    /// (or completion cleared the timestamp).
    pub secs_since_last_emission: Option<f64>,
}

/// A single row of the priority table.
pub struct Rule {
    pub category: FeedbackCategory,
    /// Per-category rate-limit window in seconds, checked against history.
    pub window_secs: Option<i64>,
    /// Completion ignores the global cooldown and clears it on emission.
    pub bypasses_cooldown: bool,
    pub one_shot: OneShot,
    pub trigger: fn(&TickContext) -> bool,
}

/// The rule table, in strict priority order.
pub fn table() -> &'static [Rule] {
    static TABLE: OnceLock<Vec<Rule>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            Rule {
                category: FeedbackCategory::CriticalForm,
                window_secs: Some(15),
                bypasses_cooldown: false,
                one_shot: OneShot::No,
                trigger: critical_form,
            },
            Rule {
                category: FeedbackCategory::FormCorrection,
                window_secs: Some(60),
                bypasses_cooldown: false,
                one_shot: OneShot::No,
                trigger: form_correction,
            },
            Rule {
                category: FeedbackCategory::HalfwayEncouragement,
                window_secs: None,
                bypasses_cooldown: false,
                one_shot: OneShot::PerSession,
                trigger: halfway,
            },
            Rule {
                category: FeedbackCategory::MilestoneCelebration,
                window_secs: Some(45),
                bypasses_cooldown: false,
                one_shot: OneShot::PerMilestone,
                trigger: milestone,
            },
            Rule {
                category: FeedbackCategory::WorkoutComplete,
                window_secs: None,
                bypasses_cooldown: true,
                one_shot: OneShot::PerSession,
                trigger: complete,
            },
            Rule {
                category: FeedbackCategory::PositiveReinforcement,
                window_secs: Some(90),
                bypasses_cooldown: false,
                one_shot: OneShot::No,
                trigger: reinforcement,
            },
            Rule {
                category: FeedbackCategory::TimeEncouragement,
                window_secs: None,
                bypasses_cooldown: false,
                one_shot: OneShot::PerSession,
                trigger: time_checkpoint,
            },
        ]
    })
}

/// Parses a back-posture deviation in degrees out of a raw form message,
/// e.g. `"Straighten your back! (Deviation: 45.5°)"`.
pub fn parse_deviation(message: &str) -> Option<f64> {
    static DEVIATION_RE: OnceLock<Regex> = OnceLock::new();
    let re = DEVIATION_RE.get_or_init(|| {
        Regex::new(r"(?i)deviation:\s*(\d+(?:\.\d+)?)").expect("deviation regex is valid")
    });

    re.captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn critical_form(ctx: &TickContext) -> bool {
    ctx.tick
        .form_message
        .as_deref()
        .and_then(parse_deviation)
        .is_some_and(|deviation| deviation > ctx.policy.critical_deviation_deg)
}

fn form_correction(ctx: &TickContext) -> bool {
    let accuracy_low = ctx.tick.accuracy < ctx.policy.low_accuracy;
    (accuracy_low || ctx.form_message_changed)
        && ctx.tick.rep_count > ctx.policy.min_reps_for_correction
}

fn halfway(ctx: &TickContext) -> bool {
    let target = ctx.counters.target_reps;
    target > 0 && ctx.tick.rep_count >= target / 2
}

/// Milestone rep values for a target: floor(50 %) and floor(75 %).
pub fn milestone_values(target: u32) -> [u32; 2] {
    [target / 2, target * 3 / 4]
}

fn milestone(ctx: &TickContext) -> bool {
    let target = ctx.counters.target_reps;
    ctx.tick.rep_count > 0
        && target > 0
        && milestone_values(target).contains(&ctx.tick.rep_count)
}

fn complete(ctx: &TickContext) -> bool {
    let target = ctx.counters.target_reps;
    target > 0 && ctx.tick.rep_count >= target && ctx.prev_rep_count < target
}

fn reinforcement(ctx: &TickContext) -> bool {
    ctx.tick.accuracy >= ctx.policy.high_accuracy
        && ctx.tick.rep_count > ctx.policy.min_reps_for_reinforcement
        && ctx
            .secs_since_last_emission
            .map_or(true, |secs| secs > f64::from(ctx.policy.reinforcement_min_gap_secs))
}

fn time_checkpoint(ctx: &TickContext) -> bool {
    ctx.tick.elapsed_secs == ctx.policy.time_checkpoint_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(
        tick: &'a TickInput,
        counters: &'a SessionCounters,
        policy: &'a FeedbackPolicy,
    ) -> TickContext<'a> {
        TickContext {
            tick,
            counters,
            policy,
            form_message_changed: false,
            prev_rep_count: tick.rep_count.saturating_sub(1),
            secs_since_last_emission: None,
        }
    }

    fn tick(rep_count: u32, accuracy: u8) -> TickInput {
        TickInput {
            rep_count,
            accuracy,
            form_message: None,
            elapsed_secs: 30,
        }
    }

    #[test]
    fn test_table_is_in_priority_order() {
        let categories: Vec<_> = table().iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                FeedbackCategory::CriticalForm,
                FeedbackCategory::FormCorrection,
                FeedbackCategory::HalfwayEncouragement,
                FeedbackCategory::MilestoneCelebration,
                FeedbackCategory::WorkoutComplete,
                FeedbackCategory::PositiveReinforcement,
                FeedbackCategory::TimeEncouragement,
            ]
        );
    }

    #[test]
    fn test_only_completion_bypasses_cooldown() {
        for rule in table() {
            assert_eq!(
                rule.bypasses_cooldown,
                rule.category == FeedbackCategory::WorkoutComplete
            );
        }
    }

    #[test]
    fn test_parse_deviation_variants() {
        assert_eq!(parse_deviation("Deviation: 45°"), Some(45.0));
        assert_eq!(
            parse_deviation("Straighten your back! (Deviation: 131.0°)"),
            Some(131.0)
        );
        assert_eq!(parse_deviation("deviation: 12.5"), Some(12.5));
        assert_eq!(parse_deviation("Go deeper into your squat!"), None);
        assert_eq!(parse_deviation(""), None);
    }

    #[test]
    fn test_critical_form_threshold() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);

        let mut t = tick(5, 80);
        t.form_message = Some("Deviation: 45°".to_string());
        assert!(critical_form(&context(&t, &counters, &policy)));

        t.form_message = Some("Deviation: 30°".to_string());
        assert!(!critical_form(&context(&t, &counters, &policy)), "30 is not > 30");

        t.form_message = Some("no angle here".to_string());
        assert!(!critical_form(&context(&t, &counters, &policy)));
    }

    #[test]
    fn test_form_correction_requires_minimum_reps() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);

        let low = tick(2, 30);
        assert!(!form_correction(&context(&low, &counters, &policy)));

        let low_enough_reps = tick(3, 30);
        assert!(form_correction(&context(&low_enough_reps, &counters, &policy)));

        let accurate = tick(3, 80);
        assert!(!form_correction(&context(&accurate, &counters, &policy)));
    }

    #[test]
    fn test_form_correction_fires_on_changed_message() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);
        let t = tick(3, 80);

        let mut ctx = context(&t, &counters, &policy);
        ctx.form_message_changed = true;
        assert!(form_correction(&ctx));
    }

    #[test]
    fn test_halfway_threshold() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(15);

        assert!(!halfway(&context(&tick(6, 80), &counters, &policy)));
        assert!(halfway(&context(&tick(7, 80), &counters, &policy)));
        assert!(halfway(&context(&tick(8, 80), &counters, &policy)));
    }

    #[test]
    fn test_milestone_values() {
        assert_eq!(milestone_values(12), [6, 9]);
        assert_eq!(milestone_values(15), [7, 11]);
    }

    #[test]
    fn test_milestone_trigger() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);

        assert!(milestone(&context(&tick(6, 80), &counters, &policy)));
        assert!(milestone(&context(&tick(9, 80), &counters, &policy)));
        assert!(!milestone(&context(&tick(7, 80), &counters, &policy)));
        assert!(!milestone(&context(&tick(0, 80), &counters, &policy)));
    }

    #[test]
    fn test_complete_requires_crossing_the_target() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);

        let t = tick(12, 80);
        let mut ctx = context(&t, &counters, &policy);
        ctx.prev_rep_count = 11;
        assert!(complete(&ctx));

        ctx.prev_rep_count = 12;
        assert!(!complete(&ctx), "already past the target last tick");
    }

    #[test]
    fn test_reinforcement_requires_quiet_time() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);
        let t = tick(5, 95);

        let mut ctx = context(&t, &counters, &policy);
        ctx.secs_since_last_emission = None;
        assert!(reinforcement(&ctx), "never emitted counts as quiet");

        ctx.secs_since_last_emission = Some(50.0);
        assert!(reinforcement(&ctx));

        ctx.secs_since_last_emission = Some(20.0);
        assert!(!reinforcement(&ctx));
    }

    #[test]
    fn test_reinforcement_requires_minimum_reps() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);

        assert!(!reinforcement(&context(&tick(4, 95), &counters, &policy)));
        assert!(reinforcement(&context(&tick(5, 95), &counters, &policy)));
    }

    #[test]
    fn test_time_checkpoint_is_exact() {
        let policy = FeedbackPolicy::default();
        let counters = SessionCounters::for_target(12);

        let mut t = tick(1, 80);
        t.elapsed_secs = 90;
        assert!(time_checkpoint(&context(&t, &counters, &policy)));

        t.elapsed_secs = 91;
        assert!(!time_checkpoint(&context(&t, &counters, &policy)));
    }
}
