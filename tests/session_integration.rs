//! Training session integration tests.
//!
//! Drives the full tick path (scorer → arbitrator → history) over simulated
//! sessions with deterministic clocks, covering the completion, cooldown,
//! rate-limit and priority behaviours end to end.

use chrono::{DateTime, Duration, Utc};

use formcoach::feedback::FeedbackCategory;
use formcoach::landmarks::{Frame, LandmarkPoint};
use formcoach::live::LivePayload;
use formcoach::reference::ReferenceSequence;
use formcoach::session::TrainingSession;
use formcoach::speech::SpeechState;
use formcoach::workout;

fn frame_at(x: f64) -> Frame {
    Frame::new(vec![
        LandmarkPoint::new(11, x, 0.0, 0.0),
        LandmarkPoint::new(12, x, 0.1, 0.0),
        LandmarkPoint::new(23, x, 0.5, 0.0),
        LandmarkPoint::new(24, x, 0.6, 0.0),
        LandmarkPoint::new(25, x, 0.8, 0.0),
        LandmarkPoint::new(26, x, 0.9, 0.0),
    ])
}

/// A payload whose pose matches the reference exactly (accuracy 100).
fn perfect_payload(reps: u32) -> LivePayload {
    LivePayload {
        landmarks: frame_at(0.3).landmarks,
        reps,
        message: None,
    }
}

/// A payload with no usable landmarks (accuracy 0).
fn blind_payload(reps: u32) -> LivePayload {
    LivePayload {
        landmarks: Vec::new(),
        reps,
        message: None,
    }
}

fn squats_session() -> TrainingSession {
    let squats = *workout::find(3).expect("squats exist");
    TrainingSession::new(squats, ReferenceSequence::new(vec![frame_at(0.3)]))
}

/// Runs one tick and, if a decision falls out, commits a placeholder
/// message to history the way the app does once generation returns.
fn tick_and_commit(
    session: &mut TrainingSession,
    payload: &LivePayload,
    now: DateTime<Utc>,
    emitted: &mut Vec<(FeedbackCategory, DateTime<Utc>)>,
) {
    let outcome = session.tick(payload, SpeechState::Idle, now);
    if let Some(decision) = outcome.decision {
        session.record_feedback(
            decision.category,
            format!("({})", decision.category.as_str()),
            now,
        );
        emitted.push((decision.category, now));
    }
}

// =============================================================================
// Scoring scenarios
// =============================================================================

#[test]
fn empty_reference_scores_zero_for_live_landmarks() {
    let squats = *workout::find(3).unwrap();
    let mut session = TrainingSession::new(squats, ReferenceSequence::empty());
    let now = Utc::now();
    session.start(now);

    for i in 0..5 {
        let outcome = session.tick(
            &perfect_payload(i),
            SpeechState::Idle,
            now + Duration::seconds(i64::from(i)),
        );
        assert_eq!(outcome.accuracy, 0);
    }
    assert_eq!(session.max_accuracy(), 0);
}

#[test]
fn repeated_identical_ticks_are_deterministic() {
    let mut a = squats_session();
    let mut b = squats_session();
    let now = Utc::now();
    a.start(now);
    b.start(now);

    for i in 0..10 {
        let at = now + Duration::seconds(i);
        let left = a.tick(&perfect_payload(1), SpeechState::Idle, at);
        let right = b.tick(&perfect_payload(1), SpeechState::Idle, at);
        assert_eq!(left.accuracy, right.accuracy);
    }
}

// =============================================================================
// Completion (Scenario: crossing the rep target)
// =============================================================================

#[test]
fn completion_fires_once_on_the_crossing_tick() {
    let mut session = squats_session();
    let mut emitted = Vec::new();
    let mut now = Utc::now();
    session.start(now);

    // Reach the target and stay there for a while
    for rep in 1..=15 {
        tick_and_commit(&mut session, &perfect_payload(rep), now, &mut emitted);
        now += Duration::seconds(1);
    }
    for _ in 0..10 {
        tick_and_commit(&mut session, &perfect_payload(15), now, &mut emitted);
        now += Duration::seconds(1);
    }

    let completions: Vec<_> = emitted
        .iter()
        .filter(|(c, _)| *c == FeedbackCategory::WorkoutComplete)
        .collect();
    assert_eq!(completions.len(), 1, "exactly one completion per session");
}

// =============================================================================
// Positive reinforcement (sustained high accuracy)
// =============================================================================

#[test]
fn sustained_high_accuracy_is_rate_limited_to_one_per_90s() {
    let mut session = squats_session();
    let mut emitted = Vec::new();
    let start = Utc::now();
    session.start(start);

    // Accuracy 100 sustained, rep count above the minimum, 5 ticks over 100 s
    for i in 0..5 {
        let now = start + Duration::seconds(i * 20);
        tick_and_commit(&mut session, &perfect_payload(5), now, &mut emitted);
    }

    let reinforcements: Vec<_> = emitted
        .iter()
        .filter(|(c, _)| *c == FeedbackCategory::PositiveReinforcement)
        .map(|(_, t)| *t)
        .collect();

    assert!(!reinforcements.is_empty());
    for pair in reinforcements.windows(2) {
        assert!(
            pair[1] - pair[0] >= Duration::seconds(90),
            "two reinforcements within a 90 s window"
        );
    }
}

// =============================================================================
// Critical form priority
// =============================================================================

#[test]
fn critical_deviation_takes_priority_over_form_correction() {
    let mut session = squats_session();
    let now = Utc::now();
    session.start(now);

    // Low accuracy (no landmarks) AND a critical deviation on the same tick
    let payload = LivePayload {
        landmarks: Vec::new(),
        reps: 5,
        message: Some("Straighten your back! (Deviation: 45\u{b0})".to_string()),
    };

    let outcome = session.tick(&payload, SpeechState::Idle, now);
    assert_eq!(
        outcome.decision.map(|d| d.category),
        Some(FeedbackCategory::CriticalForm)
    );
}

#[test]
fn mild_deviation_falls_through_to_form_correction() {
    let mut session = squats_session();
    let now = Utc::now();
    session.start(now);

    let payload = LivePayload {
        landmarks: Vec::new(),
        reps: 5,
        message: Some("Straighten your back! (Deviation: 12\u{b0})".to_string()),
    };

    let outcome = session.tick(&payload, SpeechState::Idle, now);
    assert_eq!(
        outcome.decision.map(|d| d.category),
        Some(FeedbackCategory::FormCorrection)
    );
}

// =============================================================================
// Cooldown and rate-limit invariants
// =============================================================================

#[test]
fn form_corrections_never_exceed_one_per_minute() {
    let mut session = squats_session();
    let mut emitted = Vec::new();
    let start = Utc::now();
    session.start(start);

    // Five minutes of consistently poor form at 1 Hz
    for i in 0..300 {
        let now = start + Duration::seconds(i);
        tick_and_commit(&mut session, &blind_payload(5), now, &mut emitted);
    }

    let corrections: Vec<_> = emitted
        .iter()
        .filter(|(c, _)| *c == FeedbackCategory::FormCorrection)
        .map(|(_, t)| *t)
        .collect();

    assert!(corrections.len() >= 2, "corrections should recur");
    for pair in corrections.windows(2) {
        assert!(
            pair[1] - pair[0] >= Duration::seconds(60),
            "two corrections within the 60 s window"
        );
    }
}

#[test]
fn global_cooldown_separates_consecutive_emissions() {
    let mut session = squats_session();
    let mut emitted = Vec::new();
    let start = Utc::now();
    session.start(start);

    // A noisy session: poor form early, perfect form late, target reached
    for i in 0..240 {
        let now = start + Duration::seconds(i);
        let rep = (i as u32 / 12).min(15);
        let payload = if i % 3 == 0 {
            blind_payload(rep)
        } else {
            perfect_payload(rep)
        };
        tick_and_commit(&mut session, &payload, now, &mut emitted);
    }

    // Except for the completion override, consecutive emissions respect the
    // 15 s global cooldown
    for pair in emitted.windows(2) {
        let (_, first_at) = pair[0];
        let (second, second_at) = pair[1];
        if second == FeedbackCategory::WorkoutComplete {
            continue;
        }
        // An emission directly after a completion is also legal: completion
        // clears the cooldown
        if pair[0].0 == FeedbackCategory::WorkoutComplete {
            continue;
        }
        assert!(
            second_at - first_at >= Duration::seconds(15),
            "{:?} followed {:?} after only {:?}",
            second,
            pair[0].0,
            second_at - first_at
        );
    }
}

// =============================================================================
// One-shot invariants
// =============================================================================

#[test]
fn session_one_shots_fire_at_most_once() {
    let mut session = squats_session();
    let mut emitted = Vec::new();
    let start = Utc::now();
    session.start(start);

    // A long full session: 6 minutes at 1 Hz, reps climbing past the target
    for i in 0..360 {
        let now = start + Duration::seconds(i);
        let rep = (i as u32 / 20).min(17);
        tick_and_commit(&mut session, &perfect_payload(rep), now, &mut emitted);
    }

    for category in [
        FeedbackCategory::HalfwayEncouragement,
        FeedbackCategory::WorkoutComplete,
        FeedbackCategory::TimeEncouragement,
    ] {
        let count = emitted.iter().filter(|(c, _)| *c == category).count();
        assert!(count <= 1, "{:?} fired {} times", category, count);
    }
}

// =============================================================================
// Speech gate
// =============================================================================

#[test]
fn no_decisions_while_the_pipeline_is_busy() {
    let mut session = squats_session();
    let mut now = Utc::now();
    session.start(now);

    // Use up the halfway one-shot so completion is the next decision due
    let outcome = session.tick(&perfect_payload(7), SpeechState::Idle, now);
    assert_eq!(
        outcome.decision.map(|d| d.category),
        Some(FeedbackCategory::HalfwayEncouragement)
    );
    now += Duration::seconds(1);

    for state in [
        SpeechState::Recording,
        SpeechState::Transcribing,
        SpeechState::AiResponding,
        SpeechState::Speaking,
    ] {
        // Completion would fire on this tick if the pipeline were idle
        let outcome = session.tick(&perfect_payload(15), state, now);
        assert!(outcome.decision.is_none(), "decision under {:?}", state);
        now += Duration::seconds(1);
    }

    // First idle tick delivers the pending completion
    let outcome = session.tick(&perfect_payload(15), SpeechState::Idle, now);
    assert_eq!(
        outcome.decision.map(|d| d.category),
        Some(FeedbackCategory::WorkoutComplete)
    );
}
