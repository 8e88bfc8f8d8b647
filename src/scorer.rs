//! Pose similarity scoring
//!
//! Compares one live landmark sample against a pre-recorded reference motion
//! and produces a smoothed 0–100 accuracy value. Matching is nearest-frame:
//! the live pose is scored against whichever reference frame it most closely
//! resembles, so the user is never penalised for being at a different point
//! in the movement than the reference recording.

use crate::landmarks::{Frame, LandmarkPoint};

/// Distance-to-score scaling; larger values punish deviation harder.
pub const DEFAULT_TOLERANCE_FACTOR: f64 = 3.5;

/// Weight given to the newest raw value by the exponential smoother.
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.2;

/// Per-session smoothed accuracy accumulator.
///
/// Owned by exactly one training session and passed explicitly into
/// [`PoseScorer::score`]; never shared between sessions or ticks in flight.
#[derive(Debug, Clone, Default)]
pub struct AccuracyState {
    smoothed: Option<f64>,
}

impl AccuracyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The smoothed accuracy, if at least one sample has been scored.
    pub fn smoothed(&self) -> Option<f64> {
        self.smoothed
    }

    /// Clears the accumulator; the next score seeds it afresh.
    pub fn reset(&mut self) {
        self.smoothed = None;
    }
}

/// Nearest-frame matcher with per-session exponential smoothing.
#[derive(Debug, Clone)]
pub struct PoseScorer {
    tolerance_factor: f64,
    smoothing_alpha: f64,
}

impl Default for PoseScorer {
    fn default() -> Self {
        Self {
            tolerance_factor: DEFAULT_TOLERANCE_FACTOR,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

impl PoseScorer {
    pub fn new(tolerance_factor: f64, smoothing_alpha: f64) -> Self {
        Self {
            tolerance_factor,
            smoothing_alpha,
        }
    }

    /// Scores one live sample against the reference sequence.
    ///
    /// Returns a smoothed accuracy in `0..=100`. An empty live sample or an
    /// empty reference sequence scores 0 without touching `state`, as does a
    /// sequence in which no important joint could be matched at all.
    pub fn score(
        &self,
        live: &[LandmarkPoint],
        reference: &[Frame],
        state: &mut AccuracyState,
    ) -> u8 {
        if live.is_empty() || reference.is_empty() {
            return 0;
        }

        let best = match self.best_frame(live, reference) {
            Some(frame) => frame,
            None => return 0,
        };

        let raw = self.raw_accuracy(live, best);

        let smoothed = match state.smoothed {
            Some(prev) => prev * (1.0 - self.smoothing_alpha) + raw * self.smoothing_alpha,
            None => raw,
        };
        state.smoothed = Some(smoothed);

        smoothed.round() as u8
    }

    /// Finds the reference frame with the minimum mean joint distance.
    ///
    /// Joints missing on either side are skipped for that term only; frames
    /// with no matched joints are skipped entirely. Ties resolve to the
    /// earliest frame since only a strictly smaller mean replaces the best.
    fn best_frame<'a>(&self, live: &[LandmarkPoint], reference: &'a [Frame]) -> Option<&'a Frame> {
        let mut best: Option<(&Frame, f64)> = None;

        for frame in reference {
            let mut total = 0.0;
            let mut matched = 0u32;

            for pt in live.iter().filter(|pt| pt.is_important()) {
                if let Some(ref_pt) = frame.landmark(pt.id) {
                    total += pt.distance(ref_pt);
                    matched += 1;
                }
            }

            if matched == 0 {
                continue;
            }

            let mean = total / f64::from(matched);
            match best {
                Some((_, best_mean)) if mean >= best_mean => {}
                _ => best = Some((frame, mean)),
            }
        }

        best.map(|(frame, _)| frame)
    }

    /// Mean per-joint score against the selected frame, scaled to 0–100.
    fn raw_accuracy(&self, live: &[LandmarkPoint], frame: &Frame) -> f64 {
        let mut total = 0.0;
        let mut matched = 0u32;

        for pt in live.iter().filter(|pt| pt.is_important()) {
            if let Some(ref_pt) = frame.landmark(pt.id) {
                let joint_score = (1.0 - pt.distance(ref_pt) * self.tolerance_factor).max(0.0);
                total += joint_score;
                matched += 1;
            }
        }

        if matched == 0 {
            0.0
        } else {
            total / f64::from(matched) * 100.0
        }
    }
}
