//! Formcoach - real-time exercise coaching core
//!
//! Compares a live stream of body-joint landmarks against a pre-recorded
//! reference motion, decides tick by tick whether to surface coaching
//! feedback, and serialises spoken feedback and voice queries through a
//! single-slot speech pipeline.
//!
//! The main pieces:
//! - [`scorer`]: nearest-frame pose similarity with per-session smoothing
//! - [`feedback`]: the priority rule table and arbitrator
//! - [`speech`]: the recording → transcription → generation → playback
//!   state machine and coordinator
//! - [`session`]: per-session state ownership and the tick entry point
//! - [`services`], [`reference`], [`live`]: HTTP clients for the external
//!   collaborators
//! - [`database`]: session summary persistence

pub mod config;
pub mod database;
pub mod feedback;
pub mod landmarks;
pub mod live;
pub mod logging;
pub mod prompts;
pub mod reference;
pub mod scorer;
pub mod services;
pub mod session;
pub mod speech;
pub mod workout;

pub use feedback::{FeedbackCategory, FeedbackDecision, FeedbackEvent};
pub use landmarks::{Frame, LandmarkPoint};
pub use live::LivePayload;
pub use reference::ReferenceSequence;
pub use scorer::{AccuracyState, PoseScorer};
pub use session::{TickOutcome, TrainingSession};
pub use speech::{SpeechCoordinator, SpeechState};
pub use workout::Workout;
