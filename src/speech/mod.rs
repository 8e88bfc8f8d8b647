//! Voice interaction subsystem
//!
//! A single-slot pipeline serialising voice capture, transcription,
//! generation and synthesis/playback. The state machine lives in [`state`];
//! [`coordinator`] drives it against the external services.

pub mod coordinator;
pub mod state;

pub use coordinator::{
    AudioIo, SpeechControls, SpeechCoordinator, VoiceExchange, FALLBACK_MESSAGE,
    MAX_RECORDING_SECS,
};
pub use state::{SpeechEvent, SpeechState, SpeechStateMachine, Transition, TransitionReason};
