//! Voice interaction state machine
//!
//! Defines the single-slot states and transitions for the voice pipeline.
//! Exactly one state is active at a time, so "no two audio operations run
//! concurrently" is enforced by the type rather than by convention.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Voice pipeline state — exactly one instance exists per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeechState {
    /// No voice interaction in flight; feedback decisions are permitted.
    #[default]
    Idle,
    /// Capturing microphone audio.
    Recording,
    /// Waiting on the speech-to-text service.
    Transcribing,
    /// Waiting on the language-generation service.
    AiResponding,
    /// Synthesising and playing the reply.
    Speaking,
}

impl SpeechState {
    /// Returns a human-readable description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            SpeechState::Idle => "Ready",
            SpeechState::Recording => "Listening",
            SpeechState::Transcribing => "Converting speech to text",
            SpeechState::AiResponding => "Coach is thinking",
            SpeechState::Speaking => "Coach is speaking",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SpeechState::Idle)
    }

    /// Whether an audio device (microphone or speaker) is held in this state.
    pub fn holds_audio_device(&self) -> bool {
        matches!(self, SpeechState::Recording | SpeechState::Speaking)
    }
}

/// Events that can trigger state transitions.
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    /// User pressed the microphone button. Cancels active playback.
    StartRecording,
    /// User stopped the recording manually.
    StopRecording,
    /// The recording hit its maximum duration.
    RecordingTimeout,
    /// Speech-to-text returned a transcript.
    TranscriptReady { text: String },
    /// A feedback emission requested generation directly (no recording).
    BeginResponse,
    /// The generation service returned a reply.
    ResponseReady { text: String },
    /// Playback ran to the end of the audio.
    PlaybackFinished,
    /// Playback was stopped early; remaining audio is discarded.
    StopPlayback,
    /// Any stage failed; the pipeline falls back to idle.
    StageFailed { message: String },
}

/// Reason for entering a state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    UserInitiated,
    RecordingStopped,
    RecordingTimeout,
    TranscriptionSuccess,
    FeedbackRequested,
    GenerationSuccess,
    PlaybackComplete,
    PlaybackInterrupted,
    Error { message: String },
}

/// Result of a state transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub new_state: SpeechState,
    pub reason: TransitionReason,
    /// Transcript or reply text carried by the triggering event.
    pub text: Option<String>,
}

/// The single-slot voice pipeline state machine.
///
/// Invalid events for the current state are ignored (`None`), not errors:
/// a stray stop press while idle must not disturb the session.
pub struct SpeechStateMachine {
    state: SpeechState,
    state_entered_at: Instant,
}

impl SpeechStateMachine {
    pub fn new() -> Self {
        Self {
            state: SpeechState::Idle,
            state_entered_at: Instant::now(),
        }
    }

    pub fn state(&self) -> SpeechState {
        self.state
    }

    /// How long the machine has been in the current state.
    pub fn time_in_state(&self) -> std::time::Duration {
        self.state_entered_at.elapsed()
    }

    /// Whether an active recording has exceeded `max_secs`.
    pub fn check_recording_timeout(&self, max_secs: u64) -> bool {
        self.state == SpeechState::Recording && self.state_entered_at.elapsed().as_secs() >= max_secs
    }

    /// Processes an event, returning the transition if one occurred.
    pub fn process_event(&mut self, event: SpeechEvent) -> Option<Transition> {
        let transition = match (&self.state, event) {
            (SpeechState::Idle, SpeechEvent::StartRecording) => Some(Transition {
                new_state: SpeechState::Recording,
                reason: TransitionReason::UserInitiated,
                text: None,
            }),
            (SpeechState::Idle, SpeechEvent::BeginResponse) => Some(Transition {
                new_state: SpeechState::AiResponding,
                reason: TransitionReason::FeedbackRequested,
                text: None,
            }),

            // Starting a recording interrupts playback and goes straight to
            // Recording, skipping Idle
            (SpeechState::Speaking, SpeechEvent::StartRecording) => Some(Transition {
                new_state: SpeechState::Recording,
                reason: TransitionReason::PlaybackInterrupted,
                text: None,
            }),

            (SpeechState::Recording, SpeechEvent::StopRecording) => Some(Transition {
                new_state: SpeechState::Transcribing,
                reason: TransitionReason::RecordingStopped,
                text: None,
            }),
            (SpeechState::Recording, SpeechEvent::RecordingTimeout) => Some(Transition {
                new_state: SpeechState::Transcribing,
                reason: TransitionReason::RecordingTimeout,
                text: None,
            }),

            (SpeechState::Transcribing, SpeechEvent::TranscriptReady { text }) => {
                Some(Transition {
                    new_state: SpeechState::AiResponding,
                    reason: TransitionReason::TranscriptionSuccess,
                    text: Some(text),
                })
            }

            (SpeechState::AiResponding, SpeechEvent::ResponseReady { text }) => Some(Transition {
                new_state: SpeechState::Speaking,
                reason: TransitionReason::GenerationSuccess,
                text: Some(text),
            }),

            (SpeechState::Speaking, SpeechEvent::PlaybackFinished) => Some(Transition {
                new_state: SpeechState::Idle,
                reason: TransitionReason::PlaybackComplete,
                text: None,
            }),
            (SpeechState::Speaking, SpeechEvent::StopPlayback) => Some(Transition {
                new_state: SpeechState::Idle,
                reason: TransitionReason::PlaybackInterrupted,
                text: None,
            }),

            // Any failure at any active stage falls back to Idle
            (
                SpeechState::Recording
                | SpeechState::Transcribing
                | SpeechState::AiResponding
                | SpeechState::Speaking,
                SpeechEvent::StageFailed { message },
            ) => Some(Transition {
                new_state: SpeechState::Idle,
                reason: TransitionReason::Error { message },
                text: None,
            }),

            _ => None,
        };

        if let Some(ref result) = transition {
            let previous = self.state;
            self.state = result.new_state;
            self.state_entered_at = Instant::now();
            tracing::info!(
                "Speech state transition: {:?} -> {:?} (reason: {:?})",
                previous,
                result.new_state,
                result.reason
            );
        }

        transition
    }

    /// Forces the machine back to Idle.
    pub fn reset(&mut self) {
        self.state = SpeechState::Idle;
        self.state_entered_at = Instant::now();
        tracing::info!("Speech state machine reset to Idle");
    }
}

impl Default for SpeechStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
