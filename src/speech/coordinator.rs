//! Speech pipeline coordination
//!
//! Serialises recording → transcription → generation → synthesis → playback
//! through the single-slot state machine. Each external call is awaited one
//! at a time; the training tick loop only ever consults
//! [`SpeechCoordinator::state`] and is never blocked by this pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use super::state::{SpeechEvent, SpeechState, SpeechStateMachine};
use crate::prompts;
use crate::services::{
    GenerationClient, SamplingOptions, ServiceError, SpeechSynthesisClient, SpeechToTextClient,
    VoiceSettings,
};
use crate::workout::Workout;

/// Fallback message surfaced when a pipeline stage fails.
pub const FALLBACK_MESSAGE: &str =
    "The voice assistant is temporarily unavailable. Continue your workout!";

/// Hard cap on voice recording length in seconds.
pub const MAX_RECORDING_SECS: u64 = 5;

/// Microphone capture and speaker playback, provided by the host platform.
///
/// Implementations own device acquisition: the device is acquired when a
/// call starts and must be released before it returns, on every path
/// including errors and interruption.
pub trait AudioIo {
    /// Records microphone audio until `stop` is set or `max` elapses.
    /// An empty buffer means nothing usable was captured.
    async fn record(&self, max: Duration, stop: &AtomicBool) -> Result<Vec<u8>>;

    /// Plays audio to completion, returning early (discarding the rest)
    /// once `interrupt` is set.
    async fn play(&self, audio: &[u8], interrupt: &AtomicBool) -> Result<()>;

    /// MIME type of the buffers produced by [`record`](Self::record).
    fn mime_type(&self) -> &'static str {
        "audio/wav"
    }
}

/// Cloneable handle for user actions that must reach a pipeline mid-await.
#[derive(Debug, Clone)]
pub struct SpeechControls {
    stop_recording: Arc<AtomicBool>,
    interrupt_playback: Arc<AtomicBool>,
}

impl SpeechControls {
    /// Ends an active recording early; captured audio proceeds to
    /// transcription.
    pub fn stop_recording(&self) {
        self.stop_recording.store(true, Ordering::SeqCst);
    }

    /// Cancels active playback; remaining audio is discarded. Used before
    /// starting a new recording while the coach is still speaking.
    pub fn interrupt_playback(&self) {
        self.interrupt_playback.store(true, Ordering::SeqCst);
    }
}

/// Outcome of one voice interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceExchange {
    /// What the user said, when transcription succeeded.
    pub transcript: Option<String>,
    /// The coach's spoken reply, when the pipeline ran to completion.
    pub reply: Option<String>,
    /// User-visible status line on failure.
    pub notice: Option<String>,
}

/// Single-slot coordinator for voice capture, transcription, generation and
/// playback. Exactly one instance exists per session.
pub struct SpeechCoordinator<A: AudioIo> {
    machine: SpeechStateMachine,
    audio: A,
    stt: SpeechToTextClient,
    generation: GenerationClient,
    synthesis: SpeechSynthesisClient,
    voice_id: String,
    voice_settings: VoiceSettings,
    max_recording: Duration,
    stop_recording: Arc<AtomicBool>,
    interrupt_playback: Arc<AtomicBool>,
}

impl<A: AudioIo> SpeechCoordinator<A> {
    pub fn new(
        audio: A,
        stt: SpeechToTextClient,
        generation: GenerationClient,
        synthesis: SpeechSynthesisClient,
        voice_id: impl Into<String>,
        voice_settings: VoiceSettings,
    ) -> Self {
        Self {
            machine: SpeechStateMachine::new(),
            audio,
            stt,
            generation,
            synthesis,
            voice_id: voice_id.into(),
            voice_settings,
            max_recording: Duration::from_secs(MAX_RECORDING_SECS),
            stop_recording: Arc::new(AtomicBool::new(false)),
            interrupt_playback: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current pipeline state, consulted by the feedback arbitrator's gate.
    pub fn state(&self) -> SpeechState {
        self.machine.state()
    }

    /// Handle for stop/interrupt actions from the host.
    pub fn controls(&self) -> SpeechControls {
        SpeechControls {
            stop_recording: Arc::clone(&self.stop_recording),
            interrupt_playback: Arc::clone(&self.interrupt_playback),
        }
    }

    /// Runs one full voice interaction: record → transcribe → respond →
    /// speak.
    ///
    /// Stage failures surface the fallback notice and leave the machine
    /// idle; an empty capture or empty transcript is a quiet no-op.
    pub async fn run_voice_query(
        &mut self,
        workout: Option<&Workout>,
        rep_count: u32,
    ) -> VoiceExchange {
        if !self.machine.state().is_idle() {
            tracing::warn!(
                "Voice query requested while pipeline is {:?}",
                self.machine.state()
            );
            return VoiceExchange::default();
        }

        self.stop_recording.store(false, Ordering::SeqCst);
        self.interrupt_playback.store(false, Ordering::SeqCst);
        self.machine.process_event(SpeechEvent::StartRecording);

        let started = Instant::now();
        let audio = match self.audio.record(self.max_recording, &self.stop_recording).await {
            Ok(audio) => audio,
            Err(e) => return self.fail(format!("Recording failed: {}", e)),
        };

        let stop_event = if started.elapsed() >= self.max_recording {
            SpeechEvent::RecordingTimeout
        } else {
            SpeechEvent::StopRecording
        };
        self.machine.process_event(stop_event);

        if audio.is_empty() {
            tracing::debug!("Recording produced no audio, skipping transcription");
            self.machine.reset();
            return VoiceExchange::default();
        }

        let transcript = match self.stt.transcribe(audio, self.audio.mime_type()).await {
            Ok(text) => text,
            Err(ServiceError::EmptyInput(_)) => {
                self.machine.reset();
                return VoiceExchange::default();
            }
            Err(e) => return self.fail(format!("Transcription failed: {}", e)),
        };

        if transcript.trim().is_empty() {
            tracing::debug!("Transcription produced no text");
            self.machine.reset();
            return VoiceExchange::default();
        }

        self.machine.process_event(SpeechEvent::TranscriptReady {
            text: transcript.clone(),
        });

        let system = prompts::voice_query_system_prompt(workout, rep_count);
        let response = match self
            .generation
            .generate(&transcript, Some(&system), SamplingOptions::voice_query())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let mut exchange = self.fail(format!("Generation failed: {}", e));
                exchange.transcript = Some(transcript);
                return exchange;
            }
        };

        self.machine.process_event(SpeechEvent::ResponseReady {
            text: response.text.clone(),
        });

        if let Err(e) = self.speak(&response.text).await {
            let mut exchange = self.fail(format!("Playback failed: {}", e));
            exchange.transcript = Some(transcript);
            return exchange;
        }

        VoiceExchange {
            transcript: Some(transcript),
            reply: Some(response.text),
            notice: None,
        }
    }

    /// Generates and speaks one feedback sentence for an arbitrator
    /// decision, returning the text to be recorded in the session history.
    ///
    /// Requires the pipeline to be idle; on any stage failure the machine
    /// returns to idle and the caller surfaces [`FALLBACK_MESSAGE`].
    pub async fn speak_feedback(&mut self, prompt: &str) -> Result<String> {
        if !self.machine.state().is_idle() {
            return Err(anyhow!(
                "speech pipeline is busy ({:?})",
                self.machine.state()
            ));
        }

        self.interrupt_playback.store(false, Ordering::SeqCst);
        self.machine.process_event(SpeechEvent::BeginResponse);

        let response = match self
            .generation
            .generate(prompt, Some(prompts::COACH_SYSTEM_PROMPT), SamplingOptions::live_feedback())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.fail(format!("Generation failed: {}", e));
                return Err(e.into());
            }
        };

        self.machine.process_event(SpeechEvent::ResponseReady {
            text: response.text.clone(),
        });

        if let Err(e) = self.speak(&response.text).await {
            self.fail(format!("Playback failed: {}", e));
            return Err(e);
        }

        Ok(response.text)
    }

    /// Synthesises and plays `text` from the Speaking state, then returns
    /// the machine to idle (complete or interrupted).
    async fn speak(&mut self, text: &str) -> Result<()> {
        let audio = self
            .synthesis
            .synthesise(text, &self.voice_id, &self.voice_settings)
            .await?;

        self.audio.play(&audio, &self.interrupt_playback).await?;

        let event = if self.interrupt_playback.swap(false, Ordering::SeqCst) {
            SpeechEvent::StopPlayback
        } else {
            SpeechEvent::PlaybackFinished
        };
        self.machine.process_event(event);
        Ok(())
    }

    /// Drives the machine to idle after a stage failure and builds the
    /// fallback exchange.
    fn fail(&mut self, message: String) -> VoiceExchange {
        tracing::warn!("Speech pipeline failure: {}", message);
        self.machine
            .process_event(SpeechEvent::StageFailed { message });
        VoiceExchange {
            transcript: None,
            reply: None,
            notice: Some(FALLBACK_MESSAGE.to_string()),
        }
    }
}
