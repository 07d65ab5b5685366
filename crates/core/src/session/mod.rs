//! Session orchestration: wires rhythm output into the audio engine and
//! drives the countdown and end-of-session transitions.

use serde::{Deserialize, Serialize};

use crate::audio::AudioEngine;
use crate::catalog::{BreathingMethod, SoundProfile};
use crate::rhythm::{self, PhaseState};
use crate::timing::{Delay, Ticker};

const COUNTDOWN_PERIOD: f32 = 1.0;
/// Natural completion lingers long enough for the visual fade to read as
/// complete before the session returns to idle.
const COMPLETION_LINGER_SECONDS: f32 = 3.0;
/// A user-initiated exit is more abrupt.
const EXIT_LINGER_SECONDS: f32 = 1.0;

/// Lifecycle states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Ending,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Completed,
    UserExit,
}

/// Notifications surfaced to the embedding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started {
        method_id: String,
        duration_minutes: u32,
    },
    Ended {
        reason: EndReason,
    },
}

/// The session orchestrator.
///
/// All transitions are driven by explicit `now` timestamps (seconds on any
/// monotonic origin), so the full state machine runs deterministically under
/// test; the application feeds it from a
/// [`SessionClock`](crate::timing::SessionClock).
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    audio: AudioEngine,
    method: Option<BreathingMethod>,
    remaining_seconds: u32,
    started_at: f64,
    countdown: Ticker,
    linger: Delay,
    end_reason: Option<EndReason>,
    phase: PhaseState,
}

impl Session {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: SessionState::Idle,
            audio: AudioEngine::new(sample_rate),
            method: None,
            remaining_seconds: 0,
            started_at: 0.0,
            countdown: Ticker::default(),
            linger: Delay::default(),
            end_reason: None,
            phase: PhaseState::idle(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Most recently computed breath state; [`PhaseState::idle`] outside a
    /// session. While ending naturally the last active state is held so the
    /// visual fade has something to show.
    pub fn phase(&self) -> &PhaseState {
        &self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Profile of the running method, for the visual layer.
    pub fn sound_profile(&self) -> Option<SoundProfile> {
        self.method.as_ref().map(|method| method.sound_profile)
    }

    /// Pulls the next block of soundscape audio (interleaved stereo).
    pub fn render_audio(&mut self, out: &mut [f32]) {
        self.audio.render(out);
    }

    /// Begins a session. A session already in flight is superseded, never an
    /// error. The caller guarantees `method` validates.
    pub fn start(
        &mut self,
        method: BreathingMethod,
        duration_minutes: u32,
        now: f64,
    ) -> SessionEvent {
        if self.state != SessionState::Idle {
            self.teardown();
        }
        tracing::info!(method = %method.id, duration_minutes, "session started");

        self.audio.start(method.sound_profile);
        self.remaining_seconds = duration_minutes * 60;
        self.started_at = now;
        self.countdown = Ticker::start(COUNTDOWN_PERIOD, now);
        self.phase = rhythm::evaluate(&method, 0.0);
        self.audio.update_breath(self.phase.kind, self.phase.progress);

        let event = SessionEvent::Started {
            method_id: method.id.clone(),
            duration_minutes,
        };
        self.method = Some(method);
        self.state = SessionState::Active;
        event
    }

    /// Advances the state machine to `now`: re-evaluates the rhythm, feeds
    /// the audio engine, applies countdown ticks, and resolves pending end
    /// transitions. Returns any lifecycle events that fired.
    pub fn advance(&mut self, now: f64) -> Vec<SessionEvent> {
        match self.state {
            SessionState::Idle => Vec::new(),
            SessionState::Active => {
                let method = self.method.as_ref().expect("active session has a method");
                let elapsed = (now - self.started_at).max(0.0) as f32;
                self.phase = rhythm::evaluate(method, elapsed);
                self.audio.update_breath(self.phase.kind, self.phase.progress);

                for _ in 0..self.countdown.poll(now) {
                    if self.remaining_seconds > 0 {
                        self.remaining_seconds -= 1;
                    }
                    if self.remaining_seconds == 0 {
                        self.complete(now);
                        break;
                    }
                }
                Vec::new()
            }
            SessionState::Ending => {
                if !self.linger.expired(now) {
                    return Vec::new();
                }
                let reason = self.end_reason.take().unwrap_or(EndReason::Completed);
                self.teardown();
                tracing::info!(?reason, "session ended");
                vec![SessionEvent::Ended { reason }]
            }
        }
    }

    /// User-initiated exit: audio stops immediately and the session lingers
    /// briefly before going idle. No-op outside `Active` (idempotent).
    pub fn stop(&mut self, now: f64) {
        if self.state != SessionState::Active {
            return;
        }
        tracing::info!("session exit requested");

        self.audio.stop();
        self.countdown.cancel();
        self.linger = Delay::start(EXIT_LINGER_SECONDS, now);
        self.end_reason = Some(EndReason::UserExit);
        self.state = SessionState::Ending;
    }

    /// Natural completion: the tick-feed stops (the audio engine holds its
    /// last values and keeps sounding) until the linger elapses.
    fn complete(&mut self, now: f64) {
        tracing::info!("session countdown complete");

        self.countdown.cancel();
        self.linger = Delay::start(COMPLETION_LINGER_SECONDS, now);
        self.end_reason = Some(EndReason::Completed);
        self.state = SessionState::Ending;
    }

    /// Guaranteed cleanup on every exit path: countdown and linger cancelled,
    /// audio stopped, state reset to idle.
    fn teardown(&mut self) {
        self.countdown.cancel();
        self.linger.cancel();
        self.audio.stop();
        self.method = None;
        self.remaining_seconds = 0;
        self.phase = PhaseState::idle();
        self.state = SessionState::Idle;
    }
}
