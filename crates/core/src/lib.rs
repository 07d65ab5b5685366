//! Core library for the Stillpoint breathing trainer.
//!
//! The crate converts declarative breathing patterns into a continuously
//! updated phase state and maps that state onto a live-synthesized ambient
//! soundscape. Each module owns a distinct subsystem: the pattern catalog,
//! the pure rhythm engine, the synthesis primitives and the audio graph built
//! from them, the session orchestrator, and the timing capabilities that
//! drive it all.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod rhythm;
pub mod session;
pub mod synth;
pub mod timing;

pub use audio::{breath_gain_target, AudioEngine};
pub use catalog::{BreathingMethod, BreathingSegment, Catalog, PhaseKind, SoundProfile};
pub use config::{AppConfig, AudioConfig};
pub use error::{Result, StillpointError};
pub use rhythm::{evaluate, PhaseState};
pub use session::{EndReason, Session, SessionEvent, SessionState};
pub use timing::{Delay, SessionClock, Ticker};
