//! Sample-level synthesis primitives.
//!
//! The audio engine assembles its live graph from these nodes. Each node is a
//! small struct producing or transforming one sample per call; the engine
//! drives them inside its render loop. All nodes operate in f64 and are
//! deterministic, so graph behavior can be asserted in tests without a sound
//! device.

pub mod filter;
pub mod gain;
pub mod noise;
pub mod oscillator;

pub use filter::LowpassFilter;
pub use gain::SmoothedGain;
pub use noise::{brown_noise, BufferSource};
pub use oscillator::SineOscillator;
