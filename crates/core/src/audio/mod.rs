//! Live audio graph: an ambient soundscape modulated by breath phase.
//!
//! The engine exclusively owns every sound-generating node. Two layers per
//! session: a lowpass-filtered brown-noise bed whose gain follows the breath,
//! and a constant binaural drone (two detuned sines, hard-panned left and
//! right). The host pulls interleaved stereo blocks via [`AudioEngine::render`].

use crate::catalog::{PhaseKind, SoundProfile};
use crate::synth::{brown_noise, BufferSource, LowpassFilter, SineOscillator, SmoothedGain};

const NOISE_CUTOFF_HZ: f64 = 800.0;
const NOISE_BED_SECONDS: f32 = 2.0;
const NOISE_SEED: u64 = 0x9E37_79B9_7F4A_7C15;
const BINAURAL_LEVEL: f64 = 0.1;
const FADE_IN_SECONDS: f64 = 1.0;
const FADE_OUT_SECONDS: f64 = 1.0;
const FADE_OUT_FLOOR: f64 = 0.001;
/// Nodes are kept alive slightly longer than the fade so the tail is not
/// clipped; after this window they are released.
const RELEASE_SECONDS: f64 = 1.2;
const BREATH_SMOOTHING: f64 = 0.1;
/// Upper bound on simultaneously draining graphs. Rapid start/stop cycles
/// drop the oldest tail instead of growing the graph set.
const MAX_DRAINING: usize = 4;

/// Target gain for the noise bed given the current breath phase.
///
/// This is the parameter-mapping contract between the rhythm and audio
/// engines: inhale swells from 0.2 to 0.8, exhale falls back symmetrically,
/// holds sit at a steady mid level, and anything unclassified is silent.
pub fn breath_gain_target(kind: PhaseKind, progress: f32) -> f64 {
    let progress = progress as f64;
    match kind {
        PhaseKind::Inhale => 0.2 + 0.6 * progress,
        PhaseKind::Hold => 0.5,
        PhaseKind::Exhale => 0.8 - 0.6 * progress,
        PhaseKind::Idle => 0.0,
    }
}

/// One session's worth of graph nodes.
#[derive(Debug, Clone)]
struct AudioGraph {
    noise: BufferSource,
    noise_filter: LowpassFilter,
    noise_gain: SmoothedGain,
    osc_left: SineOscillator,
    osc_right: SineOscillator,
    master: SmoothedGain,
}

impl AudioGraph {
    fn new(profile: SoundProfile, sample_rate: u32) -> Self {
        let rate = sample_rate as f64;
        let (base_hz, beat_hz) = profile.binaural();

        Self {
            noise: BufferSource::looping(brown_noise(sample_rate, NOISE_BED_SECONDS, NOISE_SEED)),
            noise_filter: LowpassFilter::new(NOISE_CUTOFF_HZ, rate),
            // Bed starts silent until the first breath update arrives.
            noise_gain: SmoothedGain::new(rate, 0.0),
            osc_left: SineOscillator::new(base_hz, rate),
            osc_right: SineOscillator::new(base_hz + beat_hz, rate),
            master: SmoothedGain::new(rate, 0.0),
        }
    }

    /// Render one stereo frame. Hard-panned oscillators collapse to direct
    /// channel assignment; the mono bed feeds both channels.
    fn render_frame(&mut self) -> (f64, f64) {
        let bed = self.noise_filter.process(self.noise.next_sample()) * self.noise_gain.next();
        let left = bed + self.osc_left.next_sample() * BINAURAL_LEVEL;
        let right = bed + self.osc_right.next_sample() * BINAURAL_LEVEL;
        let master = self.master.next();
        (left * master, right * master)
    }
}

/// A superseded graph still rendering its fade-out tail.
#[derive(Debug, Clone)]
struct DrainingGraph {
    graph: AudioGraph,
    samples_left: usize,
}

/// Owner of the live audio graph.
///
/// At most one session is active at a time; `start` serializes this by
/// unconditionally stopping first. Stopped graphs keep fading in a draining
/// set until their release window elapses, even if a new session has already
/// begun.
#[derive(Debug)]
pub struct AudioEngine {
    sample_rate: u32,
    session: Option<AudioGraph>,
    draining: Vec<DrainingGraph>,
}

impl AudioEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            session: None,
            draining: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Builds a fresh two-layer graph for `profile`, superseding any session
    /// already in flight. Master output fades in linearly over one second.
    pub fn start(&mut self, profile: SoundProfile) {
        self.stop();
        tracing::debug!(%profile, "starting audio session");

        let mut graph = AudioGraph::new(profile, self.sample_rate);
        graph.master.linear_ramp(1.0, FADE_IN_SECONDS);
        self.session = Some(graph);
    }

    /// Retargets the noise-bed gain from the current breath phase. Called
    /// every animation frame; the smoothed approach absorbs arbitrarily
    /// frequent retargeting without clicks or graph growth. No-op while
    /// stopped.
    pub fn update_breath(&mut self, kind: PhaseKind, progress: f32) {
        let Some(graph) = self.session.as_mut() else {
            return;
        };
        graph
            .noise_gain
            .set_target(breath_gain_target(kind, progress), BREATH_SMOOTHING);
    }

    /// Fades the active session out over one second and schedules its nodes
    /// for release after the fade window. Idempotent; fire-and-forget — a
    /// following `start` does not wait for the tail.
    pub fn stop(&mut self) {
        let Some(mut graph) = self.session.take() else {
            return;
        };
        tracing::debug!("stopping audio session");

        graph.master.cancel_scheduled();
        graph.master.exponential_ramp(FADE_OUT_FLOOR, FADE_OUT_SECONDS);

        let samples_left = (RELEASE_SECONDS * self.sample_rate as f64) as usize;
        self.draining.push(DrainingGraph { graph, samples_left });
        if self.draining.len() > MAX_DRAINING {
            let excess = self.draining.len() - MAX_DRAINING;
            self.draining.drain(0..excess);
        }
    }

    /// Fills an interleaved stereo buffer, mixing the active session with any
    /// draining tails and advancing their release windows.
    pub fn render(&mut self, out: &mut [f32]) {
        for frame in out.chunks_exact_mut(2) {
            let mut left = 0.0_f64;
            let mut right = 0.0_f64;

            if let Some(graph) = self.session.as_mut() {
                let (l, r) = graph.render_frame();
                left += l;
                right += r;
            }
            for draining in &mut self.draining {
                let (l, r) = draining.graph.render_frame();
                left += l;
                right += r;
                draining.samples_left = draining.samples_left.saturating_sub(1);
            }

            frame[0] = left as f32;
            frame[1] = right as f32;
        }

        self.draining.retain(|draining| draining.samples_left > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 8_000;

    fn render_seconds(engine: &mut AudioEngine, seconds: f64) -> Vec<f32> {
        let frames = (seconds * SAMPLE_RATE as f64) as usize;
        let mut out = vec![0.0_f32; frames * 2];
        engine.render(&mut out);
        out
    }

    #[test]
    fn gain_mapping_matches_contract() {
        assert_eq!(breath_gain_target(PhaseKind::Inhale, 0.0), 0.2);
        assert!((breath_gain_target(PhaseKind::Inhale, 1.0) - 0.8).abs() < 1e-9);
        assert_eq!(breath_gain_target(PhaseKind::Exhale, 0.0), 0.8);
        assert!((breath_gain_target(PhaseKind::Exhale, 1.0) - 0.2).abs() < 1e-9);
        assert_eq!(breath_gain_target(PhaseKind::Hold, 0.0), 0.5);
        assert_eq!(breath_gain_target(PhaseKind::Hold, 0.9), 0.5);
        assert_eq!(breath_gain_target(PhaseKind::Idle, 0.5), 0.0);
    }

    #[test]
    fn stop_before_start_is_a_no_op() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        engine.stop();
        engine.stop();
        assert!(!engine.is_playing());
        assert!(engine.draining.is_empty());
    }

    #[test]
    fn update_breath_while_stopped_is_absorbed() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        engine.update_breath(PhaseKind::Inhale, 0.5);
        assert!(!engine.is_playing());
    }

    #[test]
    fn starting_twice_leaves_one_active_graph() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        engine.start(SoundProfile::Focus);
        engine.start(SoundProfile::Relax);

        assert!(engine.is_playing());
        assert_eq!(engine.draining.len(), 1);
        let (base, beat) = SoundProfile::Relax.binaural();
        let session = engine.session.as_ref().unwrap();
        assert_eq!(session.osc_left.frequency, base);
        assert_eq!(session.osc_right.frequency, base + beat);
    }

    #[test]
    fn master_fades_in_over_one_second() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        engine.start(SoundProfile::Balance);
        render_seconds(&mut engine, 1.1);

        let session = engine.session.as_ref().unwrap();
        assert!((session.master.value() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn renders_silence_when_idle() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        let out = render_seconds(&mut engine, 0.1);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn renders_sound_during_an_inhale() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        engine.start(SoundProfile::Energize);
        engine.update_breath(PhaseKind::Inhale, 0.5);
        let out = render_seconds(&mut engine, 0.5);

        let peak = out.iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.01, "expected audible output, peak {peak}");
        assert!(peak <= 1.0, "output should not clip, peak {peak}");
    }

    #[test]
    fn stopped_graph_is_released_after_fade_window() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        engine.start(SoundProfile::Focus);
        engine.stop();
        assert_eq!(engine.draining.len(), 1);

        render_seconds(&mut engine, 1.0);
        assert_eq!(engine.draining.len(), 1, "tail still inside release window");

        render_seconds(&mut engine, 0.3);
        assert!(engine.draining.is_empty(), "tail should be released");
    }

    #[test]
    fn draining_tail_keeps_fading_after_a_new_session_starts() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        engine.start(SoundProfile::Focus);
        render_seconds(&mut engine, 0.5);
        engine.start(SoundProfile::Relax);

        assert_eq!(engine.draining.len(), 1);
        render_seconds(&mut engine, 1.3);
        assert!(engine.draining.is_empty());
        assert!(engine.is_playing());
    }

    #[test]
    fn rapid_start_stop_cycles_stay_bounded() {
        let mut engine = AudioEngine::new(SAMPLE_RATE);
        for _ in 0..50 {
            engine.start(SoundProfile::Focus);
            engine.stop();
        }
        assert!(engine.draining.len() <= MAX_DRAINING);
        assert!(!engine.is_playing());
    }
}
