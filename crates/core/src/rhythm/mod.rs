use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{BreathingMethod, PhaseKind};

/// Instantaneous breath state at a given elapsed time.
///
/// A pure projection: recomputed every tick from `(method, elapsed)` and
/// never stored by the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseState {
    /// Display label of the active segment.
    pub label: String,
    /// Phase kind of the active segment.
    pub kind: PhaseKind,
    /// Linear progress through the active segment, in `[0, 1)`.
    pub progress: f32,
    /// Eased expansion target in `[0, 1]`, consumed by visuals and audio.
    pub scale: f32,
}

impl PhaseState {
    /// State reported while no session is running.
    pub fn idle() -> Self {
        Self {
            label: "Ready".to_string(),
            kind: PhaseKind::Idle,
            progress: 0.0,
            scale: 0.0,
        }
    }
}

/// Evaluates the breath state of `method` at `elapsed_seconds`.
///
/// Pure and stateless: equal inputs always produce equal outputs, so callers
/// can test against synthetic timestamps without any wall-clock mocking. The
/// caller guarantees the method validates (non-empty segments, positive
/// durations); see [`BreathingMethod::validate`].
pub fn evaluate(method: &BreathingMethod, elapsed_seconds: f32) -> PhaseState {
    let total = method.cycle_seconds();
    let t = elapsed_seconds.rem_euclid(total);

    // Half-open scan: a boundary time belongs to the segment starting there.
    // If rounding pushes `t` past every interval (e.g. exactly the cycle
    // length), the last segment wins.
    let mut segment_start = 0.0_f32;
    let mut active = method
        .segments
        .last()
        .expect("validated method has at least one segment");
    let mut active_start = total - active.duration;

    for segment in &method.segments {
        if t >= segment_start && t < segment_start + segment.duration {
            active = segment;
            active_start = segment_start;
            break;
        }
        segment_start += segment.duration;
    }

    let progress = (t - active_start) / active.duration;
    let eased = raised_cosine(progress);
    let scale = active.scale_start + (active.scale_end - active.scale_start) * eased;

    PhaseState {
        label: active.label.clone(),
        kind: active.kind,
        progress,
        scale,
    }
}

/// Raised-cosine ease: zero velocity at both ends of the segment, matching
/// the natural acceleration and deceleration of a breath.
fn raised_cosine(progress: f32) -> f32 {
    0.5 * (1.0 - (progress * PI).cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Catalog;

    const TOLERANCE: f32 = 1e-5;

    fn builtin(id: &str) -> BreathingMethod {
        Catalog::builtin().get(id).expect("method exists").clone()
    }

    #[test]
    fn idle_state_is_ready() {
        let state = PhaseState::idle();
        assert_eq!(state.label, "Ready");
        assert_eq!(state.kind, PhaseKind::Idle);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.scale, 0.0);
    }

    #[test]
    fn box_midpoint_of_inhale() {
        let method = builtin("box");
        let state = evaluate(&method, 2.0);

        assert_eq!(state.label, "Inhale");
        assert_eq!(state.kind, PhaseKind::Inhale);
        assert!((state.progress - 0.5).abs() < TOLERANCE);
        // eased(0.5) == 0.5 exactly on the raised cosine
        assert!((state.scale - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn wraps_at_cycle_boundary() {
        let method = builtin("coherent");
        let state = evaluate(&method, 11.0);

        assert_eq!(state.label, "Inhale");
        assert!(state.progress.abs() < TOLERANCE);
        assert!(state.scale.abs() < TOLERANCE);
    }

    #[test]
    fn periodicity_across_builtin_catalog() {
        let catalog = Catalog::builtin();
        for method in catalog.methods() {
            let cycle = method.cycle_seconds();
            for step in 0..40 {
                let t = step as f32 * 0.37;
                let a = evaluate(method, t);
                let b = evaluate(method, t + cycle);
                assert_eq!(a.label, b.label, "label differs for {}", method.id);
                assert!(
                    (a.progress - b.progress).abs() < 1e-3,
                    "progress differs for {} at t={t}",
                    method.id
                );
                assert!(
                    (a.scale - b.scale).abs() < 1e-3,
                    "scale differs for {} at t={t}",
                    method.id
                );
            }
        }
    }

    #[test]
    fn segment_start_yields_exact_scale_start() {
        let method = builtin("box");
        let mut start = 0.0_f32;
        for segment in &method.segments {
            let state = evaluate(&method, start);
            assert_eq!(state.label, segment.label);
            assert!(state.progress.abs() < TOLERANCE);
            assert!(
                (state.scale - segment.scale_start).abs() < TOLERANCE,
                "scale at start of {} should be {}",
                segment.label,
                segment.scale_start
            );
            start += segment.duration;
        }
    }

    #[test]
    fn segment_end_approaches_scale_end() {
        let method = builtin("4-7-8");
        // Just before the end of the 8 s exhale (starts at t = 11).
        let state = evaluate(&method, 18.999);
        assert_eq!(state.label, "Exhale");
        assert!(state.progress > 0.999);
        assert!((state.scale - 0.0).abs() < 1e-3);
    }

    #[test]
    fn easing_is_monotone_within_a_segment() {
        let method = builtin("coherent");

        // Rising segment: scale must be non-decreasing.
        let mut last = -1.0_f32;
        for step in 0..=100 {
            let t = 5.5 * step as f32 / 100.0 * 0.999;
            let state = evaluate(&method, t);
            assert!(state.scale >= last, "scale regressed at t={t}");
            last = state.scale;
        }

        // Falling segment: scale must be non-increasing.
        let mut last = 2.0_f32;
        for step in 0..=100 {
            let t = 5.5 + 5.5 * step as f32 / 100.0 * 0.999;
            let state = evaluate(&method, t);
            assert!(state.scale <= last, "scale increased at t={t}");
            last = state.scale;
        }
    }

    #[test]
    fn boundary_belongs_to_the_starting_segment() {
        let method = builtin("box");
        // t = 4 is the first instant of the hold, not the end of the inhale.
        let state = evaluate(&method, 4.0);
        assert_eq!(state.label, "Hold");
        assert!(state.progress.abs() < TOLERANCE);
    }
}
