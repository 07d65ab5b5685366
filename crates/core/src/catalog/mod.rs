use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Result, StillpointError};

/// Ambient soundscape selection attached to each breathing method.
///
/// Each profile resolves to a fixed binaural pair: a carrier frequency and
/// the beat frequency between the two detuned tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SoundProfile {
    Focus,
    Relax,
    Balance,
    Energize,
}

impl SoundProfile {
    /// Returns the `(base_hz, beat_hz)` pair for the binaural drone layer.
    pub fn binaural(self) -> (f64, f64) {
        match self {
            // Gamma (40 Hz)
            SoundProfile::Focus => (200.0, 40.0),
            // Delta (4 Hz), deep calm
            SoundProfile::Relax => (100.0, 4.0),
            // Alpha (10 Hz), coherence
            SoundProfile::Balance => (150.0, 10.0),
            // Beta/Gamma (30 Hz)
            SoundProfile::Energize => (250.0, 30.0),
        }
    }
}

impl fmt::Display for SoundProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SoundProfile::Focus => "FOCUS",
            SoundProfile::Relax => "RELAX",
            SoundProfile::Balance => "BALANCE",
            SoundProfile::Energize => "ENERGIZE",
        };
        f.pad(name)
    }
}

/// Kind of breath phase a segment represents.
///
/// Derived once from the segment label when the catalog is built so that the
/// audio layer never has to re-parse label text at runtime. Labels that match
/// no keyword (`"Ready"`, `"Let Go"`) classify as [`PhaseKind::Idle`], which
/// maps to a silent noise bed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    Inhale,
    Hold,
    Exhale,
    #[default]
    Idle,
}

impl PhaseKind {
    /// Case-insensitive substring classification of a display label.
    ///
    /// Checks run in order (inhale, hold, exhale); a label such as
    /// `"Holding"` therefore resolves by its first matching keyword.
    pub fn classify(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("in") {
            PhaseKind::Inhale
        } else if label.contains("hold") {
            PhaseKind::Hold
        } else if label.contains("exhale") || label.contains("out") || label.contains("ocean") {
            PhaseKind::Exhale
        } else {
            PhaseKind::Idle
        }
    }
}

/// One timed phase of a breath cycle with a linear expansion target.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathingSegment {
    /// Phase length in seconds. Must be strictly positive.
    pub duration: f32,
    /// Text shown to the user while the phase is active.
    pub label: String,
    /// Phase kind derived from the label at construction time.
    pub kind: PhaseKind,
    /// Expansion at the start of the phase, in `[0, 1]`.
    pub scale_start: f32,
    /// Expansion at the end of the phase, in `[0, 1]`.
    pub scale_end: f32,
}

impl BreathingSegment {
    pub fn new(duration: f32, label: impl Into<String>, scale_start: f32, scale_end: f32) -> Self {
        let label = label.into();
        let kind = PhaseKind::classify(&label);
        Self {
            duration,
            label,
            kind,
            scale_start,
            scale_end,
        }
    }
}

impl<'de> Deserialize<'de> for BreathingSegment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            duration: f32,
            label: String,
            scale_start: f32,
            scale_end: f32,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(BreathingSegment::new(
            raw.duration,
            raw.label,
            raw.scale_start,
            raw.scale_end,
        ))
    }
}

/// A named breathing method: a cyclic sequence of timed segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathingMethod {
    pub id: String,
    pub title: String,
    pub description: String,
    pub sound_profile: SoundProfile,
    pub segments: Vec<BreathingSegment>,
}

impl BreathingMethod {
    /// Length of one full cycle in seconds.
    pub fn cycle_seconds(&self) -> f32 {
        self.segments.iter().map(|segment| segment.duration).sum()
    }

    /// Checks the invariants the rhythm engine relies on: a non-empty
    /// segment list with strictly positive durations.
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(StillpointError::InvalidInput(
                "breathing method requires at least one segment",
            ));
        }
        if self.segments.iter().any(|segment| segment.duration <= 0.0) {
            return Err(StillpointError::InvalidInput(
                "segment durations must be strictly positive",
            ));
        }
        Ok(())
    }
}

/// Immutable, process-wide registry of breathing methods.
#[derive(Debug, Clone)]
pub struct Catalog {
    methods: Vec<BreathingMethod>,
}

impl Catalog {
    /// Returns the built-in catalog. The list is reference data: created at
    /// startup and never mutated afterwards.
    pub fn builtin() -> Self {
        Self {
            methods: builtin_methods(),
        }
    }

    /// Loads a catalog from a JSON array of methods, validating each one.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let methods: Vec<BreathingMethod> = serde_json::from_str(json)?;
        for method in &methods {
            method.validate()?;
        }
        Ok(Self { methods })
    }

    pub fn methods(&self) -> &[BreathingMethod] {
        &self.methods
    }

    pub fn get(&self, id: &str) -> Option<&BreathingMethod> {
        self.methods.iter().find(|method| method.id == id)
    }
}

fn seg(duration: f32, label: &str, scale_start: f32, scale_end: f32) -> BreathingSegment {
    BreathingSegment::new(duration, label, scale_start, scale_end)
}

fn method(
    id: &str,
    title: &str,
    description: &str,
    sound_profile: SoundProfile,
    segments: Vec<BreathingSegment>,
) -> BreathingMethod {
    BreathingMethod {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        sound_profile,
        segments,
    }
}

fn builtin_methods() -> Vec<BreathingMethod> {
    vec![
        method(
            "box",
            "Box Breathing",
            "Calm the nervous system & improve focus.",
            SoundProfile::Focus,
            vec![
                seg(4.0, "Inhale", 0.0, 1.0),
                seg(4.0, "Hold", 1.0, 1.0),
                seg(4.0, "Exhale", 1.0, 0.0),
                seg(4.0, "Hold", 0.0, 0.0),
            ],
        ),
        method(
            "4-7-8",
            "4-7-8 Relax",
            "Deep relaxation & sleep induction.",
            SoundProfile::Relax,
            vec![
                seg(4.0, "Inhale", 0.0, 1.0),
                seg(7.0, "Hold", 1.0, 1.0),
                seg(8.0, "Exhale", 1.0, 0.0),
            ],
        ),
        method(
            "coherent",
            "Coherent",
            "Heart coherence & stress reduction (5.5s).",
            SoundProfile::Balance,
            vec![seg(5.5, "Inhale", 0.0, 1.0), seg(5.5, "Exhale", 1.0, 0.0)],
        ),
        method(
            "nadi-shodhana",
            "Alt. Nostril",
            "Balance left/right brain & clarity.",
            SoundProfile::Balance,
            vec![
                seg(4.0, "Inhale Left", 0.0, 1.0),
                seg(4.0, "Exhale Right", 1.0, 0.0),
                seg(4.0, "Inhale Right", 0.0, 1.0),
                seg(4.0, "Exhale Left", 1.0, 0.0),
            ],
        ),
        method(
            "extended-holds",
            "Extended Holds",
            "Deep focus & flow state priming.",
            SoundProfile::Focus,
            vec![
                seg(4.0, "Inhale", 0.0, 1.0),
                seg(7.0, "Hold", 1.0, 1.0),
                seg(8.0, "Exhale", 1.0, 0.0),
                seg(4.0, "Hold", 0.0, 0.0),
            ],
        ),
        method(
            "mindful",
            "Mindful Count",
            "Simple awareness. Count your breaths.",
            SoundProfile::Relax,
            vec![seg(5.0, "Inhale", 0.0, 1.0), seg(5.0, "Exhale", 1.0, 0.0)],
        ),
        method(
            "sama-vritti",
            "Box (Easy)",
            "Equal breath. Beginner friendly balance.",
            SoundProfile::Balance,
            vec![seg(4.0, "Inhale", 0.0, 1.0), seg(4.0, "Exhale", 1.0, 0.0)],
        ),
        method(
            "ujjayi",
            "Ocean Breath",
            "Slow, controlled constriction.",
            SoundProfile::Focus,
            vec![
                seg(7.0, "Inhale (Slow)", 0.0, 1.0),
                seg(7.0, "Exhale (Ocean)", 1.0, 0.0),
            ],
        ),
        method(
            "wim-hof-like",
            "Power Breath",
            "Energizing. Hyper-oxygenation pace.",
            SoundProfile::Energize,
            vec![seg(1.5, "Fully In", 0.0, 1.0), seg(1.0, "Let Go", 1.0, 0.2)],
        ),
        method(
            "flow-focus",
            "Flow Pace",
            "Alertness & sustained attention.",
            SoundProfile::Focus,
            vec![seg(3.5, "Inhale", 0.0, 1.0), seg(3.5, "Exhale", 1.0, 0.0)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_labels() {
        assert_eq!(PhaseKind::classify("Inhale"), PhaseKind::Inhale);
        assert_eq!(PhaseKind::classify("Inhale (Slow)"), PhaseKind::Inhale);
        assert_eq!(PhaseKind::classify("Fully In"), PhaseKind::Inhale);
        assert_eq!(PhaseKind::classify("hold"), PhaseKind::Hold);
        assert_eq!(PhaseKind::classify("Exhale Right"), PhaseKind::Exhale);
        assert_eq!(PhaseKind::classify("Exhale (Ocean)"), PhaseKind::Exhale);
        assert_eq!(PhaseKind::classify("Let Go"), PhaseKind::Idle);
        assert_eq!(PhaseKind::classify("Ready"), PhaseKind::Idle);
    }

    #[test]
    fn binaural_pairs_are_fixed_and_distinct() {
        let pairs = [
            (SoundProfile::Focus, (200.0, 40.0)),
            (SoundProfile::Relax, (100.0, 4.0)),
            (SoundProfile::Balance, (150.0, 10.0)),
            (SoundProfile::Energize, (250.0, 30.0)),
        ];
        for (profile, expected) in pairs {
            assert_eq!(profile.binaural(), expected);
        }
    }

    #[test]
    fn builtin_methods_are_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.methods().len(), 10);
        for method in catalog.methods() {
            method.validate().expect("builtin method should validate");
        }
    }

    #[test]
    fn box_cycle_is_sixteen_seconds() {
        let catalog = Catalog::builtin();
        let method = catalog.get("box").expect("box method should exist");
        assert!((method.cycle_seconds() - 16.0).abs() < f32::EPSILON);
        assert_eq!(method.sound_profile, SoundProfile::Focus);
    }

    #[test]
    fn lookup_by_unknown_id_is_none() {
        assert!(Catalog::builtin().get("does-not-exist").is_none());
    }

    #[test]
    fn deserialized_segments_carry_derived_kinds() {
        let json = r#"[{
            "id": "custom",
            "title": "Custom",
            "description": "Test pattern.",
            "soundProfile": "RELAX",
            "segments": [
                { "duration": 3.0, "label": "Inhale", "scaleStart": 0.0, "scaleEnd": 1.0 },
                { "duration": 3.0, "label": "Exhale", "scaleStart": 1.0, "scaleEnd": 0.0 }
            ]
        }]"#;

        let catalog = Catalog::from_json_str(json).unwrap();
        let method = catalog.get("custom").unwrap();
        assert_eq!(method.segments[0].kind, PhaseKind::Inhale);
        assert_eq!(method.segments[1].kind, PhaseKind::Exhale);
        assert_eq!(method.sound_profile, SoundProfile::Relax);
    }

    #[test]
    fn rejects_method_without_segments() {
        let json = r#"[{
            "id": "empty",
            "title": "Empty",
            "description": "No segments.",
            "soundProfile": "FOCUS",
            "segments": []
        }]"#;

        assert!(Catalog::from_json_str(json).is_err());
    }

    #[test]
    fn rejects_non_positive_durations() {
        let json = r#"[{
            "id": "zero",
            "title": "Zero",
            "description": "Bad duration.",
            "soundProfile": "FOCUS",
            "segments": [
                { "duration": 0.0, "label": "Inhale", "scaleStart": 0.0, "scaleEnd": 1.0 }
            ]
        }]"#;

        assert!(Catalog::from_json_str(json).is_err());
    }
}
