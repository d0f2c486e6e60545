use serde::{Deserialize, Serialize};

/// Clamp into `[lo, hi]`, mapping NaN to the neutral value 0 first.
///
/// Infinities are orderable and clamp to the boundary like any other
/// out-of-range value; NaN is not, so it degrades to 0 before clamping.
fn sanitize(v: f64, lo: f64, hi: f64) -> f64 {
    let v = if v.is_nan() { 0.0 } else { v };
    v.clamp(lo, hi)
}

/// Shape-level parameters nested inside a signature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlyphParams {
    /// Vertex-count driver, `[0, 1]`.
    #[serde(default)]
    pub shape_complexity: f64,
    /// Normalized hue, `[0, 1]` mapping to 0-360 degrees.
    #[serde(default)]
    pub color_hue: f64,
    /// Normalized animation-rate multiplier, `[0, 1]`.
    #[serde(default)]
    pub animation_speed: f64,
    /// Lobe count around the contour, `[1, 10]`.
    #[serde(default = "default_resonance")]
    pub resonance_frequency: f64,
}

fn default_resonance() -> f64 {
    1.0
}

impl Default for GlyphParams {
    fn default() -> Self {
        Self {
            shape_complexity: 0.0,
            color_hue: 0.0,
            animation_speed: 0.0,
            resonance_frequency: default_resonance(),
        }
    }
}

impl GlyphParams {
    pub fn clamped(self) -> Self {
        Self {
            shape_complexity: sanitize(self.shape_complexity, 0.0, 1.0),
            color_hue: sanitize(self.color_hue, 0.0, 1.0),
            animation_speed: sanitize(self.animation_speed, 0.0, 1.0),
            resonance_frequency: sanitize(self.resonance_frequency, 1.0, 10.0),
        }
    }
}

/// Bounded cognitive-emotional vector driving the glyph.
///
/// Immutable once built: callers replace it wholesale, never mutate it in
/// place. Every constructor clamps, and consumers re-clamp before use, so
/// an out-of-range upstream value can never reach the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// `[-1, 1]`; magnitude drives saturation in the emotional color mode.
    #[serde(default)]
    pub emotional_valence: f64,
    /// `[0, 1]`; gates and scales the inner resonance pattern.
    #[serde(default)]
    pub cognitive_complexity: f64,
    /// `[0, 1]`; drives breathing amplitude, lightness, and particles.
    #[serde(default)]
    pub energy_level: f64,
    #[serde(default, rename = "glyph_parameters")]
    pub glyph: GlyphParams,
}

impl Signature {
    /// Build a signature, clamping every field into its domain.
    pub fn new(
        emotional_valence: f64,
        cognitive_complexity: f64,
        energy_level: f64,
        glyph: GlyphParams,
    ) -> Self {
        Self {
            emotional_valence,
            cognitive_complexity,
            energy_level,
            glyph,
        }
        .clamped()
    }

    /// Clamp every field into its declared domain. Never fails: malformed
    /// input degrades to the nearest valid signature instead of blocking
    /// the renderer.
    pub fn clamped(self) -> Self {
        Self {
            emotional_valence: sanitize(self.emotional_valence, -1.0, 1.0),
            cognitive_complexity: sanitize(self.cognitive_complexity, 0.0, 1.0),
            energy_level: sanitize(self.energy_level, 0.0, 1.0),
            glyph: self.glyph.clamped(),
        }
    }
}

/// One analysis result as produced by the upstream service.
///
/// Only the eight numeric fields feed rendering; identifiers and prose are
/// carried for callers. Unknown fields are ignored, missing numeric fields
/// default to neutral values, and conversion to [`Signature`] clamps.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisPayload {
    /// Correlation id assigned by the producer.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub emotional_valence: f64,
    #[serde(default)]
    pub cognitive_complexity: f64,
    #[serde(default)]
    pub energy_level: f64,
    #[serde(default)]
    pub archetypal_resonance: Option<String>,
    #[serde(default)]
    pub symbolic_elements: Vec<String>,
    #[serde(default)]
    pub meaning_signature: Option<String>,
    #[serde(default)]
    pub glyph_parameters: GlyphParams,
    /// Producer-side processing duration in milliseconds.
    #[serde(default, rename = "processingTime")]
    pub processing_time: Option<f64>,
    /// ISO-8601 timestamp assigned by the producer.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<&AnalysisPayload> for Signature {
    fn from(payload: &AnalysisPayload) -> Self {
        Signature::new(
            payload.emotional_valence,
            payload.cognitive_complexity,
            payload.energy_level,
            payload.glyph_parameters,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(shape: f64, hue: f64, speed: f64, resonance: f64) -> GlyphParams {
        GlyphParams {
            shape_complexity: shape,
            color_hue: hue,
            animation_speed: speed,
            resonance_frequency: resonance,
        }
    }

    #[test]
    fn out_of_range_values_clamp_to_boundary() {
        let sig = Signature::new(-2.0, 1.7, 1.7, params(1.2, -0.5, 2.0, 99.0));
        assert_eq!(sig.emotional_valence, -1.0);
        assert_eq!(sig.cognitive_complexity, 1.0);
        assert_eq!(sig.energy_level, 1.0);
        assert_eq!(sig.glyph.shape_complexity, 1.0);
        assert_eq!(sig.glyph.color_hue, 0.0);
        assert_eq!(sig.glyph.animation_speed, 1.0);
        assert_eq!(sig.glyph.resonance_frequency, 10.0);
    }

    #[test]
    fn in_range_values_pass_through() {
        let sig = Signature::new(0.8, 0.9, 0.6, params(0.75, 0.5, 1.0, 4.0));
        assert_eq!(sig.emotional_valence, 0.8);
        assert_eq!(sig.glyph.resonance_frequency, 4.0);
    }

    #[test]
    fn non_finite_values_become_neutral() {
        let sig = Signature::new(
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
            params(f64::NAN, f64::NAN, f64::NAN, f64::NAN),
        );
        assert_eq!(sig.emotional_valence, 0.0);
        assert_eq!(sig.cognitive_complexity, 1.0);
        assert_eq!(sig.energy_level, 0.0);
        assert_eq!(sig.glyph.shape_complexity, 0.0);
        // Resonance never drops below its domain floor.
        assert_eq!(sig.glyph.resonance_frequency, 1.0);
    }

    #[test]
    fn payload_with_extra_fields_parses() {
        let json = r#"{
            "id": "analysis_123",
            "emotional_valence": 0.4,
            "cognitive_complexity": 0.7,
            "energy_level": 0.5,
            "archetypal_resonance": "the weaver",
            "symbolic_elements": ["thread", "loom"],
            "meaning_signature": "weaving disparate threads",
            "glyph_parameters": {
                "shape_complexity": 0.6,
                "color_hue": 0.25,
                "animation_speed": 0.8,
                "resonance_frequency": 5.5
            },
            "processingTime": 1843,
            "timestamp": "2026-08-24T10:00:00.000Z",
            "confidence": 0.99
        }"#;

        let payload: AnalysisPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.id.as_deref(), Some("analysis_123"));
        assert_eq!(payload.symbolic_elements.len(), 2);
        assert_eq!(payload.processing_time, Some(1843.0));

        let sig = Signature::from(&payload);
        assert_eq!(sig.glyph.color_hue, 0.25);
        assert_eq!(sig.glyph.resonance_frequency, 5.5);
    }

    #[test]
    fn sparse_payload_defaults_stay_in_domain() {
        let payload: AnalysisPayload = serde_json::from_str(r#"{"energy_level": 9.0}"#).unwrap();
        let sig = Signature::from(&payload);
        assert_eq!(sig.energy_level, 1.0);
        assert_eq!(sig.emotional_valence, 0.0);
        assert_eq!(sig.glyph.resonance_frequency, 1.0);
    }
}
