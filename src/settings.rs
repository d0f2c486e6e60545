use serde::{Deserialize, Serialize};

/// Inclusive intensity domain.
pub const INTENSITY_MIN: f64 = 0.1;
pub const INTENSITY_MAX: f64 = 2.0;

/// Upper bound on the particle budget.
pub const MAX_PARTICLE_COUNT: u32 = 200;

/// How the glyph's color is derived from the signature.
///
/// The mode only changes the color formula; geometry is identical across
/// modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Saturation from the magnitude of emotional valence.
    #[default]
    Emotional,
    /// Fixed palette saturation.
    Archetypal,
    /// Saturation from the energy level.
    Energy,
    /// Zero saturation.
    Monochrome,
}

/// Caller-owned rendering preferences.
///
/// Passed by value on every update; the engine keeps the latest copy but
/// never persists it. Defaults match the product's customizer panel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Global visual gain in `[0.1, 2.0]`: scales stroke widths and layer
    /// alphas (alphas capped at 1), never geometry.
    pub intensity: f64,
    /// Particle budget in `[0, 200]`; the drawn count also scales with the
    /// signature's energy level.
    pub particle_count: u32,
    /// Paint the additive glow overlay.
    pub glow_enabled: bool,
    /// Paint the inner resonance pattern (still gated on complexity).
    pub show_inner_patterns: bool,
    pub color_mode: ColorMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            particle_count: 20,
            glow_enabled: true,
            show_inner_patterns: true,
            color_mode: ColorMode::Emotional,
        }
    }
}

impl RenderSettings {
    /// Clamp every field into its documented domain. NaN intensity falls
    /// back to the neutral 1.0.
    pub fn clamped(self) -> Self {
        let intensity = if self.intensity.is_nan() {
            1.0
        } else {
            self.intensity.clamp(INTENSITY_MIN, INTENSITY_MAX)
        };
        Self {
            intensity,
            particle_count: self.particle_count.min(MAX_PARTICLE_COUNT),
            ..self
        }
    }
}
