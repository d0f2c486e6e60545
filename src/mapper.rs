use std::f64::consts::TAU;

use crate::core::{Point, Viewport};
use crate::settings::{ColorMode, RenderSettings};
use crate::signature::Signature;

/// Outer radius as a fraction of the smaller viewport dimension.
pub const BASE_RADIUS_FACTOR: f64 = 0.3;

/// Saturation used by the archetypal color mode. The signature carries no
/// archetype, so the palette is a constant.
pub const ARCHETYPAL_SATURATION: f64 = 70.0;

/// Drawable attributes for one frame of the active glyph.
///
/// Everything downstream composition needs: color channels in HSL space,
/// stroke width, and the sampled contour in logical coordinates. The
/// closing sample is included (`vertices.len() == vertex_count + 1`); with
/// a non-integer resonance frequency it does not coincide with the first
/// vertex, and the contour path closes the remaining gap.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawAttributes {
    /// Degrees, `[0, 360)`.
    pub hue: f64,
    /// Percent, `[0, 100]`.
    pub saturation: f64,
    /// Percent, `[0, 100]`.
    pub lightness: f64,
    pub stroke_width: f64,
    /// Number of contour vertices, at least 3.
    pub vertex_count: usize,
    /// Breathing-scaled outer radius, before per-vertex lobe variation.
    pub base_radius: f64,
    pub center: Point,
    pub vertices: Vec<Point>,
}

/// Map a signature to drawable attributes at virtual time `t`.
///
/// Pure and deterministic: fixed `(signature, t, settings, viewport)`
/// yields bit-identical output. Inputs are re-clamped here so hand-built
/// values behave like upstream ones.
#[tracing::instrument(level = "trace", skip(signature, settings))]
pub fn map_attributes(
    signature: &Signature,
    t: f64,
    settings: &RenderSettings,
    viewport: Viewport,
) -> DrawAttributes {
    let sig = signature.clamped();
    let settings = settings.clamped();
    let speed = sig.glyph.animation_speed;

    let hue = (sig.glyph.color_hue * 360.0).rem_euclid(360.0);
    let saturation = match settings.color_mode {
        ColorMode::Emotional => sig.emotional_valence.abs() * 100.0,
        ColorMode::Archetypal => ARCHETYPAL_SATURATION,
        ColorMode::Energy => sig.energy_level * 100.0,
        ColorMode::Monochrome => 0.0,
    };
    let lightness = (50.0 + sig.energy_level * 30.0).clamp(0.0, 100.0);
    let stroke_width = (2.0 + sig.energy_level * 3.0) * settings.intensity;

    let vertex_count = ((3.0 + sig.glyph.shape_complexity * 12.0).floor() as usize).max(3);

    // Energy makes the whole contour breathe around its resting radius.
    let base_radius = viewport.min_extent()
        * BASE_RADIUS_FACTOR
        * (1.0 + (t * speed * 5.0).sin() * sig.energy_level * 0.3);

    let center = viewport.center();
    let mut vertices = Vec::with_capacity(vertex_count + 1);
    for i in 0..=vertex_count {
        let angle = (i as f64 / vertex_count as f64) * TAU;
        // Resonance frequency sets the lobe count, complexity the depth.
        let variation = 1.0
            + (angle * sig.glyph.resonance_frequency + t * speed * 3.0).sin()
                * sig.cognitive_complexity
                * 0.4;
        let r = base_radius * variation;
        vertices.push(Point::new(
            center.x + angle.cos() * r,
            center.y + angle.sin() * r,
        ));
    }

    DrawAttributes {
        hue,
        saturation,
        lightness,
        stroke_width,
        vertex_count,
        base_radius,
        center,
        vertices,
    }
}
