use crate::error::{GlyphError, GlyphResult};

pub use kurbo::{Affine, BezPath, Circle, Point, Rect, Vec2};

/// Largest physical dimension a viewport may map to, in pixels.
///
/// The CPU raster path addresses surfaces with 16-bit coordinates.
pub const MAX_PHYSICAL_DIM: f64 = 16_384.0;

/// Logical drawing area plus device pixel ratio.
///
/// Drawing happens in logical coordinates; `scale` converts them to physical
/// pixels at paint time, so a resize or DPR change never alters geometry
/// math, only the raster density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Logical width, > 0.
    pub width: f64,
    /// Logical height, > 0.
    pub height: f64,
    /// Device pixel ratio, > 0.
    pub scale: f64,
}

impl Viewport {
    /// Create a validated viewport.
    pub fn new(width: f64, height: f64, scale: f64) -> GlyphResult<Self> {
        if !(width.is_finite() && height.is_finite() && scale.is_finite()) {
            return Err(GlyphError::validation("Viewport dimensions must be finite"));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(GlyphError::validation("Viewport size must be > 0"));
        }
        if scale <= 0.0 {
            return Err(GlyphError::validation("Viewport scale must be > 0"));
        }
        if width * scale > MAX_PHYSICAL_DIM || height * scale > MAX_PHYSICAL_DIM {
            return Err(GlyphError::validation(format!(
                "Viewport physical size exceeds {MAX_PHYSICAL_DIM} px"
            )));
        }
        Ok(Self {
            width,
            height,
            scale,
        })
    }

    /// Viewport with a device pixel ratio of 1.
    pub fn with_unit_scale(width: f64, height: f64) -> GlyphResult<Self> {
        Self::new(width, height, 1.0)
    }

    /// Center of the logical drawing area.
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Smaller of the two logical dimensions.
    pub fn min_extent(self) -> f64 {
        self.width.min(self.height)
    }

    /// Physical width in pixels, rounded, at least 1.
    pub fn physical_width(self) -> u32 {
        (self.width * self.scale).round().max(1.0) as u32
    }

    /// Physical height in pixels, rounded, at least 1.
    pub fn physical_height(self) -> u32 {
        (self.height * self.scale).round().max(1.0) as u32
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Replace the alpha channel with `alpha` in [0, 1].
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Convert to premultiplied RGBA8 bytes.
    pub fn premultiplied(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

/// HSL color with alpha: hue in degrees, saturation and lightness in
/// percent, alpha in [0, 1].
///
/// The mapper produces colors in HSL space (the signature's hue channel is
/// angular); conversion to RGBA8 happens when draw ops are emitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: f64,
}

impl Hsla {
    pub const fn new(h: f64, s: f64, l: f64, a: f64) -> Self {
        Self { h, s, l, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Convert to straight-alpha RGBA8.
    pub fn to_rgba8(self) -> Rgba8 {
        let h = self.h.rem_euclid(360.0);
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match h {
            h if h < 60.0 => (c, x, 0.0),
            h if h < 120.0 => (x, c, 0.0),
            h if h < 180.0 => (0.0, c, x),
            h if h < 240.0 => (0.0, x, c),
            h if h < 300.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        fn chan(v: f64) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }

        Rgba8::new(chan(r + m), chan(g + m), chan(b + m), chan(self.a))
    }
}

/// Monotonic animation time in seconds.
///
/// Owned by the engine; advanced once per frame and reset only when a new
/// engine attaches, never on state transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VirtualClock {
    t: f64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed virtual time in seconds.
    pub fn seconds(self) -> f64 {
        self.t
    }

    /// Advance by `dt` seconds. Negative or non-finite deltas are ignored
    /// so the clock stays monotonic.
    pub fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.t += dt;
        }
    }

    pub fn reset(&mut self) {
        self.t = 0.0;
    }
}
