use kurbo::Shape;

use crate::compose::{DisplayList, DrawOp, LayerBlend};
use crate::core::{Affine, BezPath, Circle, Rect, Rgba8, Viewport};
use crate::error::{GlyphError, GlyphResult};
use crate::surface::Surface;

/// Flattening tolerance for circles and stroke outlines, in logical px.
const PATH_TOLERANCE: f64 = 0.1;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the `premultiplied` flag makes this
/// explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Headless raster target backed by a CPU pixmap.
///
/// Presents at the viewport's physical resolution (logical size times
/// scale). Each present repaints from the clear color, so the pixmap
/// always holds exactly the last frame.
pub struct CpuRasterSurface {
    viewport: Viewport,
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    clear: Rgba8,
}

impl CpuRasterSurface {
    /// Target with a fully transparent clear color.
    pub fn new(viewport: Viewport) -> GlyphResult<Self> {
        Self::with_clear_color(viewport, Rgba8::new(0, 0, 0, 0))
    }

    pub fn with_clear_color(viewport: Viewport, clear: Rgba8) -> GlyphResult<Self> {
        let (width, height) = physical_u16(viewport)?;
        Ok(Self {
            viewport,
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
            clear,
        })
    }

    /// Resize the target. Reallocates the pixmap when the physical
    /// dimensions change; contents are undefined until the next present.
    pub fn set_viewport(&mut self, viewport: Viewport) -> GlyphResult<()> {
        let (width, height) = physical_u16(viewport)?;
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixmap = vello_cpu::Pixmap::new(width, height);
        }
        self.viewport = viewport;
        Ok(())
    }

    /// Copy out the last presented frame.
    pub fn frame_rgba(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

impl Surface for CpuRasterSurface {
    fn viewport(&self) -> GlyphResult<Viewport> {
        Ok(self.viewport)
    }

    // Headless target: no window system to register with.
    fn observe_resize(&mut self) {}

    fn unobserve_resize(&mut self) {}

    fn present(&mut self, frame: &DisplayList) -> GlyphResult<()> {
        // render_to_pixmap replaces the pixmap contents, so the clear must
        // be the first op of the base pass, covering the physical extent.
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        set_color(&mut ctx, self.clear);
        let extent = Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height));
        ctx.fill_path(&bezpath_to_cpu(&extent.to_path(PATH_TOLERANCE)));

        for layer in frame.layers.iter().filter(|l| l.blend == LayerBlend::Over) {
            for op in &layer.ops {
                draw_op(&mut ctx, op, self.viewport.scale);
            }
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        // Additive layers composite after the base pass; the composer
        // emits them last, so z-order is preserved.
        if frame
            .layers
            .iter()
            .any(|l| l.blend == LayerBlend::Lighten)
        {
            let mut additive = vello_cpu::Pixmap::new(self.width, self.height);
            let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
            for layer in frame
                .layers
                .iter()
                .filter(|l| l.blend == LayerBlend::Lighten)
            {
                for op in &layer.ops {
                    draw_op(&mut ctx, op, self.viewport.scale);
                }
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut additive);
            lighten_in_place(
                self.pixmap.data_as_u8_slice_mut(),
                additive.data_as_u8_slice(),
            )?;
        }
        Ok(())
    }
}

fn physical_u16(viewport: Viewport) -> GlyphResult<(u16, u16)> {
    let width: u16 = viewport
        .physical_width()
        .try_into()
        .map_err(|_| GlyphError::validation("surface width exceeds u16"))?;
    let height: u16 = viewport
        .physical_height()
        .try_into()
        .map_err(|_| GlyphError::validation("surface height exceeds u16"))?;
    Ok((width, height))
}

/// Saturating per-channel addition of premultiplied src onto dst.
fn lighten_in_place(dst: &mut [u8], src: &[u8]) -> GlyphResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(GlyphError::surface(
            "lighten_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        for i in 0..4 {
            d[i] = d[i].saturating_add(s[i]);
        }
    }
    Ok(())
}

fn draw_op(ctx: &mut vello_cpu::RenderContext, op: &DrawOp, scale: f64) {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(Affine::scale(scale)));

    match op {
        DrawOp::FillPath { path, color } => {
            set_color(ctx, *color);
            ctx.fill_path(&bezpath_to_cpu(path));
        }
        DrawOp::StrokePath { path, color, width } => {
            set_color(ctx, *color);
            ctx.fill_path(&bezpath_to_cpu(&stroke_outline(path, *width)));
        }
        DrawOp::FillCircle {
            center,
            radius,
            color,
        } => {
            set_color(ctx, *color);
            let disc = Circle::new(*center, *radius).to_path(PATH_TOLERANCE);
            ctx.fill_path(&bezpath_to_cpu(&disc));
        }
        DrawOp::StrokeCircle {
            center,
            radius,
            color,
            width,
        } => {
            set_color(ctx, *color);
            let ring = Circle::new(*center, *radius).to_path(PATH_TOLERANCE);
            ctx.fill_path(&bezpath_to_cpu(&stroke_outline(&ring, *width)));
        }
        DrawOp::Line {
            from,
            to,
            color,
            width,
        } => {
            set_color(ctx, *color);
            let mut path = BezPath::new();
            path.move_to(*from);
            path.line_to(*to);
            ctx.fill_path(&bezpath_to_cpu(&stroke_outline(&path, *width)));
        }
    }
}

fn set_color(ctx: &mut vello_cpu::RenderContext, color: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
}

/// Expand a stroke to its filled outline. The raster layer only fills.
fn stroke_outline(path: &BezPath, width: f64) -> BezPath {
    kurbo::stroke(
        path.elements().iter().copied(),
        &kurbo::Stroke::new(width),
        &kurbo::StrokeOpts::default(),
        PATH_TOLERANCE,
    )
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: crate::core::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{Layer, LayerKind};

    fn viewport(w: f64, h: f64, scale: f64) -> Viewport {
        Viewport::new(w, h, scale).unwrap()
    }

    fn full_rect_layer(blend: LayerBlend, color: Rgba8, extent: f64) -> Layer {
        Layer {
            kind: LayerKind::Contour,
            blend,
            ops: vec![DrawOp::FillPath {
                path: Rect::new(0.0, 0.0, extent, extent).to_path(PATH_TOLERANCE),
                color,
            }],
        }
    }

    fn center_pixel(frame: &FrameRGBA) -> [u8; 4] {
        let x = frame.width / 2;
        let y = frame.height / 2;
        let idx = ((y * frame.width + x) * 4) as usize;
        [
            frame.data[idx],
            frame.data[idx + 1],
            frame.data[idx + 2],
            frame.data[idx + 3],
        ]
    }

    #[test]
    fn empty_present_paints_clear_color() {
        let mut surface = CpuRasterSurface::with_clear_color(
            viewport(4.0, 4.0, 1.0),
            Rgba8::opaque(15, 23, 42),
        )
        .unwrap();
        surface.present(&DisplayList::default()).unwrap();
        let frame = surface.frame_rgba();
        assert_eq!(center_pixel(&frame), [15, 23, 42, 255]);
        assert!(frame.premultiplied);
    }

    #[test]
    fn default_clear_is_transparent() {
        let mut surface = CpuRasterSurface::new(viewport(4.0, 4.0, 1.0)).unwrap();
        surface.present(&DisplayList::default()).unwrap();
        assert_eq!(center_pixel(&surface.frame_rgba()), [0, 0, 0, 0]);
    }

    #[test]
    fn opaque_fill_covers_center_pixel() {
        let mut surface = CpuRasterSurface::new(viewport(8.0, 8.0, 1.0)).unwrap();
        let list = DisplayList {
            layers: vec![full_rect_layer(
                LayerBlend::Over,
                Rgba8::opaque(200, 40, 0),
                8.0,
            )],
        };
        surface.present(&list).unwrap();
        assert_eq!(center_pixel(&surface.frame_rgba()), [200, 40, 0, 255]);
    }

    #[test]
    fn clear_color_shows_behind_painted_ops() {
        let mut surface = CpuRasterSurface::with_clear_color(
            viewport(8.0, 8.0, 1.0),
            Rgba8::opaque(15, 23, 42),
        )
        .unwrap();
        // A corner rect leaves the center untouched: the stage color must
        // still be there after the base pass lands on the pixmap.
        let list = DisplayList {
            layers: vec![full_rect_layer(
                LayerBlend::Over,
                Rgba8::opaque(200, 40, 0),
                2.0,
            )],
        };
        surface.present(&list).unwrap();
        let frame = surface.frame_rgba();
        assert_eq!(&frame.data[0..4], &[200, 40, 0, 255]);
        assert_eq!(center_pixel(&frame), [15, 23, 42, 255]);
    }

    #[test]
    fn clear_color_is_not_doubled_by_the_additive_pass() {
        let mut surface = CpuRasterSurface::with_clear_color(
            viewport(8.0, 8.0, 1.0),
            Rgba8::opaque(10, 20, 30),
        )
        .unwrap();
        let list = DisplayList {
            layers: vec![full_rect_layer(
                LayerBlend::Lighten,
                Rgba8::opaque(5, 5, 5),
                8.0,
            )],
        };
        surface.present(&list).unwrap();
        // Additive src adds onto the cleared base exactly once.
        assert_eq!(center_pixel(&surface.frame_rgba()), [15, 25, 35, 255]);
    }

    #[test]
    fn lighten_layer_adds_channels() {
        let mut surface = CpuRasterSurface::new(viewport(8.0, 8.0, 1.0)).unwrap();
        let list = DisplayList {
            layers: vec![
                full_rect_layer(LayerBlend::Over, Rgba8::opaque(10, 0, 5), 8.0),
                full_rect_layer(LayerBlend::Lighten, Rgba8::opaque(20, 0, 250), 8.0),
            ],
        };
        surface.present(&list).unwrap();

        // Saturating add on premultiplied bytes: blue saturates at 255.
        assert_eq!(center_pixel(&surface.frame_rgba()), [30, 0, 255, 255]);
    }

    #[test]
    fn present_replaces_previous_frame() {
        let mut surface = CpuRasterSurface::new(viewport(8.0, 8.0, 1.0)).unwrap();
        let red = DisplayList {
            layers: vec![full_rect_layer(
                LayerBlend::Over,
                Rgba8::opaque(255, 0, 0),
                8.0,
            )],
        };
        surface.present(&red).unwrap();
        surface.present(&DisplayList::default()).unwrap();
        assert_eq!(center_pixel(&surface.frame_rgba()), [0, 0, 0, 0]);
    }

    #[test]
    fn scale_multiplies_pixel_dimensions() {
        let surface = CpuRasterSurface::new(viewport(400.0, 300.0, 1.5)).unwrap();
        let frame = surface.frame_rgba();
        assert_eq!((frame.width, frame.height), (600, 450));
        assert_eq!(frame.data.len(), 600 * 450 * 4);
    }

    #[test]
    fn scaled_geometry_lands_on_physical_pixels() {
        // A rect covering the logical canvas covers the whole physical
        // frame once the device transform is applied.
        let mut surface = CpuRasterSurface::new(viewport(4.0, 4.0, 2.0)).unwrap();
        let list = DisplayList {
            layers: vec![full_rect_layer(
                LayerBlend::Over,
                Rgba8::opaque(0, 255, 0),
                4.0,
            )],
        };
        surface.present(&list).unwrap();
        let frame = surface.frame_rgba();
        assert_eq!(frame.width, 8);
        assert_eq!(center_pixel(&frame), [0, 255, 0, 255]);
        // Corner pixel inside the scaled rect as well.
        assert_eq!(&frame.data[0..4], &[0, 255, 0, 255]);
    }

    #[test]
    fn resize_reallocates_pixmap() {
        let mut surface = CpuRasterSurface::new(viewport(4.0, 4.0, 1.0)).unwrap();
        surface.set_viewport(viewport(16.0, 16.0, 1.0)).unwrap();
        let frame = surface.frame_rgba();
        assert_eq!((frame.width, frame.height), (16, 16));
    }

    #[test]
    fn lighten_in_place_rejects_mismatched_buffers() {
        let mut dst = vec![0u8; 16];
        assert!(lighten_in_place(&mut dst, &[0u8; 12]).is_err());
        let mut odd = vec![0u8; 6];
        assert!(lighten_in_place(&mut odd, &[0u8; 6]).is_err());
    }
}
