use std::cell::Cell;

use crate::compose::DisplayList;
use crate::core::Viewport;
use crate::error::{GlyphError, GlyphResult};

/// A drawable surface the engine paints into, once per frame.
///
/// `viewport` is probed at attach time and again before every paint: a
/// failure at attach is fatal (`SurfaceUnavailable`), a failure mid-loop is
/// treated as a transient resize-observation fault and the engine keeps the
/// last known dimensions. Implementations should return
/// [`GlyphError::SurfaceUnavailable`] when the surface can never be
/// acquired and [`GlyphError::Surface`] for transient faults.
///
/// `observe_resize`/`unobserve_resize` bracket the engine lifecycle: called
/// exactly once per attach and once per detach, so implementations can
/// register host resize listeners without double-registration.
pub trait Surface {
    /// Current logical size and device pixel ratio.
    fn viewport(&self) -> GlyphResult<Viewport>;

    /// Register interest in size changes.
    fn observe_resize(&mut self);

    /// Deregister interest in size changes.
    fn unobserve_resize(&mut self);

    /// Clear the surface and paint one complete frame.
    fn present(&mut self, frame: &DisplayList) -> GlyphResult<()>;
}

/// Surface that records presented display lists instead of rasterizing.
///
/// The test double for engine and composition tests, and a building block
/// for headless hosts that want the command stream. Failure injection
/// covers the attach, resize-observation, and paint fault paths.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    viewport: Option<Viewport>,
    resize_observers: u32,
    frames: Vec<DisplayList>,
    fail_next_viewport: Cell<bool>,
    fail_next_present: bool,
}

impl RecordingSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Some(viewport),
            ..Self::default()
        }
    }

    /// A surface that can never be acquired; attach must fail on it.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Simulate a host resize. The engine picks it up on its next frame.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    /// Make the next viewport probe fail once.
    pub fn fail_next_viewport(&mut self) {
        self.fail_next_viewport.set(true);
    }

    /// Make the next present call fail once.
    pub fn fail_next_present(&mut self) {
        self.fail_next_present = true;
    }

    /// Frames presented so far, oldest first.
    pub fn frames(&self) -> &[DisplayList] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&DisplayList> {
        self.frames.last()
    }

    /// Currently registered resize listeners. 1 while attached, 0 after
    /// detach; anything else is a lifecycle bug.
    pub fn resize_observers(&self) -> u32 {
        self.resize_observers
    }
}

impl Surface for RecordingSurface {
    fn viewport(&self) -> GlyphResult<Viewport> {
        if self.fail_next_viewport.take() {
            return Err(GlyphError::surface("viewport probe failed"));
        }
        self.viewport
            .ok_or_else(|| GlyphError::surface_unavailable("no drawing context"))
    }

    fn observe_resize(&mut self) {
        self.resize_observers += 1;
    }

    fn unobserve_resize(&mut self) {
        self.resize_observers = self.resize_observers.saturating_sub(1);
    }

    fn present(&mut self, frame: &DisplayList) -> GlyphResult<()> {
        if self.fail_next_present {
            self.fail_next_present = false;
            return Err(GlyphError::surface("present failed"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{DisplayList, Layer, LayerBlend, LayerKind};

    fn empty_idle_list() -> DisplayList {
        DisplayList {
            layers: vec![Layer {
                kind: LayerKind::Idle,
                blend: LayerBlend::Over,
                ops: vec![],
            }],
        }
    }

    #[test]
    fn records_presented_frames_in_order() {
        let mut surface = RecordingSurface::new(Viewport::with_unit_scale(100.0, 100.0).unwrap());
        surface.present(&DisplayList::default()).unwrap();
        surface.present(&empty_idle_list()).unwrap();
        assert_eq!(surface.frames().len(), 2);
        assert_eq!(
            surface.last_frame().unwrap().kinds(),
            vec![LayerKind::Idle]
        );
    }

    #[test]
    fn unavailable_surface_reports_fatal_error() {
        let surface = RecordingSurface::unavailable();
        assert!(matches!(
            surface.viewport(),
            Err(GlyphError::SurfaceUnavailable(_))
        ));
    }

    #[test]
    fn viewport_fault_is_transient() {
        let mut surface = RecordingSurface::new(Viewport::with_unit_scale(100.0, 100.0).unwrap());
        surface.fail_next_viewport();
        assert!(matches!(surface.viewport(), Err(GlyphError::Surface(_))));
        assert!(surface.viewport().is_ok());
    }
}
