use crate::compose::compose_frame;
use crate::core::{Viewport, VirtualClock};
use crate::error::{GlyphError, GlyphResult};
use crate::settings::RenderSettings;
use crate::signature::Signature;
use crate::surface::Surface;

pub use crate::compose::RenderState;

/// Ticket identifying one scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Host hook for display-refresh callbacks.
///
/// The engine requests exactly one callback at a time and cancels the
/// pending one on detach; hosts map this onto their event loop the way a
/// requestAnimationFrame/cancelAnimationFrame pair works.
pub trait FrameScheduler {
    /// Ask for one callback at the next display refresh.
    fn request_frame(&mut self) -> FrameRequest;

    /// Cancel a previously requested callback before it fires.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Scheduler whose callbacks fire when the caller says so.
///
/// Deterministic driver for tests and offline rendering: `take_due` hands
/// out the pending ticket, after which the caller delivers the frame via
/// [`GlyphEngine::frame`].
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    due: Vec<FrameRequest>,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested callbacks that have not fired or been cancelled.
    pub fn pending(&self) -> usize {
        self.due.len()
    }

    /// Total callbacks cancelled over the scheduler's lifetime.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Pop the oldest due callback, if any.
    pub fn take_due(&mut self) -> Option<FrameRequest> {
        if self.due.is_empty() {
            None
        } else {
            Some(self.due.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.due.push(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if let Some(pos) = self.due.iter().position(|r| *r == request) {
            self.due.remove(pos);
            self.cancelled += 1;
        }
    }
}

/// The render state machine and animation loop owner.
///
/// Single-owner lifecycle: `attach` acquires the surface, registers resize
/// observation, and schedules the first frame; `detach` cancels the pending
/// callback synchronously and deregisters, leaving nothing behind. Between
/// those, the host delivers each scheduled callback through [`frame`],
/// and caller inputs (`update_signature`, `set_processing`,
/// `update_settings`) take effect on the very next frame.
///
/// [`frame`]: GlyphEngine::frame
pub struct GlyphEngine<S: Surface, F: FrameScheduler> {
    surface: S,
    scheduler: F,
    settings: RenderSettings,
    clock: VirtualClock,
    viewport: Viewport,
    signature: Option<Signature>,
    processing: bool,
    pending: Option<FrameRequest>,
    frames_painted: u64,
}

impl<S: Surface, F: FrameScheduler> GlyphEngine<S, F> {
    /// Attach to a drawable surface and schedule the first frame.
    ///
    /// Fatal if the surface cannot be acquired: the error is
    /// `SurfaceUnavailable` and no resources are left registered. The
    /// virtual clock starts at zero on every attach.
    #[tracing::instrument(skip(surface, scheduler, settings))]
    pub fn attach(mut surface: S, mut scheduler: F, settings: RenderSettings) -> GlyphResult<Self> {
        let viewport = surface.viewport().map_err(|err| match err {
            fatal @ GlyphError::SurfaceUnavailable(_) => fatal,
            other => GlyphError::surface_unavailable(other.to_string()),
        })?;
        surface.observe_resize();
        let pending = Some(scheduler.request_frame());
        tracing::debug!(?viewport, "engine attached");

        Ok(Self {
            surface,
            scheduler,
            settings: settings.clamped(),
            clock: VirtualClock::new(),
            viewport,
            signature: None,
            processing: false,
            pending,
            frames_painted: 0,
        })
    }

    /// Replace the signature wholesale.
    ///
    /// `Some` completes a processing cycle and moves to `Active`; `None` is
    /// a caller-initiated reset to `Idle` (distinct from a processing
    /// cycle ending, which always returns to the previous signature).
    pub fn update_signature(&mut self, signature: Option<Signature>) {
        self.signature = signature.map(Signature::clamped);
        if self.signature.is_some() {
            self.processing = false;
        }
        tracing::debug!(state = ?self.state_name(), "signature updated");
    }

    /// Flag that an analysis request is in flight.
    ///
    /// Clearing the flag returns to `Active` with the previous signature
    /// when one exists; `Idle` is reachable only before any input.
    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
        tracing::debug!(state = ?self.state_name(), "processing flag updated");
    }

    /// Replace the render settings; normalized on entry.
    pub fn update_settings(&mut self, settings: RenderSettings) {
        self.settings = settings.clamped();
    }

    /// The state the next frame will paint. Exactly one at any instant.
    pub fn state(&self) -> RenderState {
        if self.processing {
            RenderState::Processing
        } else if let Some(signature) = self.signature {
            RenderState::Active(signature)
        } else {
            RenderState::Idle
        }
    }

    fn state_name(&self) -> &'static str {
        match self.state() {
            RenderState::Idle => "idle",
            RenderState::Processing => "processing",
            RenderState::Active(_) => "active",
        }
    }

    /// Deliver one scheduled frame callback: advance the clock, pick up
    /// any resize, compose, and present.
    ///
    /// A tick with no pending request is a stale callback and paints
    /// nothing. A present failure propagates and leaves the engine
    /// quiescent (no re-request) until the host reacts.
    pub fn frame(&mut self, dt: f64) -> GlyphResult<()> {
        if self.pending.take().is_none() {
            return Ok(());
        }

        self.clock.advance(dt);
        self.poll_viewport();

        let list = compose_frame(
            &self.state(),
            self.clock.seconds(),
            &self.settings,
            self.viewport,
        );
        self.surface.present(&list)?;
        self.frames_painted += 1;
        self.pending = Some(self.scheduler.request_frame());
        Ok(())
    }

    /// Re-derive dimensions on surface change; keep the last known
    /// viewport when the probe fails, so the loop is never interrupted.
    fn poll_viewport(&mut self) {
        match self.surface.viewport() {
            Ok(viewport) if viewport != self.viewport => {
                tracing::debug!(from = ?self.viewport, to = ?viewport, "viewport changed");
                self.viewport = viewport;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "viewport probe failed; keeping last known size");
            }
        }
    }

    /// Viewport the next frame will paint into.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Virtual time in seconds. Survives state changes and resizes.
    pub fn elapsed(&self) -> f64 {
        self.clock.seconds()
    }

    pub fn frames_painted(&self) -> u64 {
        self.frames_painted
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    /// Tear down: synchronously cancel the pending callback and deregister
    /// resize observation, then hand the surface and scheduler back so the
    /// host can re-attach.
    pub fn detach(mut self) -> (S, F) {
        if let Some(request) = self.pending.take() {
            self.scheduler.cancel_frame(request);
        }
        self.surface.unobserve_resize();
        tracing::debug!(frames = self.frames_painted, "engine detached");
        (self.surface, self.scheduler)
    }
}
