//! Resoglyph is a parametric glyph rendering and animation engine.
//!
//! A bounded cognitive-emotional signature deterministically drives the
//! glyph's per-frame geometry, color, and motion inside a perpetual
//! animation loop. The public API is engine-oriented:
//!
//! - Build a [`Signature`] (or decode an [`AnalysisPayload`])
//! - Attach a [`GlyphEngine`] to a [`Surface`] and a [`FrameScheduler`]
//! - Deliver frame callbacks; each one composes and presents a [`DisplayList`]
#![forbid(unsafe_code)]

pub mod compose;
pub mod core;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod raster;
pub mod settings;
pub mod signature;
pub mod surface;

pub use crate::compose::{
    DisplayList, DrawOp, Layer, LayerBlend, LayerKind, RenderState, compose_frame,
};
pub use crate::core::{
    Affine, BezPath, Circle, Hsla, Point, Rect, Rgba8, Vec2, Viewport, VirtualClock,
};
pub use crate::engine::{FrameRequest, FrameScheduler, GlyphEngine, ManualScheduler};
pub use crate::error::{GlyphError, GlyphResult};
pub use crate::mapper::{DrawAttributes, map_attributes};
pub use crate::raster::{CpuRasterSurface, FrameRGBA};
pub use crate::settings::{ColorMode, RenderSettings};
pub use crate::signature::{AnalysisPayload, GlyphParams, Signature};
pub use crate::surface::{RecordingSurface, Surface};
