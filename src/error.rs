pub type GlyphResult<T> = Result<T, GlyphError>;

#[derive(thiserror::Error, Debug)]
pub enum GlyphError {
    /// The drawing surface could not be acquired at attach time. Fatal for
    /// that engine instance; the caller may retry by re-attaching.
    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// A transient surface fault (viewport probe, paint). Absorbed by the
    /// engine where the contract allows, propagated otherwise.
    #[error("surface error: {0}")]
    Surface(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlyphError {
    pub fn surface_unavailable(msg: impl Into<String>) -> Self {
        Self::SurfaceUnavailable(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
