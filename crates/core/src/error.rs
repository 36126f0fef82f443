/// Result alias that carries the custom [`GeoAnimError`] type.
pub type Result<T> = std::result::Result<T, GeoAnimError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum GeoAnimError {
    /// Invalid scene, part or element configuration. Raised while a scene is
    /// being assembled or cued, before any frame is dispatched.
    #[error("configuration error: {0}")]
    Config(String),
    /// Geometric construction that cannot be satisfied, such as an angle
    /// between segments that never meet.
    #[error("geometry error: {0}")]
    Geometry(String),
    /// Effect name that the element's shape does not know about.
    #[error("unknown effect `{effect}` for {shape}")]
    UnknownEffect { effect: String, shape: &'static str },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed scene description or frame log.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl GeoAnimError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn geometry<T: Into<String>>(msg: T) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn unknown_effect<T: Into<String>>(effect: T, shape: &'static str) -> Self {
        Self::UnknownEffect {
            effect: effect.into(),
            shape,
        }
    }
}

impl From<&str> for GeoAnimError {
    fn from(value: &str) -> Self {
        Self::config(value)
    }
}

impl From<String> for GeoAnimError {
    fn from(value: String) -> Self {
        Self::Config(value)
    }
}
