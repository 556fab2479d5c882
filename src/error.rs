use thiserror::Error;

/// Top-level error type for the massing simplification engine.
#[derive(Debug, Error)]
pub enum MassingError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Layering(#[from] LayeringError),

    #[error(transparent)]
    Simplification(#[from] SimplificationError),

    #[error("failed to write statistics: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to geometric computations and strategy results.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid strategy parameters: {0}")]
    InvalidParameters(String),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("contour is self-intersecting")]
    SelfIntersecting,
}

/// Errors raised while decomposing a slice stack into layers.
#[derive(Debug, Error)]
pub enum LayeringError {
    #[error("malformed component {component} in slice {slice}: {reason}")]
    MalformedComponent {
        slice: usize,
        component: usize,
        reason: String,
    },

    #[error("layer not found in building tree")]
    LayerNotFound,
}

/// Errors raised by the arbitration of simplification strategies.
#[derive(Debug, Error)]
pub enum SimplificationError {
    #[error("no strategy produced a valid result for contour {contour} of layer at height {layer_bottom}")]
    Exhausted { layer_bottom: usize, contour: usize },

    #[error("no contour of the layer could be simplified")]
    NoContours,

    #[error("building simplification exceeded its deadline")]
    TimedOut,
}

/// Convenience type alias for results using [`MassingError`].
pub type Result<T> = std::result::Result<T, MassingError>;
