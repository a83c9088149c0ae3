use thiserror::Error;

/// Rejected construction parameters of the sampling-based planners.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlannerError {
    #[error("workspace must have a positive, finite size, got {width}x{height}")]
    InvalidWorkspace { width: f64, height: f64 },
    #[error("step size must be positive and finite, got {0}")]
    InvalidStepSize(f64),
    #[error("goal sample rate must lie in [0, 1], got {0}")]
    InvalidGoalSampleRate(f64),
    #[error("neighbor radius must be non-negative and finite, got {0}")]
    InvalidNeighborRadius(f64),
}
