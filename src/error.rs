//! Crate-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("point cloud has fewer than {required} valid points ({got} received)")]
    SparsePointCloud { required: usize, got: usize },

    #[error("no feasible path: every sampled candidate is blocked")]
    NoFeasiblePath,

    #[error("transform to world frame unavailable for sensor frame '{frame_id}'")]
    TransformUnavailable { frame_id: String },

    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("internal channel closed: {0}")]
    ChannelClosed(&'static str),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
