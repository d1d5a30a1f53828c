use flux_core::FluxError;

/// Topology validation errors raised by [`crate::builder::WorkflowBuilder::build`],
/// kept distinct from [`FluxError`] so this crate's own validation step has
/// a typed error the way every other crate boundary in this workspace does
/// — converted into `FluxError::InvalidTopology` at the `build()` boundary
/// so callers still only need to match one error type end to end.
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("workflow has no nodes")]
    EmptyWorkflow,

    #[error("node '{0}' subscribes to no topics")]
    NodeHasNoSubscriptions(String),
}

impl From<BuilderError> for FluxError {
    fn from(value: BuilderError) -> Self {
        FluxError::InvalidTopology(value.to_string())
    }
}
