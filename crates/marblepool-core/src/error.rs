//! Error types for level loading and physics setup.

/// Failure while reading or resolving stage data.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("Failed to parse stage data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown stage: '{0}'")]
    UnknownStage(String),

    #[error("Stage '{stage}' references missing mesh '{mesh}'")]
    MissingMesh { stage: String, mesh: String },

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// Failure while turning a mesh into a collider.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("Mesh '{0}' has no triangles")]
    EmptyMesh(String),

    #[error("Failed to build trimesh collider for '{mesh}': {reason}")]
    Trimesh { mesh: String, reason: String },
}
