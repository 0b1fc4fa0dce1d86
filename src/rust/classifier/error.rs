use std::fmt;

/// Represents the different types of errors that can occur in the classification pipeline.
///
/// Every variant is fatal for the current run. Nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    /// A required input artifact is absent or a configuration value is invalid
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// A loaded corpus failed its schema expectations
    #[error("Data shape error: {0}")]
    DataShapeError(String),
    /// The training partition is degenerate (single class or empty)
    #[error("Training error: {0}")]
    TrainingError(String),
    /// A model artifact is unreadable, corrupted or of an unknown version
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl ClassifierError {
    pub(crate) fn configuration(msg: impl fmt::Display) -> Self {
        Self::ConfigurationError(msg.to_string())
    }

    pub(crate) fn data_shape(msg: impl fmt::Display) -> Self {
        Self::DataShapeError(msg.to_string())
    }

    pub(crate) fn training(msg: impl fmt::Display) -> Self {
        Self::TrainingError(msg.to_string())
    }

    pub(crate) fn persistence(msg: impl fmt::Display) -> Self {
        Self::PersistenceError(msg.to_string())
    }
}
