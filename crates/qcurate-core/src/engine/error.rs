use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Component '{component}' is not available: {reason}")]
    Unavailable { component: String, reason: String },

    #[error("Invalid settings for component '{component}': {reason}")]
    InvalidSettings { component: String, reason: String },

    #[error("Failed to build the worker thread pool: {0}")]
    ThreadPool(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn invalid_settings(component: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            component: component.to_string(),
            reason: reason.into(),
        }
    }
}
