use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Destination list has no current target")]
    NoCurrentTarget,

    #[error("Destination list is empty")]
    EmptyDestinations,

    #[error("Unknown destination object: {id}")]
    UnknownObject { id: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot {op} while task is {state}")]
    InvalidTransition { op: &'static str, state: &'static str },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TaskError {
    /// Configuration problems are caught before a trial starts; everything
    /// else means the trial data can no longer be trusted.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TaskError::InvalidConfig(_)
                | TaskError::EmptyDestinations
                | TaskError::Serialization(_)
                | TaskError::Yaml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
