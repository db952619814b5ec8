use crate::core::domain::error::ValidationError;
use serde::{Deserialize, Serialize};

/// TCP port a node agent serves a category on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AgentPort(u16);

impl AgentPort {
    /// Port the node agents listen on unless configured otherwise.
    pub const DEFAULT: AgentPort = AgentPort(9999);

    /// Creates a new port without validation.
    pub(crate) fn new_unchecked(port: u16) -> Self {
        Self(port)
    }

    /// Creates a validated port.
    pub fn new(port: u16) -> Result<Self, ValidationError> {
        validate_port(port)?;
        Ok(Self(port))
    }

    /// Returns the port number.
    #[must_use]
    pub fn get(&self) -> u16 {
        self.0
    }
}

impl Default for AgentPort {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Validates a port number.
pub(crate) fn validate_port(port: u16) -> Result<(), ValidationError> {
    if port == 0 {
        return Err(ValidationError::Field {
            field: "port".to_string(),
            message: "Port cannot be 0".to_string(),
        });
    }
    Ok(())
}
