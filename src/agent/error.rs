use std::fmt;

use crate::bridge::error::BridgeError;

#[derive(Debug)]
pub enum AgentError {
    /// Message could not cross the bridge, or its reply never came
    Bridge(BridgeError),

    /// A context task died before finishing
    Runtime(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Bridge(e) => write!(f, "Bridge error: {}", e),
            AgentError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Bridge(e) => Some(e),
            AgentError::Runtime(_) => None,
        }
    }
}

impl From<BridgeError> for AgentError {
    fn from(e: BridgeError) -> Self {
        AgentError::Bridge(e)
    }
}
