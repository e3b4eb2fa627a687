//! Messaging bridge between the page agent and the panel.

pub mod channel;
pub mod error;
pub mod message;

pub use channel::{Endpoint, Incoming, Responder, Sender, channel, channel_with_timeout};
pub use error::BridgeError;
pub use message::{AnalysisOutcome, BridgeMessage, Envelope, FillReport};
