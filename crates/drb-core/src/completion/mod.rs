//! Relay core: one user message in, one normalized completion result out.

pub mod client;
pub mod relay;
pub mod retry;
pub mod types;
pub mod wire;

pub use client::{CompletionTransport, UpstreamReply};
pub use relay::RelayCore;
pub use retry::RetryPolicy;
pub use types::{CompletionResult, ErrorKind};
