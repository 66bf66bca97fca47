//! Ports layer: the inbound API and the outbound dependencies.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
