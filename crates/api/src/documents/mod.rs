//! Document tree operations and descendant propagation.

pub mod propagation;
pub mod service;

pub use propagation::{PropagationStatus, PropagationTicket, PropagationTracker};
pub use service::{DocumentService, RemoveAck};
