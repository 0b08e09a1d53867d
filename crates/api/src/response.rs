//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Operations that start
//! a background propagation also return the ticket next to the data.

use serde::Serialize;

use crate::documents::propagation::PropagationTicket;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": T, "propagation": ticket }` for archive, restore, and publish.
#[derive(Debug, Serialize)]
pub struct PropagatedResponse<T: Serialize> {
    pub data: T,
    pub propagation: PropagationTicket,
}
