//! Router Module Index
//!
//! Routes are split by access level, and access control is applied per module
//! through Axum layers in `create_router`, so an endpoint's protection follows
//! from the file it is declared in.

/// Routes open to any client: health probe, login, and the front-end reads.
/// Front-end content reads must only ever return PUBLISH rows.
pub mod public;

/// Routes for the admin panel. Mounted under `/api/admin` behind the Auth Gate.
pub mod admin;
