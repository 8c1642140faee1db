//! In-memory implementation of the verification API contract for local runs and tests.
//!
//! Nothing is persisted, every request authenticates with [`STUB_TOKEN`], and the store
//! starts with a few regions, one landlord and three tenants.

mod infra;
mod routes;
pub mod server;

pub use infra::{AppState, StubStore, STUB_LANDLORD_ID, STUB_TOKEN};
pub use routes::{stub_router, StubError};
