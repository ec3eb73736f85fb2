//! External integrations module.
//!
//! Provides the client for the PRIZMA backend REST API.

pub mod backend;

pub use backend::{BackendClient, INIT_DATA_HEADER};
