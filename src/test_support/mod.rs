//! Test utilities shared across crate-level unit tests.

pub mod fakes;
pub mod http;

pub use http::start_mock_server;
