//! Common test utilities and helpers
//!
//! Shared mocks and fixtures for the integration tests.

pub mod mock_services;
pub mod test_fixtures;
