//! REST API client module for the Agent Platform backend.
//!
//! This module provides the `ApiClient` for calling the auth, agent,
//! marketplace, and gamification endpoints.
//!
//! Every outgoing request carries the stored JWT bearer token when one
//! is set; failures are normalized into `ApiError` with a single
//! human-readable message at this boundary.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginResponse, DEFAULT_BASE_URL};
pub use error::ApiError;
