//! Client library for the Agent Platform marketplace.
//!
//! Exposes a typed REST client (`api`), the authentication and session
//! lifecycle (`auth`), wire models (`models`), and configuration
//! (`config`). The `agentdeck` binary is a thin CLI over these modules.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
