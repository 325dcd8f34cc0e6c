//! Data models for Agent Platform resources.
//!
//! This module contains the wire-format structures exchanged with the
//! backend:
//!
//! - `User`, `UserStats`, `Achievement`: account and profile data
//! - `Agent`, `NewAgent`, `AgentRunResult`: agent catalog and execution
//! - `Listing`, `NewListing`, `OrderReceipt`: marketplace listings
//! - `LeaderboardCategory`, `LeaderboardEntry`: rankings

pub mod agent;
pub mod gamification;
pub mod marketplace;
pub mod user;

pub use agent::{Agent, AgentRunResult, NewAgent};
pub use gamification::{LeaderboardCategory, LeaderboardEntry};
pub use marketplace::{Listing, ListingType, NewListing, OrderReceipt};
pub use user::{Achievement, ProfileUpdate, User, UserStats};
