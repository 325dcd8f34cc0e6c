//! Marketplace listing types (GET/POST /marketplace).
//!
//! Pricing, escrow, and payment rules live server-side; the client only
//! carries the listing shapes needed to browse and submit orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sale,
    Rent,
    Subscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    pub listing_type: ListingType,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub seller_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewListing {
    pub agent_id: String,
    pub listing_type: ListingType,
    pub price: f64,
}

/// Acknowledgement for purchase/rent orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderReceipt {
    #[serde(default, alias = "transaction_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
