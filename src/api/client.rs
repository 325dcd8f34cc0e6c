//! API client for communicating with the Agent Platform REST backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests to the auth, agent, marketplace, and gamification endpoints.
//!
//! Authentication uses a JWT bearer token obtained from `/auth/login`;
//! the token is attached to every request when set, and no request waits
//! for one to exist.

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    Achievement, Agent, AgentRunResult, LeaderboardCategory, LeaderboardEntry, Listing,
    NewAgent, NewListing, OrderReceipt, ProfileUpdate, User, UserStats,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default backend base URL for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
/// Matches the 10s timeout the platform's other clients use.
const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Auth wire types
// ============================================================================

/// Response to POST /auth/login.
///
/// `access_token` is absent when the account has 2FA enabled and the
/// request carried no TOTP code; `requires2FA` flags that branch.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(rename = "requires2FA", default)]
    pub requires_two_factor: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    totp_code: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    secret: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Some endpoints return the user bare, others wrapped in `{"user": ...}`.
fn parse_user(text: &str) -> Result<User> {
    #[derive(Deserialize)]
    struct Wrapper {
        user: User,
    }
    if let Ok(wrapper) = serde_json::from_str::<Wrapper>(text) {
        return Ok(wrapper.user);
    }
    serde_json::from_str::<User>(text).context("Failed to parse user response")
}

/// API client for the Agent Platform.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Drop the bearer token; subsequent requests go out unauthenticated
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning a normalized error if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// POST where the caller only cares about success, not the body.
    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Auth endpoints =====

    /// Authenticate with email and password.
    ///
    /// `totp_code` is required on the second leg of a 2FA-gated sign-in;
    /// the first leg sends `None` and the server answers with
    /// `requires2FA` instead of a token.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        totp_code: Option<&str>,
    ) -> Result<LoginResponse> {
        debug!(email, has_totp = totp_code.is_some(), "Sending login request");
        let body = LoginRequest {
            email,
            password,
            totp_code,
        };
        self.post("/auth/login", &body).await
    }

    /// Register a new account. Does not authenticate.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let url = self.url("/auth/register");
        let body = RegisterRequest {
            username,
            email,
            password,
        };
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await
            .context("Failed to send registration request")?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read registration response")?;
        parse_user(&text)
    }

    /// Invalidate the current session server-side
    pub async fn logout(&self) -> Result<()> {
        self.post_unit("/auth/logout", &serde_json::json!({})).await
    }

    /// Fetch the identity behind the current bearer token
    pub async fn fetch_session(&self) -> Result<User> {
        let url = self.url("/auth/session");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .context("Failed to send session request")?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read session response")?;
        parse_user(&text)
    }

    /// Request a password reset email. Returns the confirmation message.
    pub async fn reset_password(&self, email: &str) -> Result<String> {
        let url = self.url("/auth/reset-password");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .context("Failed to send password reset request")?;

        let response = Self::check_response(response).await?;
        let message = response
            .json::<MessageResponse>()
            .await
            .ok()
            .and_then(|m| m.message)
            .unwrap_or_else(|| "Password reset email sent".to_string());
        Ok(message)
    }

    /// Generate a fresh TOTP enrollment secret for the current user
    pub async fn generate_2fa_secret(&self) -> Result<String> {
        let response: SecretResponse = self.get("/auth/2fa/secret").await?;
        Ok(response.secret)
    }

    /// Verify a TOTP code against an enrollment secret and enable 2FA
    pub async fn enable_2fa(&self, code: &str, secret: &str) -> Result<()> {
        let body = serde_json::json!({ "code": code, "totp_secret": secret });
        self.post_unit("/auth/2fa/enable", &body).await
    }

    // ===== Agent endpoints =====

    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.get("/agents").await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.get(&format!("/agents/{}", agent_id)).await
    }

    pub async fn create_agent(&self, agent: &NewAgent) -> Result<Agent> {
        self.post("/agents", agent).await
    }

    /// Send a message to an agent and return its reply
    pub async fn run_agent(&self, agent_id: &str, message: &str) -> Result<AgentRunResult> {
        let body = serde_json::json!({ "message": message });
        self.post(&format!("/agents/{}/run", agent_id), &body).await
    }

    // ===== Marketplace endpoints =====

    pub async fn list_listings(&self) -> Result<Vec<Listing>> {
        self.get("/marketplace").await
    }

    pub async fn create_listing(&self, listing: &NewListing) -> Result<Listing> {
        self.post("/marketplace", listing).await
    }

    pub async fn purchase_agent(&self, listing_id: &str) -> Result<OrderReceipt> {
        self.post(
            &format!("/marketplace/{}/purchase", listing_id),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn rent_agent(&self, listing_id: &str) -> Result<OrderReceipt> {
        self.post(
            &format!("/marketplace/{}/rent", listing_id),
            &serde_json::json!({}),
        )
        .await
    }

    // ===== Profile and gamification endpoints =====

    pub async fn fetch_profile(&self) -> Result<User> {
        self.get("/users/me").await
    }

    pub async fn update_profile(&self, updates: &ProfileUpdate) -> Result<User> {
        let url = self.url("/users/me");
        let response = self
            .client
            .patch(&url)
            .headers(self.auth_headers()?)
            .json(updates)
            .send()
            .await
            .context("Failed to send profile update")?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse updated profile")
    }

    pub async fn fetch_user_stats(&self) -> Result<UserStats> {
        self.get("/users/me/stats").await
    }

    pub async fn fetch_my_agents(&self) -> Result<Vec<Agent>> {
        self.get("/users/me/agents").await
    }

    pub async fn fetch_leaderboard(
        &self,
        category: LeaderboardCategory,
    ) -> Result<Vec<LeaderboardEntry>> {
        self.get(&format!("/leaderboard/{}", category.as_str()))
            .await
    }

    pub async fn fetch_achievements(&self) -> Result<Vec<Achievement>> {
        self.get("/achievements").await
    }

    /// Backend liveness probe
    pub async fn health_check(&self) -> Result<()> {
        let url = self.url("/health");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .context("Failed to send health check")?;
        Self::check_response(response).await?;
        Ok(())
    }
}
