//! Admin API client (operations dashboard → Careline server).
//!
//! All requests carry the plaintext admin secret in the
//! `Careline-Admin-Authorization` header.

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::objects::admin::{MissedInteractionResponse, PenaltyResponse};
use crate::objects::{
    MovementResponse, RequestResponse, ResolveWithdrawal, WalletResponse, WithdrawalResponse,
};
use crate::signature::ADMIN_AUTH_HEADER;

/// Typed HTTP client for the Careline **Admin API**.
///
/// Authentication uses a plaintext secret sent in the
/// `Careline-Admin-Authorization` header, verified server-side against an
/// argon2-hashed value.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    admin_secret: String,
}

impl AdminClient {
    /// Create a new `AdminClient`.
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            admin_secret: admin_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/admin/withdrawals` – list pending withdrawal requests.
    pub async fn list_pending_withdrawals(&self) -> Result<Vec<WithdrawalResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/admin/withdrawals")?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/withdrawals/{id}/resolve` – approve or reject.
    pub async fn resolve_withdrawal(
        &self,
        withdrawal_id: i64,
        approve: bool,
    ) -> Result<WithdrawalResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/withdrawals/{withdrawal_id}/resolve"))?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&ResolveWithdrawal { approve })
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/wallets/{owner_id}` – show one wallet.
    pub async fn show_wallet(&self, owner_id: Uuid) -> Result<WalletResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/wallets/{owner_id}"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/wallets/{owner_id}/movements` – list the audit
    /// trail for one wallet.
    pub async fn list_movements(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<MovementResponse>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/wallets/{owner_id}/movements"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/wallets/{owner_id}/penalize` – deduct the
    /// configured penalty from a responder wallet.
    pub async fn apply_penalty(&self, responder_id: Uuid) -> Result<PenaltyResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/wallets/{responder_id}/penalize"))?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/responders/{responder_id}/missed` – list a
    /// responder's missed interactions.
    pub async fn list_missed(
        &self,
        responder_id: Uuid,
    ) -> Result<Vec<MissedInteractionResponse>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/responders/{responder_id}/missed"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/responders/{responder_id}/requests` – list a
    /// responder's connection requests.
    pub async fn list_requests(
        &self,
        responder_id: Uuid,
    ) -> Result<Vec<RequestResponse>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/responders/{responder_id}/requests"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }
}
