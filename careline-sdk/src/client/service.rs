//! Service API client (application backend → Careline server).
//!
//! All requests use body-signed HMAC-SHA256 authentication via
//! [`SignedObject`].

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::objects::{
    ChargeResponse, ChargeSession, CreateRequest, CreateWithdrawal, DepositFunds, RequestResponse,
    RespondToRequest, WalletResponse, WithdrawalResponse,
};
use crate::signature::{SIGNATURE_HEADER, SIGNED_URL_HEADER, Signature, SignedObject, sign_url};

/// Typed HTTP client for the Careline **Service API**.
///
/// The service API is called by the application backend (the layer that
/// owns profiles and auth) to drive the matching and settlement core.
/// Every request body is signed with
/// `HMAC-SHA256("{timestamp}.{json}", service_secret)`.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: Url,
    secret: Vec<u8>,
}

impl ServiceClient {
    /// Create a new `ServiceClient`.
    ///
    /// * `base_url` – root URL of the Careline server.
    /// * `service_secret` – the shared HMAC secret for body signing.
    pub fn new(base_url: Url, service_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            secret: service_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    async fn post_signed<B: Signature, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: B,
    ) -> Result<R, ClientError> {
        let signed = SignedObject::new(body, &self.secret).map_err(ClientError::Json)?;
        let url = self.base_url.join(path)?;

        let resp = self
            .http
            .post(url)
            .header(SIGNATURE_HEADER, signed.to_header())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(signed.json)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/service/requests` – create a connection request.
    pub async fn create_request(
        &self,
        payload: CreateRequest,
    ) -> Result<RequestResponse, ClientError> {
        self.post_signed("/api/v1/service/requests", payload).await
    }

    /// `POST /api/v1/service/requests/{id}/respond` – accept or reject.
    pub async fn respond_to_request(
        &self,
        request_id: Uuid,
        accept: bool,
    ) -> Result<RequestResponse, ClientError> {
        self.post_signed(
            &format!("/api/v1/service/requests/{request_id}/respond"),
            RespondToRequest { accept },
        )
        .await
    }

    /// `GET /api/v1/service/requests/{id}` – read the current snapshot of
    /// a request. Authenticated by signing the full request URL.
    pub async fn get_request(&self, request_id: Uuid) -> Result<RequestResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/service/requests/{request_id}"))?;

        let resp = self
            .http
            .get(url.clone())
            .header(SIGNATURE_HEADER, sign_url(url.as_str(), &self.secret))
            .header(SIGNED_URL_HEADER, url.as_str())
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/service/sessions/charge` – bill a completed session.
    pub async fn charge_session(
        &self,
        payload: ChargeSession,
    ) -> Result<ChargeResponse, ClientError> {
        self.post_signed("/api/v1/service/sessions/charge", payload)
            .await
    }

    /// `POST /api/v1/service/wallets/deposit` – record an external top-up.
    pub async fn deposit(&self, payload: DepositFunds) -> Result<WalletResponse, ClientError> {
        self.post_signed("/api/v1/service/wallets/deposit", payload)
            .await
    }

    /// `POST /api/v1/service/withdrawals` – place a withdrawal hold.
    pub async fn create_withdrawal(
        &self,
        payload: CreateWithdrawal,
    ) -> Result<WithdrawalResponse, ClientError> {
        self.post_signed("/api/v1/service/withdrawals", payload)
            .await
    }
}
