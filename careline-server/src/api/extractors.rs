//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `SignedBody<T>` — verifies the `Careline-Signature` header against a signed
//!   JSON body (used by the Service API POST endpoints).
//! - `VerifiedUrl` — verifies the `Careline-Signature` header against a signed URL
//!   carried in the `Careline-Signed-Url` header (used by the actor live-channel
//!   API and the Service API GET endpoints).
//! - `AdminAuth` — verifies the `Careline-Admin-Authorization` header against the
//!   argon2-hashed admin secret.
//!
//! All cryptographic operations are delegated to [`careline_sdk::signature`].

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use careline_sdk::signature::{
    self, ADMIN_AUTH_HEADER, SIGNATURE_HEADER, SIGNED_URL_HEADER, Signature, SignatureError,
    SignedObject,
};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// SignedBody — Service API authentication via signed JSON body
// ---------------------------------------------------------------------------

/// An Axum extractor that verifies the `Careline-Signature` header and
/// deserializes + authenticates the JSON request body.
///
/// # Header format
///
/// ```text
/// Careline-Signature: {unix_timestamp}.{base64_signature}
/// ```
///
/// The signature is computed as `HMAC-SHA256("{timestamp}.{json_body}", service_secret)`.
pub struct SignedBody<T: Signature>(pub T);

/// Errors that can occur during signed-body verification.
#[derive(Debug, thiserror::Error)]
pub enum SignedBodyError {
    #[error("missing Careline-Signature header")]
    MissingHeader,
    #[error("invalid Careline-Signature header format")]
    InvalidHeader,
    #[error("invalid signature encoding")]
    InvalidBase64,
    #[error("failed to read request body")]
    BodyReadError,
    #[error("invalid JSON body: {0}")]
    JsonError(serde_json::Error),
    #[error("signature verification failed")]
    VerificationFailed,
}

impl From<SignatureError> for SignedBodyError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat => Self::InvalidHeader,
            SignatureError::InvalidBase64 => Self::InvalidBase64,
            SignatureError::Json(e) => Self::JsonError(e),
            SignatureError::SignatureMismatch | SignatureError::Expired => Self::VerificationFailed,
        }
    }
}

impl IntoResponse for SignedBodyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SignedBodyError::MissingHeader => {
                (StatusCode::UNAUTHORIZED, "missing Careline-Signature header")
            }
            SignedBodyError::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                "invalid Careline-Signature header format",
            ),
            SignedBodyError::InvalidBase64 => {
                (StatusCode::BAD_REQUEST, "invalid signature encoding")
            }
            SignedBodyError::BodyReadError => {
                (StatusCode::BAD_REQUEST, "failed to read request body")
            }
            SignedBodyError::JsonError(_) => (StatusCode::BAD_REQUEST, "invalid JSON body"),
            SignedBodyError::VerificationFailed => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
        };
        (status, message).into_response()
    }
}

impl<T: Signature + Send> FromRequest<AppState> for SignedBody<T> {
    type Rejection = SignedBodyError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = req
            .headers()
            .get(SIGNATURE_HEADER)
            .ok_or(SignedBodyError::MissingHeader)?
            .to_str()
            .map_err(|_| SignedBodyError::InvalidHeader)?
            .to_owned();

        let body_bytes = axum::body::to_bytes(req.into_body(), 1024 * 1024)
            .await
            .map_err(|_| SignedBodyError::BodyReadError)?;

        let json =
            String::from_utf8(body_bytes.to_vec()).map_err(|_| SignedBodyError::BodyReadError)?;

        let signed = SignedObject::<T>::from_header_and_body(&header_value, json)?;

        let service = state.config.service.read().await;
        let verified_body = signed.verify(service.secret_bytes())?;
        drop(service);

        Ok(SignedBody(verified_body))
    }
}

// ---------------------------------------------------------------------------
// VerifiedUrl — signed-URL authentication for GETs and websocket upgrades
// ---------------------------------------------------------------------------

/// An Axum extractor that verifies the `Careline-Signature` header against
/// a signed URL from the `Careline-Signed-Url` header.
///
/// # Header format
///
/// ```text
/// Careline-Signature:  {unix_timestamp}.{base64_signature}
/// Careline-Signed-Url: https://careline.example.com/api/v1/actors/.../ws
/// ```
///
/// The signature is computed as
/// `HMAC-SHA256("{full_url}.{timestamp}", service_secret)`.
///
/// Implements `FromRequestParts` so it can be combined with `Path<T>`,
/// `WebSocketUpgrade`, etc.
pub struct VerifiedUrl;

/// Errors returned by the [`VerifiedUrl`] extractor.
#[derive(Debug)]
pub enum VerifiedUrlError {
    MissingSignature,
    MissingUrl,
    InvalidHeader,
    InvalidBase64,
    SignatureMismatch,
    TimestampTooOld,
}

impl From<SignatureError> for VerifiedUrlError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat => Self::InvalidHeader,
            SignatureError::InvalidBase64 => Self::InvalidBase64,
            SignatureError::Json(_) => Self::InvalidHeader,
            SignatureError::SignatureMismatch => Self::SignatureMismatch,
            SignatureError::Expired => Self::TimestampTooOld,
        }
    }
}

impl IntoResponse for VerifiedUrlError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            VerifiedUrlError::MissingSignature => {
                (StatusCode::UNAUTHORIZED, "missing Careline-Signature header")
            }
            VerifiedUrlError::MissingUrl => {
                (StatusCode::BAD_REQUEST, "missing Careline-Signed-Url header")
            }
            VerifiedUrlError::InvalidHeader => (StatusCode::BAD_REQUEST, "invalid header format"),
            VerifiedUrlError::InvalidBase64 => {
                (StatusCode::BAD_REQUEST, "invalid signature encoding")
            }
            VerifiedUrlError::SignatureMismatch => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
            VerifiedUrlError::TimestampTooOld => (StatusCode::UNAUTHORIZED, "signature expired"),
        };
        (status, message).into_response()
    }
}

impl FromRequestParts<AppState> for VerifiedUrl {
    type Rejection = VerifiedUrlError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let sig_value = parts
            .headers
            .get(SIGNATURE_HEADER)
            .ok_or(VerifiedUrlError::MissingSignature)?
            .to_str()
            .map_err(|_| VerifiedUrlError::InvalidHeader)?;

        let (timestamp, signature_bytes) = signature::parse_signature_header(sig_value)?;

        let signed_url = parts
            .headers
            .get(SIGNED_URL_HEADER)
            .ok_or(VerifiedUrlError::MissingUrl)?
            .to_str()
            .map_err(|_| VerifiedUrlError::InvalidHeader)?;

        let service = state.config.service.read().await;
        signature::verify_url(signed_url, timestamp, &signature_bytes, service.secret_bytes())?;
        drop(service);

        // The signed URL must target the path actually being requested.
        let parsed_url =
            url::Url::parse(signed_url).map_err(|_| VerifiedUrlError::InvalidHeader)?;
        if parsed_url.path() != parts.uri.path() {
            return Err(VerifiedUrlError::SignatureMismatch);
        }

        Ok(VerifiedUrl)
    }
}

// ---------------------------------------------------------------------------
// AdminAuth — Admin API authentication via hashed secret
// ---------------------------------------------------------------------------

/// An Axum extractor that verifies the `Careline-Admin-Authorization`
/// header against the argon2-hashed admin secret.
pub struct AdminAuth;

/// Errors returned by the [`AdminAuth`] extractor.
#[derive(Debug)]
pub enum AdminAuthError {
    MissingHeader,
    InvalidHeader,
    VerificationFailed,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminAuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "missing Careline-Admin-Authorization header",
            ),
            AdminAuthError::InvalidHeader => (StatusCode::BAD_REQUEST, "invalid header format"),
            AdminAuthError::VerificationFailed => {
                (StatusCode::UNAUTHORIZED, "admin authentication failed")
            }
        };
        (status, message).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidHeader)?;

        let admin = state.config.admin.read().await;
        if !admin.verify_secret(provided) {
            return Err(AdminAuthError::VerificationFailed);
        }
        drop(admin);

        Ok(AdminAuth)
    }
}
