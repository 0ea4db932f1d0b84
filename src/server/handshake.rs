//! WebSocket upgrade checks
//!
//! The client supplies its identity token as the `token` query parameter.
//! The token is opaque; only its percent-encoding is undone. An origin
//! allow-list, when configured, is matched against the `Origin` header.

use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request};
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::session::Identity;

/// What a successful upgrade tells us about the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeInfo {
    pub identity: Identity,
    pub origin: Option<String>,
}

/// Reasons to refuse an upgrade
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeRejection {
    #[error("missing identity token")]
    MissingToken,

    #[error("origin not allowed: {0}")]
    OriginNotAllowed(String),
}

impl HandshakeRejection {
    /// HTTP status sent back instead of `101 Switching Protocols`
    pub fn status(&self) -> StatusCode {
        match self {
            HandshakeRejection::MissingToken => StatusCode::UNAUTHORIZED,
            HandshakeRejection::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Build the HTTP error response
    pub fn into_response(self) -> ErrorResponse {
        let mut response = ErrorResponse::new(Some(self.to_string()));
        *response.status_mut() = self.status();
        response
    }
}

/// Validate an upgrade request
pub fn validate_upgrade(
    request: &Request,
    allowed_origins: &[String],
) -> Result<UpgradeInfo, HandshakeRejection> {
    let origin = request
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if !allowed_origins.is_empty() {
        let permitted = origin
            .as_deref()
            .map(|o| allowed_origins.iter().any(|allowed| allowed == o))
            .unwrap_or(false);
        if !permitted {
            return Err(HandshakeRejection::OriginNotAllowed(
                origin.unwrap_or_else(|| "<none>".into()),
            ));
        }
    }

    let token = request
        .uri()
        .query()
        .and_then(|query| query_param(query, "token"))
        .filter(|token| !token.is_empty())
        .ok_or(HandshakeRejection::MissingToken)?;

    Ok(UpgradeInfo {
        identity: Identity::new(token),
        origin,
    })
}

/// First value of `name` in a query string, percent-decoded
fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
