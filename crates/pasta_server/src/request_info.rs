//! Per-request facts derived from headers and the peer address.

use crate::error::HttpError;
use crate::{Config, SECRET_HEADER};
use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";
const FORWARDED_PROTO: &str = "x-forwarded-proto";
const UNKNOWN_CLIENT: &str = "unknown";

/// Key identifying the requesting client for rate limiting.
///
/// # Arguments
/// - `config`: Decides whether `X-Forwarded-For` is trusted.
/// - `headers`: Request headers.
/// - `peer`: Socket peer address, when the server exposes it.
///
/// # Returns
/// The first forwarded address (when trusted), else the peer IP, else
/// `"unknown"`.
pub fn client_key(config: &Config, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if config.trust_forwarded_for {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Public base URL used in paste links.
///
/// Uses `BASE_URL` when configured, otherwise the request's `Host` header
/// (falling back to `localhost:{port}`) with `https` when
/// `X-Forwarded-Proto: https` is present.
pub fn base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(base) = config.base_url.as_deref() {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", config.port));
    let scheme = match headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
    {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };
    format!("{}://{}", scheme, host)
}

/// Check the shared-secret header that gates update and delete.
///
/// # Errors
/// [`HttpError::MutationsDisabled`] when no secret is configured,
/// [`HttpError::Unauthorized`] when the header is missing or differs.
pub fn authorize_mutation(config: &Config, headers: &HeaderMap) -> Result<(), HttpError> {
    let Some(expected) = config.shared_secret.as_deref() else {
        return Err(HttpError::MutationsDisabled);
    };
    match headers.get(&SECRET_HEADER).map(|value| value.as_bytes()) {
        Some(provided) if secrets_match(provided, expected.as_bytes()) => Ok(()),
        _ => Err(HttpError::Unauthorized),
    }
}

/// Compare SHA-256 digests of both values without early exit.
fn secrets_match(provided: &[u8], expected: &[u8]) -> bool {
    let provided = Sha256::digest(provided);
    let expected = Sha256::digest(expected);
    provided
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Whether the client asked for a JSON response.
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn client_key_uses_peer_ip_unless_forwarding_is_trusted() {
        let peer = Some(SocketAddr::from(([192, 0, 2, 10], 51000)));
        let forwarded = headers(&[("x-forwarded-for", "203.0.113.5, 10.0.0.1")]);

        let config = Config::default();
        assert_eq!(client_key(&config, &forwarded, peer), "192.0.2.10");
        assert_eq!(client_key(&config, &HeaderMap::new(), None), "unknown");

        let trusting = Config {
            trust_forwarded_for: true,
            ..Config::default()
        };
        assert_eq!(client_key(&trusting, &forwarded, peer), "203.0.113.5");
        assert_eq!(client_key(&trusting, &HeaderMap::new(), peer), "192.0.2.10");
    }

    #[test]
    fn base_url_prefers_configuration_then_host_header() {
        let configured = Config {
            base_url: Some("https://x.polarhive.net/".to_string()),
            ..Config::default()
        };
        assert_eq!(
            base_url(&configured, &headers(&[("host", "ignored:1")])),
            "https://x.polarhive.net"
        );

        let derived = Config::default();
        assert_eq!(
            base_url(&derived, &headers(&[("host", "paste.local:8080")])),
            "http://paste.local:8080"
        );
        assert_eq!(
            base_url(
                &derived,
                &headers(&[("host", "paste.example"), ("x-forwarded-proto", "HTTPS")])
            ),
            "https://paste.example"
        );
        assert_eq!(base_url(&derived, &HeaderMap::new()), "http://localhost:8080");
    }

    #[test]
    fn secret_comparison_rejects_prefixes_and_extensions() {
        assert!(secrets_match(b"s3cret", b"s3cret"));
        assert!(!secrets_match(b"s3cre", b"s3cret"));
        assert!(!secrets_match(b"s3cret!", b"s3cret"));
        assert!(!secrets_match(b"", b"s3cret"));
    }

    #[test]
    fn mutation_gate_requires_exact_secret() {
        let open = Config::default();
        assert!(matches!(
            authorize_mutation(&open, &headers(&[("x-pasta-secret", "anything")])),
            Err(HttpError::MutationsDisabled)
        ));

        let guarded = Config {
            shared_secret: Some("s3cret".to_string()),
            ..Config::default()
        };
        assert!(authorize_mutation(&guarded, &headers(&[("x-pasta-secret", "s3cret")])).is_ok());
        assert!(matches!(
            authorize_mutation(&guarded, &headers(&[("x-pasta-secret", "S3CRET")])),
            Err(HttpError::Unauthorized)
        ));
        assert!(matches!(
            authorize_mutation(&guarded, &HeaderMap::new()),
            Err(HttpError::Unauthorized)
        ));
    }
}
