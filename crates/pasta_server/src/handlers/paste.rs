//! Paste HTTP handlers.

use crate::{error::HttpError, request_info, sniff::sniff, AppState};
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pasta_core::PasteRef;
use serde::Serialize;
use std::net::SocketAddr;

const FORM_FIELD: &str = "file";
const MISSING_FORM_FILE: &str = "Failed to get file from form";

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

fn too_large_or(status: StatusCode, state: &AppState, fallback: HttpError) -> HttpError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        HttpError::BodyTooLarge {
            limit: state.service.max_paste_bytes(),
        }
    } else {
        fallback
    }
}

/// Extract the paste bytes from a raw body or the multipart `file` field.
///
/// # Errors
/// [`HttpError::BodyTooLarge`] when the transport limit trips,
/// [`HttpError::MalformedForm`] when the multipart body has no readable
/// `file` field.
async fn read_payload(state: &AppState, request: Request<Body>) -> Result<Vec<u8>, HttpError> {
    if !is_multipart(request.headers()) {
        let body = Bytes::from_request(request, state).await.map_err(|rejection| {
            too_large_or(
                rejection.status(),
                state,
                HttpError::MalformedForm(rejection.body_text()),
            )
        })?;
        return Ok(body.to_vec());
    }

    let malformed = || HttpError::MalformedForm(MISSING_FORM_FILE.to_string());
    let mut form = Multipart::from_request(request, state)
        .await
        .map_err(|rejection| too_large_or(rejection.status(), state, malformed()))?;

    loop {
        let field = form
            .next_field()
            .await
            .map_err(|err| too_large_or(err.status(), state, malformed()))?;
        let Some(field) = field else {
            return Err(malformed());
        };
        if field.name() == Some(FORM_FIELD) {
            let content = field
                .bytes()
                .await
                .map_err(|err| too_large_or(err.status(), state, malformed()))?;
            return Ok(content.to_vec());
        }
    }
}

/// JSON body returned by create for clients accepting `application/json`.
#[derive(Debug, Serialize)]
struct CreatedPaste<'a> {
    #[serde(flatten)]
    paste: &'a PasteRef,
    url: String,
}

fn created_response(reference: &PasteRef, base: &str, json: bool) -> Response {
    let url = reference.url(base);
    if json {
        Json(CreatedPaste {
            paste: reference,
            url,
        })
        .into_response()
    } else {
        format!("{}\n", url).into_response()
    }
}

/// Create a new paste.
///
/// # Arguments
/// - `state`: Application state.
/// - `peer`: Peer address used as the rate-limit key.
/// - `request`: Raw or multipart body.
///
/// # Returns
/// The paste URL as text, or `{id, url, deduplicated}` JSON when the client
/// accepts `application/json`.
///
/// # Errors
/// Returns an error if validation, rate limiting, or persistence fails.
pub async fn create_paste(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
) -> Result<Response, HttpError> {
    let headers = request.headers().clone();
    let client = request_info::client_key(&state.config, &headers, peer.map(|info| info.0));
    let content = read_payload(&state, request).await?;

    let reference = state.service.create(&content, &client)?;
    let base = request_info::base_url(&state.config, &headers);
    Ok(created_response(
        &reference,
        &base,
        request_info::wants_json(&headers),
    ))
}

/// Serve a paste's raw bytes.
///
/// Text is served inline; recognised binary formats are sent as a download
/// named `paste{ext}`, other binary content keeps its sniffed type only.
///
/// # Errors
/// Returns an error if the paste does not exist or lookup fails.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let paste = state.service.read(&id)?;
    let sniffed = sniff(&paste.content);

    if sniffed.is_text {
        return Ok((
            [(header::CONTENT_TYPE, sniffed.content_type.to_string())],
            paste.content,
        )
            .into_response());
    }

    let content_type = (header::CONTENT_TYPE, sniffed.content_type.to_string());
    let response = match sniffed.extension {
        Some(extension) => (
            [
                content_type,
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=paste{}", extension),
                ),
            ],
            paste.content,
        )
            .into_response(),
        None => ([content_type], paste.content).into_response(),
    };
    Ok(response)
}

/// Replace a paste's content.
///
/// # Errors
/// Returns an error if the secret is wrong, the paste is missing or
/// content-addressed, or the new content is invalid.
pub async fn update_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Result<Response, HttpError> {
    let headers = request.headers().clone();
    request_info::authorize_mutation(&state.config, &headers)?;
    let content = read_payload(&state, request).await?;

    let reference = state.service.update(&id, &content)?;
    let base = request_info::base_url(&state.config, &headers);
    Ok(format!("Updated paste: {}\n", reference.url(&base)).into_response())
}

/// Delete a paste.
///
/// # Errors
/// Returns an error if the secret is wrong or the paste does not exist.
pub async fn delete_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    request_info::authorize_mutation(&state.config, &headers)?;
    state.service.delete(&id)?;
    Ok("Paste deleted successfully\n".into_response())
}
