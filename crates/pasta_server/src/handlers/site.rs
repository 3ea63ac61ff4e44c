//! Static site endpoints.

use crate::{request_info, AppState};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
};

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

/// Usage text with a curl example pointing at this server.
pub async fn usage(State(state): State<AppState>, headers: HeaderMap) -> String {
    let base = request_info::base_url(&state.config, &headers);
    format!(
        "Pasta: a minimal paste service.\n\n\
         Create:  curl --data-binary \"@file.txt\" {base}\n\
         Upload:  curl -F \"file=@image.png\" {base}\n\
         Read:    curl {base}/data/<id>\n"
    )
}

/// Keep crawlers away from paste URLs.
pub async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT,
    )
}
