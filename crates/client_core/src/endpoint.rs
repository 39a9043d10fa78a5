use shared::domain::ClientId;
use url::Url;

use crate::error::EndpointError;

pub const DEFAULT_ENDPOINT_BASE: &str = "ws://localhost:8000/ws";

/// Appends the client id as the last path segment of `base`, rewriting
/// http(s) bases to their WebSocket schemes.
pub fn chat_endpoint(base: &str, client_id: &ClientId) -> Result<Url, EndpointError> {
    let base = base.trim();
    let mut url = Url::parse(base).map_err(|source| EndpointError::InvalidBase {
        base: base.to_string(),
        source,
    })?;

    let ws_scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => {
            return Err(EndpointError::UnsupportedScheme {
                scheme: other.to_string(),
            })
        }
    };
    if url.scheme() != ws_scheme {
        url.set_scheme(ws_scheme)
            .map_err(|()| EndpointError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            })?;
    }

    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| EndpointError::CannotBeABase {
            base: base.to_string(),
        })?
        .pop_if_empty()
        .push(client_id.as_str());

    Ok(url)
}
