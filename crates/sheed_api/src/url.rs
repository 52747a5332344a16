use url::Url;

use crate::error::SheedApiError;

/// Default origin of the hosted watershed service.
pub const DEFAULT_ORIGIN: &str = "https://watershed.attack-kitten.com";
/// Path of the log channel endpoint.
pub const CHANNEL_PATH: &str = "/ws";
/// Path of the job submission endpoint.
pub const SUBMIT_PATH: &str = "/";

/// Parse an origin string into a root URL.
///
/// Rules:
/// 1) an empty input falls back to [`DEFAULT_ORIGIN`]
/// 2) only `http` and `https` origins are accepted
/// 3) path, query and fragment are dropped; both endpoints live at the host root
pub fn parse_origin(input: &str) -> Result<Url, SheedApiError> {
    let raw = if input.trim().is_empty() {
        DEFAULT_ORIGIN
    } else {
        input.trim()
    };

    let mut url =
        Url::parse(raw).map_err(|error| SheedApiError::InvalidOrigin(format!("{raw}: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SheedApiError::UnsupportedScheme(url.scheme().to_owned()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(SheedApiError::InvalidOrigin(format!("{raw}: missing host")));
    }

    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Derive the channel URL from the origin's transport security.
///
/// `https` pages talk `wss`, plain `http` pages talk `ws`; host and port are
/// kept verbatim.
pub fn websocket_url(origin: &Url) -> Result<Url, SheedApiError> {
    let scheme = match origin.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => return Err(SheedApiError::UnsupportedScheme(other.to_owned())),
    };

    let mut url = origin.clone();
    url.set_scheme(scheme)
        .map_err(|()| SheedApiError::InvalidOrigin(format!("cannot use {scheme} for {origin}")))?;
    url.set_path(CHANNEL_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Submission endpoint on the origin.
pub fn submit_url(origin: &Url) -> Url {
    let mut url = origin.clone();
    url.set_path(SUBMIT_PATH);
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Resolve an artifact path returned by the server against the origin.
pub fn artifact_url(origin: &Url, relative: &str) -> Result<Url, SheedApiError> {
    let relative = relative.trim();
    if relative.is_empty() {
        return Err(SheedApiError::InvalidArtifactPath(relative.to_owned()));
    }
    origin
        .join(relative)
        .map_err(|error| SheedApiError::InvalidArtifactPath(format!("{relative}: {error}")))
}
