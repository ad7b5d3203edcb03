//! YouTube URL parsing and canonicalization

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Hosts served by the watch-page layout (`/watch?v=`, `/shorts/<id>`, ...)
const WATCH_HOSTS: [&str; 3] = ["youtube.com", "m.youtube.com", "music.youtube.com"];

/// Short-link host where the id is the first path segment
const SHORT_HOST: &str = "youtu.be";

/// Path prefixes whose second segment is the video id
const ID_PATH_PREFIXES: [&str; 3] = ["shorts", "embed", "live"];

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static pattern compiles"))
}

/// Lowercased host with any leading `www.` removed
fn normalized_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    })
}

fn is_accepted_host(host: &str) -> bool {
    host == SHORT_HOST || WATCH_HOSTS.contains(&host)
}

/// Extract the 11-character video id from a YouTube URL.
///
/// Returns `None` for anything that does not parse, is not on a YouTube host,
/// or carries an id that fails the `[A-Za-z0-9_-]{11}` check.
pub fn extract_video_id(input: &str) -> Option<String> {
    let url = Url::parse(input.trim()).ok()?;
    let host = normalized_host(&url)?;

    let candidate = if host == SHORT_HOST {
        url.path().trim_matches('/').split('/').next().map(str::to_string)
    } else if WATCH_HOSTS.contains(&host.as_str()) {
        let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
        if url.path() == "/watch" {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        } else if segments.len() > 1 && ID_PATH_PREFIXES.contains(&segments[0]) {
            Some(segments[1].to_string())
        } else {
            None
        }
    } else {
        None
    };

    candidate.filter(|id| video_id_pattern().is_match(id))
}

/// True when the URL is http(s), on an accepted YouTube host, and resolves to a video id
pub fn is_valid_youtube_url(input: &str) -> bool {
    let url = match Url::parse(input.trim()) {
        Ok(url) => url,
        Err(_) => return false,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    match normalized_host(&url) {
        Some(host) if is_accepted_host(&host) => extract_video_id(input).is_some(),
        _ => false,
    }
}

/// Rewrite any accepted URL to `https://www.youtube.com/watch?v=<id>`.
///
/// When no id resolves the trimmed input comes back unchanged, so callers
/// still have to validate the result.
pub fn canonical_watch_url(input: &str) -> String {
    match extract_video_id(input) {
        Some(id) => format!("https://www.youtube.com/watch?v={}", id),
        None => input.trim().to_string(),
    }
}
