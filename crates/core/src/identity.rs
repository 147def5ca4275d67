// ABOUTME: Derives canonical video ids and URLs from partial links and a profile identifier.
// ABOUTME: Source hrefs are never trusted verbatim; URLs are always rebuilt from the id.

/// Host used when none is configured.
pub const DEFAULT_DOMAIN: &str = "www.tiktok.com";

/// Canonical id and URL for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub url: String,
}

impl Identity {
    /// An empty id marks a record that cannot be extracted.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Builds the identity of a video from whatever link the source offered.
///
/// For video links the id is the segment after `/video/`, without any query
/// string, fragment or trailing slash. Any other link yields the text after its
/// last "/" (query and fragment dropped), so a link ending in "/" yields an
/// empty id. A bare id passes through unchanged.
pub fn build_identity(domain: &str, profile: &str, raw_link: &str) -> Identity {
    let id = video_id(raw_link);
    let url = if id.is_empty() {
        String::new()
    } else {
        video_url(domain, profile, &id)
    };
    Identity { id, url }
}

/// Extracts the video id segment of a link.
pub fn video_id(raw_link: &str) -> String {
    let link = raw_link.trim();
    if let Some((_, rest)) = link.split_once("/video/") {
        return rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .to_string();
    }
    let link = link.split(['?', '#']).next().unwrap_or_default();
    match link.rsplit_once('/') {
        Some((_, last)) => last.to_string(),
        None => link.to_string(),
    }
}

/// `https://<domain>/@<profile>/video/<id>`
pub fn video_url(domain: &str, profile: &str, id: &str) -> String {
    format!("{}/video/{}", profile_url(domain, profile), id)
}

/// `https://<domain>/@<profile>`
pub fn profile_url(domain: &str, profile: &str) -> String {
    format!("https://{}{}", domain.trim_end_matches('/'), profile_path(profile))
}

/// `/@<profile>`, the profile page path on any host.
pub fn profile_path(profile: &str) -> String {
    format!("/@{}", profile)
}
