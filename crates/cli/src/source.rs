// ABOUTME: Content sources for the CLI: HTTP page fetch, rendering-service snapshot, and local files.
// ABOUTME: Decodes response bodies using the Content-Type charset or byte-level detection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tokio::io::AsyncReadExt;
use url::Url;
use vidscout_core::{profile_path, ContentSource, PageContent};

/// Browser-like user agent; the profile page serves a stripped shell to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Maximum accepted body size (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching profile pages over HTTP.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Scheme and host profile pages live under, e.g. `https://www.tiktok.com`.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    /// Browserless-style service; `POST {render_url}/content` returns rendered HTML.
    pub render_url: Option<String>,
    pub render_token: Option<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        let headers = [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Cache-Control", "max-age=0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            base_url: format!("https://{}", vidscout_core::DEFAULT_DOMAIN),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers,
            render_url: None,
            render_token: None,
        }
    }
}

/// Fetches the served page and, when configured, a rendered snapshot.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
    render_url: Option<Url>,
    opts: SourceOptions,
}

impl HttpSource {
    pub fn new(opts: SourceOptions) -> Result<Self> {
        let base_url = parse_http_url(&opts.base_url).context("invalid base URL")?;
        let render_url = opts
            .render_url
            .as_deref()
            .map(|raw| parse_http_url(raw).context("invalid render URL"))
            .transpose()?;
        let client = reqwest::Client::builder()
            .timeout(opts.timeout)
            .user_agent(opts.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url,
            render_url,
            opts,
        })
    }

    /// `<base>/@<profile>`
    pub fn page_url(&self, profile: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            profile_path(profile)
        )
    }

    /// `<render>/content`, with the token as an encoded query parameter.
    fn render_endpoint(&self, render_url: &Url) -> Result<Url> {
        let mut endpoint = render_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| anyhow!("render URL cannot carry a path"))?
            .pop_if_empty()
            .push("content");
        if let Some(token) = &self.opts.render_token {
            endpoint.query_pairs_mut().append_pair("token", token);
        }
        Ok(endpoint)
    }

    async fn fetch_markup(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        for (key, value) in &self.opts.headers {
            request = request.header(key, value);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;
        read_text(response).await
    }

    async fn fetch_rendered(&self, render_url: &Url, page_url: &str) -> Result<String> {
        let endpoint = self.render_endpoint(render_url)?;
        let response = self
            .client
            .post(endpoint)
            .json(&serde_json::json!({ "url": page_url }))
            .send()
            .await
            .context("render request failed")?;
        read_text(response).await
    }
}

impl ContentSource for HttpSource {
    async fn fetch(&self, profile: &str) -> Result<PageContent> {
        let url = self.page_url(profile);
        tracing::info!(profile, url = %url, "fetching profile page");

        let markup = self.fetch_markup(&url).await;
        let rendered = match &self.render_url {
            Some(render_url) => match self.fetch_rendered(render_url, &url).await {
                Ok(html) => Some(html),
                Err(e) => {
                    tracing::warn!(profile, error = %e, "render service failed");
                    None
                }
            },
            None => None,
        };

        match (markup, rendered) {
            (Err(e), None) => Err(e),
            (markup, rendered) => {
                let markup = markup
                    .map_err(|e| tracing::warn!(profile, error = %e, "page fetch failed"))
                    .ok();
                Ok(PageContent {
                    feed: None,
                    rendered,
                    markup,
                })
            }
        }
    }
}

/// Reads content from local files instead of the network.
///
/// A path of `-` reads standard input; at most one input may use it.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    pub feed: Option<PathBuf>,
    pub rendered: Option<PathBuf>,
    pub markup: Option<PathBuf>,
}

impl FileSource {
    pub fn is_configured(&self) -> bool {
        self.feed.is_some() || self.rendered.is_some() || self.markup.is_some()
    }
}

impl ContentSource for FileSource {
    async fn fetch(&self, profile: &str) -> Result<PageContent> {
        let stdin_uses = [&self.feed, &self.rendered, &self.markup]
            .into_iter()
            .flatten()
            .filter(|p| p.as_os_str() == "-")
            .count();
        if stdin_uses > 1 {
            bail!("only one input can be read from stdin");
        }

        tracing::debug!(profile, "reading local content");
        let feed = match &self.feed {
            Some(path) => {
                let text = read_input(path).await?;
                let value = serde_json::from_str(&text)
                    .with_context(|| format!("{} is not valid JSON", path.display()))?;
                Some(value)
            }
            None => None,
        };
        let rendered = match &self.rendered {
            Some(path) => Some(read_input(path).await?),
            None => None,
        };
        let markup = match &self.markup {
            Some(path) => Some(read_input(path).await?),
            None => None,
        };

        Ok(PageContent {
            feed,
            rendered,
            markup,
        })
    }
}

async fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!("scheme must be http or https, got {}", other)),
    }
}

/// Checks status and size, then decodes the body.
async fn read_text(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let final_url = response.url().to_string();

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            bail!("{}: content too large", final_url);
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let body = response
        .bytes()
        .await
        .with_context(|| format!("{}: failed to read body", final_url))?;

    if !status.is_success() {
        bail!("{}: HTTP status {}", final_url, status.as_u16());
    }
    if body.len() > MAX_CONTENT_LENGTH {
        bail!("{}: content too large", final_url);
    }

    Ok(decode_body(&body, content_type.as_deref()))
}

/// Decodes body bytes using the charset from the content-type header, else detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(charset) = content_type.and_then(extract_charset) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
            let (decoded, _, _) = encoding.decode(body);
            return decoded.into_owned();
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .to_lowercase()
        .split(';')
        .find_map(|part| part.trim().strip_prefix("charset=").map(str::to_string))
        .map(|c| c.trim_matches(|ch| ch == '"' || ch == '\'').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    fn source_for(server: &MockServer) -> HttpSource {
        HttpSource::new(SourceOptions {
            base_url: server.base_url(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_extract_charset() {
        assert_eq!(
            extract_charset("text/html; charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn test_decode_body_with_latin1_charset() {
        let body = b"caf\xe9 #focus";
        assert_eq!(
            decode_body(body, Some("text/html; charset=iso-8859-1")),
            "café #focus"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        let err = HttpSource::new(SourceOptions {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(format!("{:#}", err).contains("scheme must be http or https"));
    }

    #[tokio::test]
    async fn test_fetches_profile_page_with_browser_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/@exampleuser")
                .header("accept-language", "en-US,en;q=0.5")
                .header("user-agent", DEFAULT_USER_AGENT);
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html><body>profile</body></html>");
        });

        let content = source_for(&server).fetch("exampleuser").await.unwrap();

        mock.assert();
        assert_eq!(
            content.markup.as_deref(),
            Some("<html><body>profile</body></html>")
        );
        assert!(content.rendered.is_none());
        assert!(content.feed.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_fatal_without_renderer() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/@gone");
            then.status(404).body("not found");
        });

        let err = source_for(&server).fetch("gone").await.unwrap_err();
        assert!(err.to_string().contains("HTTP status 404"));
    }

    #[tokio::test]
    async fn test_render_service_snapshot() {
        let server = MockServer::start();
        let page_url = format!("{}/@exampleuser", server.base_url());
        server.mock(|when, then| {
            when.method(GET).path("/@exampleuser");
            then.status(503);
        });
        let render = server.mock(|when, then| {
            when.method(POST)
                .path("/content")
                .query_param("token", "s&cret#1")
                .json_body(serde_json::json!({ "url": page_url }));
            then.status(200).body("<div data-e2e=\"user-post-item\"></div>");
        });

        let source = HttpSource::new(SourceOptions {
            base_url: server.base_url(),
            render_url: Some(server.base_url()),
            render_token: Some("s&cret#1".to_string()),
            ..Default::default()
        })
        .unwrap();
        let content = source.fetch("exampleuser").await.unwrap();

        render.assert();
        assert!(content.markup.is_none());
        assert_eq!(
            content.rendered.as_deref(),
            Some("<div data-e2e=\"user-post-item\"></div>")
        );
    }

    #[test]
    fn test_render_token_is_query_encoded() {
        let source = HttpSource::new(SourceOptions {
            render_url: Some("http://render.local/base/".to_string()),
            render_token: Some("a&b#c d".to_string()),
            ..Default::default()
        })
        .unwrap();
        let render = source.render_url.clone().unwrap();
        let endpoint = source.render_endpoint(&render).unwrap();

        assert_eq!(endpoint.path(), "/base/content");
        let token = endpoint
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned());
        assert_eq!(token, Some("a&b#c d".to_string()));
        assert!(!endpoint.as_str().contains("a&b"));
    }

    #[test]
    fn test_page_url_keeps_base_path() {
        let source = HttpSource::new(SourceOptions {
            base_url: "http://proxy.local/tt/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(source.page_url("exampleuser"), "http://proxy.local/tt/@exampleuser");
    }

    #[tokio::test]
    async fn test_file_source_reads_feed_and_markup() {
        let dir = tempfile::TempDir::new().unwrap();
        let feed_path = dir.path().join("feed.json");
        let html_path = dir.path().join("page.html");
        std::fs::write(&feed_path, r#"{"ItemModule": {}}"#).unwrap();
        std::fs::write(&html_path, "<html></html>").unwrap();

        let source = FileSource {
            feed: Some(feed_path),
            markup: Some(html_path),
            ..Default::default()
        };
        let content = source.fetch("u").await.unwrap();

        assert_eq!(content.feed, Some(serde_json::json!({ "ItemModule": {} })));
        assert_eq!(content.markup.as_deref(), Some("<html></html>"));
    }

    #[tokio::test]
    async fn test_file_source_rejects_bad_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let feed_path = dir.path().join("feed.json");
        std::fs::write(&feed_path, "{oops").unwrap();

        let source = FileSource {
            feed: Some(feed_path),
            ..Default::default()
        };
        let err = source.fetch("u").await.unwrap_err();
        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[tokio::test]
    async fn test_file_source_single_stdin() {
        let source = FileSource {
            feed: Some(PathBuf::from("-")),
            markup: Some(PathBuf::from("-")),
            ..Default::default()
        };
        let err = source.fetch("u").await.unwrap_err();
        assert!(err.to_string().contains("only one input"));
    }
}
