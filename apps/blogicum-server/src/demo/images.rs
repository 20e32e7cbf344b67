//! Fetching and storing demo post images.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

/// Per-request timeout for remote pages and images.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Directory under `MEDIA_ROOT` that holds post images.
pub const POSTS_IMAGES_DIR: &str = "posts_images";

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// Source of remote pages and images.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// reqwest-backed fetcher with a browser-like User-Agent.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.get(url).await?.text().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.get(url).await?.bytes().await?.to_vec())
    }
}

/// `content` of the first `<meta property="og:image">` tag.
pub fn extract_og_image(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[property="og:image"]"#).ok()?;

    document
        .select(&selector)
        .next()?
        .value()
        .attr("content")
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(String::from)
}

/// File extension for an image URL; unknown extensions become `jpg`.
pub fn image_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        ext
    } else {
        "jpg".to_string()
    }
}

/// Image URL advertised by an article page, if it can be fetched.
pub async fn article_image(fetcher: &dyn RemoteFetcher, article_url: &str) -> Option<String> {
    match fetcher.fetch_text(article_url).await {
        Ok(html) => extract_og_image(&html),
        Err(e) => {
            tracing::warn!(%article_url, error = %e, "Could not fetch article page");
            None
        }
    }
}

/// Download `image_url` into `media_root/posts_images/habr_post_{number}.{ext}`.
///
/// Falls back to `static_root/img/logo.png` when the download fails.
/// Returns the stored path relative to `media_root`, or `None` when neither
/// the image nor the logo is available.
pub async fn store_post_image(
    fetcher: &dyn RemoteFetcher,
    image_url: &str,
    number: usize,
    media_root: &Path,
    static_root: &Path,
) -> Option<String> {
    let (content, ext) = match fetcher.fetch_bytes(image_url).await {
        Ok(bytes) => (bytes, image_extension(image_url)),
        Err(e) => {
            tracing::warn!(%image_url, error = %e, "Image download failed, using logo");
            let logo = static_root.join("img").join("logo.png");
            match tokio::fs::read(&logo).await {
                Ok(bytes) => (bytes, "png".to_string()),
                Err(_) => {
                    tracing::warn!(path = %logo.display(), "Logo not found, post left without image");
                    return None;
                }
            }
        }
    };

    let relative = format!("{POSTS_IMAGES_DIR}/habr_post_{number}.{ext}");
    let target = media_root.join(&relative);

    if let Some(parent) = target.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!(path = %parent.display(), error = %e, "Could not create media directory");
            return None;
        }
    }
    if let Err(e) = tokio::fs::write(&target, &content).await {
        tracing::warn!(path = %target.display(), error = %e, "Could not save image");
        return None;
    }

    Some(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_og_image_content() {
        let html = r#"<html><head>
            <meta property="og:title" content="Title">
            <meta property="og:image" content=" https://cdn.example.com/cover.png ">
            </head><body></body></html>"#;

        assert_eq!(
            extract_og_image(html).as_deref(),
            Some("https://cdn.example.com/cover.png")
        );
    }

    #[test]
    fn missing_or_empty_og_image_is_none() {
        assert_eq!(extract_og_image("<html><head></head></html>"), None);
        assert_eq!(
            extract_og_image(r#"<meta property="og:image" content="">"#),
            None
        );
    }

    #[test]
    fn extension_comes_from_url_path() {
        assert_eq!(image_extension("https://x.io/a/b.PNG?w=100"), "png");
        assert_eq!(image_extension("https://x.io/a/b.jpeg"), "jpeg");
        assert_eq!(image_extension("https://x.io/a/b.webp#frag"), "webp");
        assert_eq!(image_extension("https://x.io/a/b.gif"), "jpg");
        assert_eq!(image_extension("https://x.io/a/image"), "jpg");
    }
}
