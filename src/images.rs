//! Best-effort recipe pictures. Lookups never fail; anything that goes
//! wrong yields the placeholder path.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::recipe::PLACEHOLDER_IMAGE;

pub const UNSPLASH_RANDOM_URL: &str = "https://api.unsplash.com/photos/random";

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Returns an image URL for `query`, or the placeholder path.
    async fn find_image(&self, query: &str) -> String;
}

/// Always answers with the placeholder.
#[derive(Debug, Default, Clone)]
pub struct PlaceholderImages;

#[async_trait]
impl ImageSource for PlaceholderImages {
    async fn find_image(&self, _query: &str) -> String {
        PLACEHOLDER_IMAGE.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
}

// `count=1` returns an array, but older responses are a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnsplashResponse {
    Many(Vec<UnsplashPhoto>),
    One(UnsplashPhoto),
}

impl UnsplashResponse {
    fn into_url(self) -> Option<String> {
        match self {
            UnsplashResponse::Many(photos) => photos.into_iter().next().map(|p| p.urls.regular),
            UnsplashResponse::One(photo) => Some(photo.urls.regular),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnsplashClient {
    client: Client,
    access_key: Option<String>,
    endpoint: String,
}

impl UnsplashClient {
    pub fn new(client: Client, access_key: Option<String>) -> Self {
        Self::with_endpoint(client, access_key, UNSPLASH_RANDOM_URL)
    }

    pub fn with_endpoint(client: Client, access_key: Option<String>, endpoint: &str) -> Self {
        UnsplashClient {
            client,
            access_key: access_key.filter(|key| !key.trim().is_empty()),
            endpoint: endpoint.to_string(),
        }
    }

    async fn fetch(&self, access_key: &str, query: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("Client-ID {}", access_key))
            .query(&[("query", query), ("count", "1"), ("orientation", "squarish")])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<UnsplashResponse>().await?.into_url())
    }
}

#[async_trait]
impl ImageSource for UnsplashClient {
    async fn find_image(&self, query: &str) -> String {
        let Some(access_key) = self.access_key.as_deref() else {
            warn!("missing Unsplash access key, using placeholder image");
            return PLACEHOLDER_IMAGE.to_string();
        };
        match self.fetch(access_key, query).await {
            Ok(Some(url)) => {
                debug!(query, %url, "found image");
                url
            }
            Ok(None) => PLACEHOLDER_IMAGE.to_string(),
            Err(e) => {
                warn!(query, error = %e, "failed to fetch image from Unsplash");
                PLACEHOLDER_IMAGE.to_string()
            }
        }
    }
}
