//! Remote Store Client
//!
//! Typed HTTP access to the article store: list, detail, create. All
//! calls exchange JSON and succeed on 2xx.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::debug;

use crate::cache::{CacheKey, FetchFn, FetchFuture, KeyPart};
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::models::{Article, ArticleDraft};

// == Key Helpers ==
/// Key of the article list resource.
pub fn articles_key() -> CacheKey {
    CacheKey::new(["articles"])
}

/// Key of a single article resource. The `article` type tag keeps detail
/// keys disjoint from the list key.
pub fn article_key(id: u64) -> CacheKey {
    CacheKey::new([KeyPart::from("article"), KeyPart::from(id)])
}

// == Store Client ==
/// Client for the remote article store.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    // == Constructors ==
    /// Creates a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a client from engine configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.store_base_url.clone())
    }

    // == List Articles ==
    /// Fetches every article in the catalog.
    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        let url = format!("{}/articles", self.base_url);
        debug!(%url, "listing articles");
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::Transport(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    // == Get Article ==
    /// Fetches one article by id.
    pub async fn get_article(&self, id: u64) -> Result<Article> {
        let url = format!("{}/articles/{}", self.base_url, id);
        debug!(%url, "fetching article");
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(format!("article {}", id)));
        }
        if !response.status().is_success() {
            return Err(SyncError::Transport(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    // == Create Article ==
    /// Creates an article; the store assigns and returns its id.
    ///
    /// The draft is validated before any network call.
    pub async fn create_article(&self, draft: &ArticleDraft) -> Result<Article> {
        if let Some(message) = draft.validate() {
            return Err(SyncError::Invalid(message));
        }
        let url = format!("{}/articles", self.base_url);
        debug!(%url, title = %draft.title, "creating article");
        let response = self.http.post(&url).json(draft).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::Transport(format!(
                "POST {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    // == Engine Adapters ==
    /// Fetch operation for the article list, for use with
    /// [`SyncEngine::subscribe`](crate::SyncEngine::subscribe).
    pub fn list_fetcher(&self) -> FetchFn {
        let client = self.clone();
        Arc::new(move || {
            let client = client.clone();
            Box::pin(async move {
                let articles = client.list_articles().await?;
                serde_json::to_value(articles).map_err(SyncError::from)
            })
        })
    }

    /// Fetch operation for one article.
    pub fn article_fetcher(&self, id: u64) -> FetchFn {
        let client = self.clone();
        Arc::new(move || {
            let client = client.clone();
            Box::pin(async move {
                let article = client.get_article(id).await?;
                serde_json::to_value(article).map_err(SyncError::from)
            })
        })
    }

    /// Write operation creating `draft`, for use with
    /// [`SyncEngine::mutate`](crate::SyncEngine::mutate).
    pub fn create_write(&self, draft: ArticleDraft) -> FetchFuture {
        let client = self.clone();
        Box::pin(async move {
            let article = client.create_article(&draft).await?;
            serde_json::to_value(article).map_err(SyncError::from)
        })
    }
}
