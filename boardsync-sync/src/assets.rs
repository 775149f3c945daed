//! Loading remote images into texture handles.
//!
//! The renderer owns the actual decoding; the session only needs to know
//! that an image is ready before it announces a token that displays it.

use crate::error::SyncResult;
use async_trait::async_trait;
use boardsync_store::AssetRefs;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// A loaded image, as the renderer describes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Loads an image by URL.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load(&self, url: &str) -> SyncResult<TextureHandle>;
}

/// Caches texture handles and deduplicates concurrent loads of one URL.
pub struct AssetManager {
    loader: Arc<dyn AssetLoader>,
    handles: Mutex<HashMap<String, Arc<OnceCell<TextureHandle>>>>,
}

impl AssetManager {
    pub fn new(loader: Arc<dyn AssetLoader>) -> Self {
        Self {
            loader,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle for `url`, loading it on first use. A failed load
    /// is not cached; the next call retries.
    pub async fn get(&self, url: &str) -> SyncResult<TextureHandle> {
        let cell = {
            let mut handles = self.handles.lock().await;
            Arc::clone(handles.entry(url.to_string()).or_default())
        };
        let handle = cell
            .get_or_try_init(|| async {
                debug!("Loading asset {}", url);
                self.loader.load(url).await
            })
            .await?;
        Ok(handle.clone())
    }

    /// The cached handle for `url`, if it finished loading.
    pub async fn cached(&self, url: &str) -> Option<TextureHandle> {
        let handles = self.handles.lock().await;
        handles.get(url).and_then(|cell| cell.get().cloned())
    }

    /// Forgets handles no live entity references. Returns the evicted URLs.
    pub async fn evict_unreferenced(&self, refs: &AssetRefs) -> Vec<String> {
        let mut handles = self.handles.lock().await;
        let mut evicted: Vec<String> = handles
            .keys()
            .filter(|url| !refs.is_referenced(url))
            .cloned()
            .collect();
        evicted.sort();
        for url in &evicted {
            handles.remove(url);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }
}
