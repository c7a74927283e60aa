use mapview_core::error::SourceError;
use mapview_core::{MapSource, ViewerConfig};
use web_sys::Window;

use crate::utils::{asset_url, fetch_text};

/// Catalog files served next to the page.
pub struct FetchSource {
    window: Window,
    config: ViewerConfig,
}

impl FetchSource {
    pub fn new(window: Window, config: &ViewerConfig) -> Self {
        FetchSource {
            window,
            config: config.clone(),
        }
    }
}

impl MapSource for FetchSource {
    async fn fetch_index(&self) -> Result<String, SourceError> {
        fetch_text(&self.window, &asset_url(&self.config.index_path)).await
    }

    async fn fetch_map(&self, id: &str) -> Result<String, SourceError> {
        fetch_text(&self.window, &asset_url(&self.config.map_path(id))).await
    }
}
