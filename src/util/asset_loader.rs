use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use minijinja::{Environment, Error, State};
use sha2::{Digest, Sha256};

/// Resolves `{{ asset("js/host.js") }}` to a cache-busting `/static/...?v=<sha256>` URL.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::default(),
        }
    }

    pub fn asset_path(&self, path: &str) -> String {
        if let Some(hashed_path) = self.cache.read().ok().and_then(|c| c.get(path).cloned()) {
            return hashed_path;
        }

        let Ok(contents) = fs::read(self.root.join(path)) else {
            // Not cached, so a file added later still gets hashed.
            return format!("/static/{}", path);
        };
        let hash = Sha256::digest(contents);
        let hashed_path = format!("/static/{}?v={:x}", path, hash);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(path.to_string(), hashed_path.clone());
        }
        hashed_path
    }

    pub fn register(&self, env: &mut Environment<'_>) {
        let loader = self.clone();
        env.add_function("asset", move |_state: &State, path: String| -> Result<String, Error> {
            Ok(loader.asset_path(&path))
        });
    }
}
