//! Shared server state passed to every handler.

use std::sync::{Arc, Mutex};

use dashboard_core::{ReportAccessPolicy, StateStore, StorageConfig};

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::launcher::{GuardianPaths, Launcher, Platform};
use crate::sidecar::SidecarClient;
use crate::watcher::ChangeWatcher;

pub type SharedContext = Arc<ServerContext>;

pub struct ServerContext {
    pub config: ServerConfig,
    pub store: StateStore,
    pub broadcaster: Arc<Broadcaster>,
    pub launcher: Arc<dyn Launcher>,
    pub sidecar: SidecarClient,
    pub reports: ReportAccessPolicy,
    pub platform: Platform,
    watcher: Mutex<Option<ChangeWatcher>>,
}

impl ServerContext {
    pub fn new(config: ServerConfig, launcher: Arc<dyn Launcher>, sidecar: SidecarClient) -> Self {
        let store = StateStore::new(config.storage.clone());
        let reports = ReportAccessPolicy::for_storage(&config.storage);
        Self {
            broadcaster: Arc::new(Broadcaster::new(store.clone())),
            store,
            launcher,
            sidecar,
            reports,
            platform: Platform::current(),
            watcher: Mutex::new(None),
            config,
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.config.storage
    }

    pub fn guardian_paths(&self) -> GuardianPaths {
        let storage = self.storage();
        GuardianPaths {
            scripts_dir: storage.scripts_dir(),
            home: storage.home().to_path_buf(),
            default_projects_dir: storage.default_projects_dir(),
        }
    }

    /// Keeps the watch alive for as long as the context lives.
    pub fn install_watcher(&self, watcher: ChangeWatcher) {
        let mut slot = self.watcher.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(watcher);
    }
}
