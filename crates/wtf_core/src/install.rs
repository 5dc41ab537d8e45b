//! World of Warcraft installation root handling.
//!
//! [`WowInstall`] resolves the per-flavor `WTF` and `Account` directories from
//! the configured root. The free functions validate and auto-detect a root.

use crate::error::{Error, Result};
use crate::flavor::Flavor;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use sysinfo::Disks;

pub const WTF_DIR: &str = "WTF";
pub const ACCOUNT_DIR: &str = "Account";

const INSTALL_DIR_NAME: &str = "World of Warcraft";

/// Path resolver for a (possibly unconfigured) installation root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WowInstall {
    root: Option<Utf8PathBuf>,
}

impl WowInstall {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// An install with no root configured.
    pub fn unconfigured() -> Self {
        Self { root: None }
    }

    pub fn from_option(root: Option<Utf8PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Utf8Path> {
        self.root.as_deref()
    }

    /// Returns `true` if a root is configured and exists on disk.
    pub async fn try_exists(&self) -> Result<bool> {
        match self.root.as_deref() {
            Some(root) if !root.as_str().is_empty() => Ok(tokio::fs::try_exists(root).await?),
            _ => Ok(false),
        }
    }

    fn configured_root(&self) -> Result<&Utf8Path> {
        self.root
            .as_deref()
            .filter(|root| !root.as_str().is_empty())
            .ok_or(Error::RootNotConfigured)
    }

    /// `<root>/<flavor>/WTF`
    pub fn wtf_path(&self, flavor: &Flavor) -> Result<Utf8PathBuf> {
        Ok(self.configured_root()?.join(flavor.as_str()).join(WTF_DIR))
    }

    /// `<root>/<flavor>/WTF/Account`
    pub fn account_path(&self, flavor: &Flavor) -> Result<Utf8PathBuf> {
        Ok(self.wtf_path(flavor)?.join(ACCOUNT_DIR))
    }
}

/// Validates that `path` looks like a World of Warcraft root, i.e. it holds at
/// least one `_flavor_` directory.
pub fn is_valid_wow_root(path: &Utf8Path) -> bool {
    let Ok(entries) = fs::read_dir(path.as_std_path()) else {
        return false;
    };

    entries.flatten().any(|entry| {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        is_dir
            && entry
                .file_name()
                .to_str()
                .is_some_and(Flavor::is_flavor_dir_name)
    })
}

/// Get all available mount points using sysinfo (cross-platform).
fn get_available_drives() -> Vec<String> {
    let disks = Disks::new_with_refreshed_list();

    let mut drives: Vec<String> = disks
        .iter()
        .filter_map(|disk| disk.mount_point().to_str().map(|s| s.to_string()))
        .collect();

    if drives.is_empty() && cfg!(target_os = "windows") {
        drives = vec!["C:", "D:", "E:", "F:"]
            .into_iter()
            .map(String::from)
            .collect();
    }

    drives
}

fn candidate_roots(drives: &[String]) -> Vec<Utf8PathBuf> {
    let mut candidates = Vec::new();

    for drive in drives {
        let drive_root = Utf8PathBuf::from(drive.trim_end_matches(['\\', '/']));

        candidates.push(drive_root.join(INSTALL_DIR_NAME));
        candidates.push(drive_root.join("Games").join(INSTALL_DIR_NAME));
        candidates.push(drive_root.join("Program Files").join(INSTALL_DIR_NAME));
        candidates.push(
            drive_root
                .join("Program Files (x86)")
                .join(INSTALL_DIR_NAME),
        );
        candidates.push(drive_root.join("Applications").join(INSTALL_DIR_NAME));
    }

    candidates
}

/// Probe common installation locations on every mounted disk.
pub fn auto_detect_wow_root() -> Option<Utf8PathBuf> {
    let found = candidate_roots(&get_available_drives())
        .into_iter()
        .find(|path| is_valid_wow_root(path));

    match &found {
        Some(path) => tracing::info!("Auto-detected World of Warcraft at {}", path),
        None => tracing::info!("No World of Warcraft installation found in common locations"),
    }
    found
}
