//! Character discovery over the `WTF/Account` tree.
//!
//! [`WtfDiscovery`] is constructed once per application session and owns the
//! two pieces of session-wide state:
//!
//! 1. **Class cache**: resolved class indices keyed by
//!    `account:realm:name:editDate`. Unknown results are cached too. A changed
//!    directory modification time produces a new key, so stale entries are
//!    simply never consulted again.
//! 2. **In-flight walks**: at most one directory walk runs per flavor. Callers
//!    arriving while a walk is running join it and receive their own copy of
//!    its result. The entry is removed as soon as the walk settles.
//!
//! Enumeration never fails: a missing installation yields an empty list, and
//! any error during the walk is logged and also yields an empty list.

use crate::classes::{
    class_color_from_index, class_name_to_index, load_account_class_map,
    read_class_index_from_cache_file, AccountClassMap, UNKNOWN_CLASS,
};
use crate::character::Character;
use crate::error::{Error, Result};
use crate::flavor::{load_flavors, Flavor};
use crate::install::WowInstall;
use crate::SAVED_VARIABLES_DIR;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs::Metadata;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::UNIX_EPOCH;
use tokio::fs;
use tokio::sync::OnceCell;

type InFlightWalk = Arc<OnceCell<Vec<Character>>>;

/// Where a character's class index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassSource {
    Cache,
    ClassCacheFile,
    AccountMap,
    Unknown,
}

/// Counters describing how much filesystem work discovery has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Directory walks actually started (joined walks are not counted).
    pub walks: usize,
    /// Reads of a character's dedicated class cache file.
    pub class_cache_file_reads: usize,
    /// Account-wide class maps built from addon data.
    pub account_map_builds: usize,
}

/// Session-scoped character discovery service.
#[derive(Debug, Default)]
pub struct WtfDiscovery {
    install: WowInstall,
    class_cache: Mutex<HashMap<String, u8>>,
    in_flight: Mutex<HashMap<String, InFlightWalk>>,
    walks: AtomicUsize,
    class_cache_file_reads: AtomicUsize,
    account_map_builds: AtomicUsize,
}

/// Position of one character directory during a walk.
struct CharacterLocation<'a> {
    account: &'a str,
    account_dir: &'a Utf8Path,
    realm: &'a str,
    name: &'a str,
    saved_path: &'a Utf8Path,
    edit_date: i64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Class cache key: `account:realm:name:editDate`.
pub fn class_cache_key(account: &str, realm: &str, name: &str, edit_date: i64) -> String {
    format!("{}:{}:{}:{}", account, realm, name, edit_date)
}

fn modified_millis(metadata: &Metadata) -> Result<i64> {
    let modified = metadata.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    })
}

/// Child entry names of `dir`, in listing order.
async fn list_dir(dir: &Utf8Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => tracing::warn!("Skipping non UTF-8 entry {:?} in {}", name, dir),
        }
    }
    Ok(names)
}

async fn is_dir(path: &Utf8Path) -> Result<bool> {
    Ok(fs::metadata(path).await?.is_dir())
}

impl WtfDiscovery {
    pub fn new(install: WowInstall) -> Self {
        Self {
            install,
            ..Default::default()
        }
    }

    pub fn install(&self) -> &WowInstall {
        &self.install
    }

    pub fn stats(&self) -> DiscoveryStats {
        DiscoveryStats {
            walks: self.walks.load(Ordering::Relaxed),
            class_cache_file_reads: self.class_cache_file_reads.load(Ordering::Relaxed),
            account_map_builds: self.account_map_builds.load(Ordering::Relaxed),
        }
    }

    pub fn cached_class(&self, key: &str) -> Option<u8> {
        lock(&self.class_cache).get(key).copied()
    }

    pub fn class_cache_len(&self) -> usize {
        lock(&self.class_cache).len()
    }

    /// Flavors available under the configured root.
    ///
    /// Unlike character enumeration this reports a missing root as
    /// [`Error::RootNotFound`].
    pub async fn load_flavors(&self) -> Result<Vec<Flavor>> {
        let root = self.install.root().ok_or(Error::RootNotConfigured)?;
        if !self.install.try_exists().await? {
            return Err(Error::RootNotFound(root.to_owned()));
        }
        load_flavors(root).await
    }

    /// Enumerate every character of `flavor`.
    ///
    /// Concurrent calls for the same flavor share one directory walk. Each
    /// caller gets an independent copy of the result.
    pub async fn load_characters(&self, flavor: &Flavor) -> Vec<Character> {
        let walk = {
            let mut in_flight = lock(&self.in_flight);
            in_flight
                .entry(flavor.as_str().to_string())
                .or_default()
                .clone()
        };

        let characters = walk
            .get_or_init(|| async {
                let result = match self.walk(flavor).await {
                    Ok(characters) => {
                        tracing::info!(
                            "Loaded {} characters for flavor {}",
                            characters.len(),
                            flavor
                        );
                        characters
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load characters for flavor {}: {}", flavor, e);
                        Vec::new()
                    }
                };

                let mut in_flight = lock(&self.in_flight);
                if in_flight
                    .get(flavor.as_str())
                    .is_some_and(|current| Arc::ptr_eq(current, &walk))
                {
                    in_flight.remove(flavor.as_str());
                }

                result
            })
            .await;

        characters.clone()
    }

    async fn walk(&self, flavor: &Flavor) -> Result<Vec<Character>> {
        let install = &self.install;
        if !install.try_exists().await? {
            tracing::debug!("World of Warcraft directory not available, no characters");
            return Ok(Vec::new());
        }

        let root = install.account_path(flavor)?;
        if !fs::try_exists(&root).await? {
            tracing::debug!("Account directory {} does not exist", root);
            return Ok(Vec::new());
        }

        self.walks.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Walking {}", root);

        let mut result = Vec::new();
        for account in list_dir(&root).await? {
            let account_dir = root.join(&account);
            if !is_dir(&account_dir).await? {
                continue;
            }
            self.walk_account(flavor, &account, &account_dir, &mut result)
                .await?;
        }

        Ok(result)
    }

    async fn walk_account(
        &self,
        flavor: &Flavor,
        account: &str,
        account_dir: &Utf8Path,
        result: &mut Vec<Character>,
    ) -> Result<()> {
        // Built at most once per account, only when a character needs it
        let mut account_map: Option<AccountClassMap> = None;

        for realm in list_dir(account_dir).await? {
            if realm == SAVED_VARIABLES_DIR {
                continue;
            }
            let realm_dir = account_dir.join(&realm);
            if !is_dir(&realm_dir).await? {
                continue;
            }

            for name in list_dir(&realm_dir).await? {
                if name == SAVED_VARIABLES_DIR {
                    continue;
                }
                let character_dir: Utf8PathBuf = realm_dir.join(&name);
                let metadata = fs::metadata(&character_dir).await?;
                if !metadata.is_dir() {
                    continue;
                }

                let saved_path = character_dir.join(SAVED_VARIABLES_DIR);
                let edit_date = modified_millis(&metadata)?;
                let location = CharacterLocation {
                    account,
                    account_dir,
                    realm: &realm,
                    name: &name,
                    saved_path: &saved_path,
                    edit_date,
                };

                let (class_index, _) = self.resolve_class(&location, &mut account_map).await?;
                let logged = if class_index == UNKNOWN_CLASS {
                    fs::try_exists(&saved_path).await?
                } else {
                    true
                };

                result.push(Character {
                    account: account.to_string(),
                    realm: realm.clone(),
                    name,
                    flavor: flavor.clone(),
                    class_index,
                    class_color: class_color_from_index(class_index),
                    logged,
                    edit_date,
                });
            }
        }

        Ok(())
    }

    /// Cache, then the class cache file, then the account-wide addon map.
    /// Whatever comes out, including unknown, is written back to the cache.
    async fn resolve_class(
        &self,
        location: &CharacterLocation<'_>,
        account_map: &mut Option<AccountClassMap>,
    ) -> Result<(u8, ClassSource)> {
        let key = class_cache_key(
            location.account,
            location.realm,
            location.name,
            location.edit_date,
        );

        if let Some(index) = self.cached_class(&key) {
            return Ok((index, ClassSource::Cache));
        }

        let resolved = match self.from_class_cache_file(location).await? {
            Some(index) => (index, ClassSource::ClassCacheFile),
            None => match self.from_account_map(location, account_map).await? {
                Some(index) => (index, ClassSource::AccountMap),
                None => (UNKNOWN_CLASS, ClassSource::Unknown),
            },
        };

        tracing::debug!(
            "Resolved class {} for {}/{} via {:?}",
            resolved.0,
            location.realm,
            location.name,
            resolved.1
        );

        lock(&self.class_cache).insert(key, resolved.0);
        Ok(resolved)
    }

    async fn from_class_cache_file(&self, location: &CharacterLocation<'_>) -> Result<Option<u8>> {
        self.class_cache_file_reads.fetch_add(1, Ordering::Relaxed);
        read_class_index_from_cache_file(location.saved_path).await
    }

    async fn from_account_map(
        &self,
        location: &CharacterLocation<'_>,
        account_map: &mut Option<AccountClassMap>,
    ) -> Result<Option<u8>> {
        if account_map.is_none() {
            self.account_map_builds.fetch_add(1, Ordering::Relaxed);
            *account_map = Some(load_account_class_map(location.account_dir).await?);
        }

        Ok(account_map
            .as_ref()
            .and_then(|map| map.get(location.realm))
            .and_then(|realm| realm.get(location.name))
            .map(|token| class_name_to_index(token)))
    }
}
