//! Game client flavors and their discovery under the installation root.
//!
//! Every client variant (retail, classic, PTR, ...) lives in its own
//! `_name_` directory directly under the World of Warcraft root.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::fs;

/// Delimiter that wraps every flavor directory name, e.g. `_retail_`.
pub const FLAVOR_DELIMITER: char = '_';

/// A game client variant, identified by its root directory name.
///
/// Unrecognized `_name_` directories are kept as [`Flavor::Other`] so new
/// client channels still show up before they get a dedicated variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Flavor {
    Retail,
    Classic,
    Xptr,
    ClassicEra,
    Other(String),
}

impl Flavor {
    /// Directory name of this flavor under the installation root.
    pub fn as_str(&self) -> &str {
        match self {
            Flavor::Retail => "_retail_",
            Flavor::Classic => "_classic_",
            Flavor::Xptr => "_xptr_",
            Flavor::ClassicEra => "_classic_era_",
            Flavor::Other(name) => name,
        }
    }

    /// Human readable label, independent of the directory identifier.
    pub fn label(&self) -> &'static str {
        match self {
            Flavor::Retail => "Retail",
            Flavor::Classic => "Classic",
            Flavor::Xptr => "PTR",
            Flavor::ClassicEra => "Classic Era",
            Flavor::Other(_) => "Unknown",
        }
    }

    pub fn is_retail(&self) -> bool {
        matches!(self, Flavor::Retail)
    }

    /// Whether `name` looks like a flavor directory (`_name_`).
    pub fn is_flavor_dir_name(name: &str) -> bool {
        name.starts_with(FLAVOR_DELIMITER) && name.ends_with(FLAVOR_DELIMITER)
    }

    pub fn to_option(&self) -> FlavorOption {
        FlavorOption {
            label: self.label().to_string(),
            value: self.clone(),
        }
    }
}

impl From<&str> for Flavor {
    fn from(s: &str) -> Self {
        match s {
            "_retail_" => Flavor::Retail,
            "_classic_" => Flavor::Classic,
            "_xptr_" => Flavor::Xptr,
            "_classic_era_" => Flavor::ClassicEra,
            other => Flavor::Other(other.to_string()),
        }
    }
}

impl From<String> for Flavor {
    fn from(s: String) -> Self {
        Flavor::from(s.as_str())
    }
}

impl From<Flavor> for String {
    fn from(flavor: Flavor) -> Self {
        flavor.as_str().to_string()
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label/value pair handed to selection widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorOption {
    pub label: String,
    pub value: Flavor,
}

/// List the flavor directories under `root`.
///
/// Only directories named `_name_` are returned. Retail always comes first;
/// the remaining flavors keep their directory listing order. Failure to read
/// `root` or to stat one of its entries propagates to the caller.
pub async fn load_flavors(root: &Utf8Path) -> Result<Vec<Flavor>> {
    let mut flavors = Vec::new();
    let mut entries = fs::read_dir(root).await?;

    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !Flavor::is_flavor_dir_name(&name) {
            continue;
        }

        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| Error::NonUtf8Path(p.display().to_string()))?;
        if fs::metadata(&path).await?.is_dir() {
            flavors.push(Flavor::from(name));
        }
    }

    // Stable: non-retail flavors keep their relative order
    flavors.sort_by_key(|f| !f.is_retail());

    tracing::debug!("Found {} flavors under {}", flavors.len(), root);
    Ok(flavors)
}
