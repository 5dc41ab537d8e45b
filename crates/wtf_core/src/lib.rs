//! Core logic for managing World of Warcraft `WTF` configuration.
//!
//! This crate provides the pieces behind the `wtf-cli` tool:
//!
//! - **Flavor discovery**: find the `_retail_`, `_classic_`, ... client
//!   directories under an installation root
//! - **Character discovery**: walk `WTF/Account/<account>/<realm>/<name>` and
//!   resolve each character's class from addon SavedVariables
//! - **Config overwrite**: copy addon and client settings from one character
//!   to another, renaming embedded name/realm references
//!
//! # Example
//!
//! ```no_run
//! use wtf_core::{overwrite_character_config, Flavor, OverwriteOptions, WowInstall, WtfDiscovery};
//!
//! # async fn run() -> wtf_core::Result<()> {
//! let discovery = WtfDiscovery::new(WowInstall::new("C:/Games/World of Warcraft"));
//! let characters = discovery.load_characters(&Flavor::Retail).await;
//!
//! let source = characters[0].clone();
//! let mut target = characters[1].clone();
//! let report = overwrite_character_config(
//!     discovery.install(),
//!     &OverwriteOptions::default(),
//!     &source,
//!     &mut target,
//! )
//! .await?;
//! println!("Copied {} files", report.copied.len());
//! # Ok(())
//! # }
//! ```

pub mod character;
pub mod classes;
pub mod discovery;
pub mod error;
pub mod flavor;
pub mod install;
pub mod lua;
pub mod overwrite;

#[cfg(test)]
pub(crate) mod test_support;

/// Directory holding per-addon persisted data, at account and character level.
pub const SAVED_VARIABLES_DIR: &str = "SavedVariables";

pub use character::Character;
pub use classes::{class_color_from_index, class_name_to_index, WowClass, UNKNOWN_CLASS};
pub use discovery::{DiscoveryStats, WtfDiscovery};
pub use error::{Error, Result};
pub use flavor::{load_flavors, Flavor, FlavorOption};
pub use install::{auto_detect_wow_root, is_valid_wow_root, WowInstall};
pub use overwrite::{overwrite_character_config, FilePair, OverwriteOptions, OverwriteReport};
