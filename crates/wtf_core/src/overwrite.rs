//! Copy configuration from one character to another.
//!
//! An overwrite runs in two passes that only build a list of [`FilePair`]s,
//! followed by a sequential copy of that list:
//!
//! 1. **Account pass**: only when source and target live in different account
//!    directories. Queues the children of the account `SavedVariables`
//!    directory and the account `config-cache.wtf`, per [`OverwriteOptions`].
//! 2. **Character pass**: always runs. Queues the children of the character
//!    `SavedVariables` directory, `AddOns.txt`, `layout-local.txt`,
//!    `config-cache.wtf` and `chat-cache.txt`, per [`OverwriteOptions`].
//!
//! Every copied file is read as text and has the source character's name, then
//! the source realm, replaced by the target's. This is a blind substring
//! replacement, so unrelated occurrences of those strings are rewritten too.
//!
//! Unlike discovery, failures here propagate. The only tolerated condition is a
//! queued source file that no longer exists, which is skipped.

use crate::character::Character;
use crate::error::Result;
use crate::install::WowInstall;
use crate::SAVED_VARIABLES_DIR;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use tokio::fs;

pub const SYSTEM_CONFIG_FILE: &str = "config-cache.wtf";
pub const ADDON_LIST_FILE: &str = "AddOns.txt";
pub const LAYOUT_FILE: &str = "layout-local.txt";
pub const CHAT_CACHE_FILE: &str = "chat-cache.txt";

/// Which file categories an overwrite copies. Persisted with the user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverwriteOptions {
    /// Account `SavedVariables/*`
    pub account_addon: bool,
    /// Account `config-cache.wtf`
    pub account_system: bool,
    /// Character `SavedVariables/*`, `AddOns.txt` and `layout-local.txt`
    pub player_addon: bool,
    /// Character `config-cache.wtf`
    pub player_system: bool,
    /// Character `chat-cache.txt`
    pub chat: bool,
}

impl Default for OverwriteOptions {
    fn default() -> Self {
        Self {
            account_addon: true,
            account_system: true,
            player_addon: true,
            player_system: true,
            chat: true,
        }
    }
}

impl OverwriteOptions {
    /// Every category disabled.
    pub fn none() -> Self {
        Self {
            account_addon: false,
            account_system: false,
            player_addon: false,
            player_system: false,
            chat: false,
        }
    }

    fn account_enabled(&self) -> bool {
        self.account_addon || self.account_system
    }

    fn account_files(&self) -> Vec<&'static str> {
        let mut files = Vec::new();
        if self.account_system {
            files.push(SYSTEM_CONFIG_FILE);
        }
        files
    }

    fn character_files(&self) -> Vec<&'static str> {
        let mut files = Vec::new();
        if self.player_addon {
            files.push(ADDON_LIST_FILE);
            files.push(LAYOUT_FILE);
        }
        if self.player_system {
            files.push(SYSTEM_CONFIG_FILE);
        }
        if self.chat {
            files.push(CHAT_CACHE_FILE);
        }
        files
    }
}

/// A single queued copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePair {
    pub source: Utf8PathBuf,
    pub target: Utf8PathBuf,
}

/// What an overwrite did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverwriteReport {
    /// Target paths that were written.
    pub copied: Vec<Utf8PathBuf>,
    /// Source paths that were queued but not copied (missing, directory, binary).
    pub skipped: Vec<Utf8PathBuf>,
}

async fn list_dir(dir: &Utf8Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}

/// Like `metadata().is_dir()`, but a vanished entry is just "not a directory".
async fn is_existing_dir(path: &Utf8Path) -> Result<bool> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Queue the wanted children of `source_dir`, mapped onto `target_dir`.
///
/// With `saved_variables` set, the `SavedVariables` directory is flattened:
/// each of its children is queued individually.
async fn queue_directory(
    source_dir: &Utf8Path,
    target_dir: &Utf8Path,
    saved_variables: bool,
    names: &[&str],
    files: &mut Vec<FilePair>,
) -> Result<()> {
    for name in list_dir(source_dir).await? {
        let source = source_dir.join(&name);
        let target = target_dir.join(&name);

        if saved_variables && name == SAVED_VARIABLES_DIR && is_existing_dir(&source).await? {
            for child in list_dir(&source).await? {
                files.push(FilePair {
                    source: source.join(&child),
                    target: target.join(&child),
                });
            }
        } else if names.contains(&name.as_str()) {
            files.push(FilePair { source, target });
        }
    }
    Ok(())
}

/// Build the ordered list of files an overwrite would copy.
pub async fn build_file_list(
    install: &WowInstall,
    options: &OverwriteOptions,
    source: &Character,
    target: &Character,
) -> Result<Vec<FilePair>> {
    let source_account = source.account_dir(install)?;
    let target_account = target.account_dir(install)?;
    let mut files = Vec::new();

    if options.account_enabled() && source_account != target_account {
        queue_directory(
            &source_account,
            &target_account,
            options.account_addon,
            &options.account_files(),
            &mut files,
        )
        .await?;
    }

    queue_directory(
        &source.character_dir(install)?,
        &target.character_dir(install)?,
        options.player_addon,
        &options.character_files(),
        &mut files,
    )
    .await?;

    Ok(files)
}

/// Replace the source identity with the target's: name first, then realm.
pub fn rename_identity(content: &str, source: &Character, target: &Character) -> String {
    let mut content = content.to_string();
    if !source.name.is_empty() && source.name != target.name {
        content = content.replace(&source.name, &target.name);
    }
    if !source.realm.is_empty() && source.realm != target.realm {
        content = content.replace(&source.realm, &target.realm);
    }
    content
}

async fn copy_pair(pair: &FilePair, source: &Character, target: &Character) -> Result<bool> {
    let metadata = match fs::metadata(&pair.source).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Source {} no longer exists, skipping", pair.source);
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(parent) = pair.target.parent() {
        fs::create_dir_all(parent).await?;
    }

    if metadata.is_dir() {
        tracing::debug!("Skipping directory {}", pair.source);
        return Ok(false);
    }

    let Ok(content) = String::from_utf8(fs::read(&pair.source).await?) else {
        tracing::warn!("Skipping binary file {}", pair.source);
        return Ok(false);
    };

    fs::write(&pair.target, rename_identity(&content, source, target)).await?;
    tracing::debug!("Copied {} -> {}", pair.source, pair.target);
    Ok(true)
}

/// Copy the selected configuration of `source` onto `target`.
///
/// On success `target` takes over the source's class, since its settings now
/// belong to that class.
pub async fn overwrite_character_config(
    install: &WowInstall,
    options: &OverwriteOptions,
    source: &Character,
    target: &mut Character,
) -> Result<OverwriteReport> {
    let files = build_file_list(install, options, source, target).await?;
    tracing::info!(
        "Overwriting {} with {} ({} files queued)",
        target,
        source,
        files.len()
    );

    let mut report = OverwriteReport::default();
    for pair in &files {
        if copy_pair(pair, source, target).await? {
            report.copied.push(pair.target.clone());
        } else {
            report.skipped.push(pair.source.clone());
        }
    }

    target.class_color = source.class_color.clone();
    target.class_index = source.class_index;

    tracing::info!(
        "Overwrite finished: {} copied, {} skipped",
        report.copied.len(),
        report.skipped.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::Flavor;
    use crate::test_support::{write_file, WtfFixture};

    fn character(account: &str, realm: &str, name: &str, flavor: Flavor) -> Character {
        Character::new(account, realm, name, flavor)
    }

    fn read(path: &Utf8Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_player_system_only() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        let source_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        let target_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Uther");
        write_file(&source_dir.join(SYSTEM_CONFIG_FILE), "Arthas of Stormrage");
        write_file(&source_dir.join(CHAT_CACHE_FILE), "Arthas says hi");

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone()).with_class(6);
        let mut target = character("ACC1", "Stormrage", "Uther", flavor.clone()).with_class(2);
        let options = OverwriteOptions {
            player_system: true,
            ..OverwriteOptions::none()
        };

        let report = overwrite_character_config(&fixture.install(), &options, &source, &mut target)
            .await
            .unwrap();

        assert_eq!(report.copied, vec![target_dir.join(SYSTEM_CONFIG_FILE)]);
        assert_eq!(read(&target_dir.join(SYSTEM_CONFIG_FILE)), "Uther of Stormrage");
        assert!(!target_dir.join(CHAT_CACHE_FILE).exists());
        assert_eq!(target.class_color, source.class_color);
        assert_eq!(target.class_index, 6);
    }

    #[tokio::test]
    async fn test_all_toggles_off_queues_nothing() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        let source_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        write_file(&source_dir.join(SYSTEM_CONFIG_FILE), "x");
        write_file(&source_dir.join("SavedVariables/Details.lua"), "x");
        fixture.account_file(&flavor, "ACC1", "SavedVariables/ElvUI.lua", "x");

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone());
        let mut target = character("ACC2", "Stormrage", "Uther", flavor.clone());
        let options = OverwriteOptions::none();

        let files = build_file_list(&fixture.install(), &options, &source, &target)
            .await
            .unwrap();
        assert!(files.is_empty());

        let report = overwrite_character_config(&fixture.install(), &options, &source, &mut target)
            .await
            .unwrap();
        assert_eq!(report, OverwriteReport::default());
        assert!(!fixture.account_dir(&flavor, "ACC2").exists());
    }

    #[tokio::test]
    async fn test_renames_name_and_realm_everywhere() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        let source_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        let target_dir = fixture.account_dir(&flavor, "ACC1").join("Area 52").join("Thrall");

        write_file(
            &source_dir.join("SavedVariables/Details.lua"),
            "DetailsDB = { [\"Arthas - Stormrage\"] = true }",
        );
        write_file(&source_dir.join(ADDON_LIST_FILE), "Details: enabled\n");
        write_file(&source_dir.join(LAYOUT_FILE), "Arthas@Stormrage layout");
        write_file(&source_dir.join(CHAT_CACHE_FILE), "Arthas of Stormrage");
        write_file(&source_dir.join("macros-cache.txt"), "Arthas");

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone());
        let mut target = character("ACC1", "Area 52", "Thrall", flavor.clone());

        let report = overwrite_character_config(
            &fixture.install(),
            &OverwriteOptions::default(),
            &source,
            &mut target,
        )
        .await
        .unwrap();

        assert_eq!(report.copied.len(), 4);
        let details = read(&target_dir.join("SavedVariables/Details.lua"));
        assert_eq!(details, "DetailsDB = { [\"Thrall - Area 52\"] = true }");
        assert_eq!(read(&target_dir.join(ADDON_LIST_FILE)), "Details: enabled\n");
        assert_eq!(read(&target_dir.join(LAYOUT_FILE)), "Thrall@Area 52 layout");
        assert_eq!(read(&target_dir.join(CHAT_CACHE_FILE)), "Thrall of Area 52");
        assert!(!target_dir.join("macros-cache.txt").exists());

        for path in &report.copied {
            let content = read(path);
            assert!(!content.contains("Arthas"));
            assert!(!content.contains("Stormrage"));
        }
    }

    #[tokio::test]
    async fn test_account_pass_between_accounts() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Classic;
        fixture.character(&flavor, "ACC1", "Mograine", "Bob");
        fixture.account_file(&flavor, "ACC1", "SavedVariables/ElvUI.lua", "Bob-Mograine");
        fixture.account_file(&flavor, "ACC1", SYSTEM_CONFIG_FILE, "SET realmName \"Mograine\"");
        fixture.account_file(&flavor, "ACC1", "bindings-cache.wtf", "bind");

        let source = character("ACC1", "Mograine", "Bob", flavor.clone());
        let mut target = character("ACC2", "Gehennas", "Alice", flavor.clone());
        let target_account = fixture.account_dir(&flavor, "ACC2");

        let options = OverwriteOptions {
            account_addon: true,
            account_system: true,
            ..OverwriteOptions::none()
        };
        let report = overwrite_character_config(&fixture.install(), &options, &source, &mut target)
            .await
            .unwrap();

        assert_eq!(report.copied.len(), 2);
        assert_eq!(
            read(&target_account.join("SavedVariables/ElvUI.lua")),
            "Alice-Gehennas"
        );
        assert_eq!(
            read(&target_account.join(SYSTEM_CONFIG_FILE)),
            "SET realmName \"Gehennas\""
        );
        assert!(!target_account.join("bindings-cache.wtf").exists());
    }

    #[tokio::test]
    async fn test_account_pass_skipped_for_same_account() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        fixture.account_file(&flavor, "ACC1", "SavedVariables/ElvUI.lua", "x");
        fixture.account_file(&flavor, "ACC1", SYSTEM_CONFIG_FILE, "x");

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone());
        let target = character("ACC1", "Stormrage", "Uther", flavor.clone());

        let files = build_file_list(&fixture.install(), &OverwriteOptions::default(), &source, &target)
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_account_pass_across_flavors() {
        let fixture = WtfFixture::new();
        fixture.character(&Flavor::Classic, "ACC1", "Mograine", "Bob");
        fixture.account_file(&Flavor::Classic, "ACC1", SYSTEM_CONFIG_FILE, "x");

        let source = character("ACC1", "Mograine", "Bob", Flavor::Classic);
        let target = character("ACC1", "Mograine", "Bob", Flavor::Retail);
        let options = OverwriteOptions {
            account_system: true,
            ..OverwriteOptions::none()
        };

        let files = build_file_list(&fixture.install(), &options, &source, &target)
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].target,
            fixture.account_dir(&Flavor::Retail, "ACC1").join(SYSTEM_CONFIG_FILE)
        );
    }

    #[tokio::test]
    async fn test_account_pairs_queued_before_character_pairs() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        let source_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        fixture.account_file(&flavor, "ACC1", "SavedVariables/ElvUI.lua", "a");
        fixture.account_file(&flavor, "ACC1", "SavedVariables/Details.lua", "a");
        fixture.account_file(&flavor, "ACC1", SYSTEM_CONFIG_FILE, "a");
        for file in [
            "SavedVariables/Blizzard.lua",
            ADDON_LIST_FILE,
            LAYOUT_FILE,
            SYSTEM_CONFIG_FILE,
            CHAT_CACHE_FILE,
        ] {
            write_file(&source_dir.join(file), "c");
        }

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone());
        let target = character("ACC2", "Stormrage", "Uther", flavor.clone());
        let files = build_file_list(&fixture.install(), &OverwriteOptions::default(), &source, &target)
            .await
            .unwrap();

        let target_account = fixture.account_dir(&flavor, "ACC2");
        let target_character = target_account.join("Stormrage").join("Uther");
        let in_character: Vec<bool> = files
            .iter()
            .map(|pair| pair.source.starts_with(&source_dir))
            .collect();

        assert_eq!(files.len(), 8);
        assert_eq!(in_character, [false, false, false, true, true, true, true, true]);
        for pair in &files[..3] {
            assert!(pair.target.starts_with(&target_account));
            assert!(!pair.target.starts_with(&target_character));
        }
        for pair in &files[3..] {
            assert!(pair.target.starts_with(&target_character));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_source_file_is_skipped() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        let source_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        let target_dir = fixture.account_dir(&flavor, "ACC1").join("Stormrage").join("Uther");
        std::os::unix::fs::symlink(
            source_dir.join("does-not-exist"),
            source_dir.join(SYSTEM_CONFIG_FILE),
        )
        .unwrap();

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone());
        let mut target = character("ACC1", "Stormrage", "Uther", flavor.clone());

        let report = overwrite_character_config(
            &fixture.install(),
            &OverwriteOptions::default(),
            &source,
            &mut target,
        )
        .await
        .unwrap();

        assert!(report.copied.is_empty());
        assert_eq!(report.skipped, vec![source_dir.join(SYSTEM_CONFIG_FILE)]);
        assert!(!target_dir.join(SYSTEM_CONFIG_FILE).exists());
    }

    #[tokio::test]
    async fn test_binary_and_directory_entries_are_skipped() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        let source_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        let target_dir = fixture.account_dir(&flavor, "ACC1").join("Stormrage").join("Uther");
        std::fs::create_dir_all(source_dir.join("SavedVariables/Nested")).unwrap();
        std::fs::write(source_dir.join("SavedVariables/blob.bak"), [0xff, 0xfe, 0x00]).unwrap();

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone());
        let mut target = character("ACC1", "Stormrage", "Uther", flavor.clone());

        let report = overwrite_character_config(
            &fixture.install(),
            &OverwriteOptions::default(),
            &source,
            &mut target,
        )
        .await
        .unwrap();

        assert!(report.copied.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert!(target_dir.join("SavedVariables").is_dir());
        assert!(!target_dir.join("SavedVariables/Nested").exists());
        assert!(!target_dir.join("SavedVariables/blob.bak").exists());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        let source_dir = fixture.character(&flavor, "ACC1", "Stormrage", "Arthas");
        write_file(&source_dir.join(SYSTEM_CONFIG_FILE), "Arthas");
        // A plain file where the target character directory should be
        write_file(
            &fixture.account_dir(&flavor, "ACC1").join("Stormrage").join("Uther"),
            "in the way",
        );

        let source = character("ACC1", "Stormrage", "Arthas", flavor.clone()).with_class(6);
        let mut target = character("ACC1", "Stormrage", "Uther", flavor.clone());

        let result = overwrite_character_config(
            &fixture.install(),
            &OverwriteOptions::default(),
            &source,
            &mut target,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(target.class_index, 0);
    }

    #[tokio::test]
    async fn test_missing_source_character_errors() {
        let fixture = WtfFixture::new();
        let flavor = Flavor::Retail;
        fixture.character(&flavor, "ACC1", "Stormrage", "Uther");

        let source = character("ACC1", "Stormrage", "Ghost", flavor.clone());
        let mut target = character("ACC1", "Stormrage", "Uther", flavor.clone());

        assert!(overwrite_character_config(
            &fixture.install(),
            &OverwriteOptions::default(),
            &source,
            &mut target,
        )
        .await
        .is_err());
    }

    #[test]
    fn test_rename_identity() {
        let source = character("A", "Stormrage", "Arthas", Flavor::Retail);
        let target = character("A", "Stormrage", "Uther", Flavor::Retail);
        assert_eq!(
            rename_identity("Arthas-Stormrage Arthas", &source, &target),
            "Uther-Stormrage Uther"
        );

        let empty = character("A", "", "", Flavor::Retail);
        assert_eq!(rename_identity("abc", &empty, &target), "abc");
    }

    #[test]
    fn test_options_serialization_defaults() {
        let options: OverwriteOptions = serde_json::from_str(r#"{"chat": false}"#).unwrap();
        assert!(options.account_addon);
        assert!(options.player_system);
        assert!(!options.chat);

        let json = serde_json::to_string(&OverwriteOptions::none()).unwrap();
        assert!(json.contains("\"accountAddon\":false"));
        assert!(json.contains("\"playerSystem\":false"));
    }
}
