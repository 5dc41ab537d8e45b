//! Character classes and the addon files that record them.
//!
//! The game itself does not store a character's class anywhere under `WTF`, so
//! it is recovered from data that popular addons persist:
//!
//! - **Class cache file**: `Yishier.lua` in the character's own SavedVariables
//!   directory, holding either a `class` token or a `classIndex`.
//! - **ElvUI**: `ElvUI.lua` in the account SavedVariables directory,
//!   `ElvDB["class"][realm][name] = "TOKEN"`.
//! - **NDui**: `NDui.lua` in the account SavedVariables directory,
//!   `NDuiADB["totalGold"][realm][name] = { gold, "TOKEN" }`.

use crate::error::{Error, Result};
use crate::lua::{parse_saved_variables, LuaValue, SavedVariables};
use crate::SAVED_VARIABLES_DIR;
use camino::Utf8Path;
use std::collections::HashMap;
use tokio::fs;

/// Class index used when no class could be resolved.
pub const UNKNOWN_CLASS: u8 = 0;

pub const CLASS_CACHE_FILE: &str = "Yishier.lua";
pub const ELVUI_FILE: &str = "ElvUI.lua";
pub const NDUI_FILE: &str = "NDui.lua";

/// realm -> character name -> class token
pub type AccountClassMap = HashMap<String, HashMap<String, String>>;

/// Playable classes, numbered by their in-game class id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WowClass {
    Warrior = 1,
    Paladin = 2,
    Hunter = 3,
    Rogue = 4,
    Priest = 5,
    DeathKnight = 6,
    Shaman = 7,
    Mage = 8,
    Warlock = 9,
    Monk = 10,
    Druid = 11,
    DemonHunter = 12,
}

impl WowClass {
    pub const ALL: [WowClass; 12] = [
        WowClass::Warrior,
        WowClass::Paladin,
        WowClass::Hunter,
        WowClass::Rogue,
        WowClass::Priest,
        WowClass::DeathKnight,
        WowClass::Shaman,
        WowClass::Mage,
        WowClass::Warlock,
        WowClass::Monk,
        WowClass::Druid,
        WowClass::DemonHunter,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.index() == index)
    }

    /// Parse a class token as written by the client (`"DEATHKNIGHT"`).
    /// Case and embedded spaces are ignored.
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized: String = token
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.token() == normalized)
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn token(self) -> &'static str {
        match self {
            WowClass::Warrior => "WARRIOR",
            WowClass::Paladin => "PALADIN",
            WowClass::Hunter => "HUNTER",
            WowClass::Rogue => "ROGUE",
            WowClass::Priest => "PRIEST",
            WowClass::DeathKnight => "DEATHKNIGHT",
            WowClass::Shaman => "SHAMAN",
            WowClass::Mage => "MAGE",
            WowClass::Warlock => "WARLOCK",
            WowClass::Monk => "MONK",
            WowClass::Druid => "DRUID",
            WowClass::DemonHunter => "DEMONHUNTER",
        }
    }

    /// Display color from the in-game class color table.
    pub fn color(self) -> &'static str {
        match self {
            WowClass::Warrior => "#C69B6D",
            WowClass::Paladin => "#F48CBA",
            WowClass::Hunter => "#AAD372",
            WowClass::Rogue => "#FFF468",
            WowClass::Priest => "#FFFFFF",
            WowClass::DeathKnight => "#C41E3A",
            WowClass::Shaman => "#0070DD",
            WowClass::Mage => "#3FC7EB",
            WowClass::Warlock => "#8788EE",
            WowClass::Monk => "#00FF98",
            WowClass::Druid => "#FF7C0A",
            WowClass::DemonHunter => "#A330C9",
        }
    }
}

/// Map a class token to its index, [`UNKNOWN_CLASS`] if unrecognized.
pub fn class_name_to_index(token: &str) -> u8 {
    WowClass::from_token(token).map_or(UNKNOWN_CLASS, WowClass::index)
}

/// Display color for a class index. Unknown classes have no color (empty string).
pub fn class_color_from_index(index: u8) -> String {
    WowClass::from_index(index)
        .map(|c| c.color().to_string())
        .unwrap_or_default()
}

/// Read and parse a SavedVariables file. Returns `Ok(None)` if it does not exist.
async fn read_saved_variables(path: &Utf8Path) -> Result<Option<SavedVariables>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let text = String::from_utf8_lossy(&bytes);
    parse_saved_variables(&text)
        .map(Some)
        .map_err(|e| Error::SavedVariables {
            path: path.to_owned(),
            message: e.to_string(),
        })
}

/// Resolve a class from the character's dedicated class cache file.
///
/// # Arguments
///
/// * `saved_path` - The character's `SavedVariables` directory
pub async fn read_class_index_from_cache_file(saved_path: &Utf8Path) -> Result<Option<u8>> {
    let Some(saved) = read_saved_variables(&saved_path.join(CLASS_CACHE_FILE)).await? else {
        return Ok(None);
    };

    for (_, value) in &saved.globals {
        let Some(table) = value.as_table() else {
            continue;
        };

        if let Some(index) = table
            .get("classIndex")
            .and_then(LuaValue::as_number)
            .filter(|n| n.fract() == 0.0 && (1.0..=255.0).contains(n))
            .and_then(|n| WowClass::from_index(n as u8))
        {
            return Ok(Some(index.index()));
        }

        if let Some(class) = table
            .get("class")
            .and_then(LuaValue::as_str)
            .and_then(WowClass::from_token)
        {
            return Ok(Some(class.index()));
        }
    }

    Ok(None)
}

/// Build the account-wide class map from ElvUI's saved data.
///
/// # Arguments
///
/// * `account_dir` - The account directory (`WTF/Account/<ACCOUNT>`)
pub async fn read_class_map_from_elvui(account_dir: &Utf8Path) -> Result<Option<AccountClassMap>> {
    let path = account_dir.join(SAVED_VARIABLES_DIR).join(ELVUI_FILE);
    let Some(saved) = read_saved_variables(&path).await? else {
        return Ok(None);
    };

    let Some(classes) = saved
        .get("ElvDB")
        .and_then(LuaValue::as_table)
        .and_then(|db| db.get_table("class"))
    else {
        return Ok(None);
    };

    let mut map = AccountClassMap::new();
    for (realm, characters) in classes.string_entries() {
        let Some(characters) = characters.as_table() else {
            continue;
        };
        let realm_map = map.entry(realm.to_string()).or_default();
        for (name, token) in characters.string_entries() {
            if let Some(token) = token.as_str() {
                realm_map.insert(name.to_string(), token.to_string());
            }
        }
    }

    Ok(Some(map))
}

/// Build the account-wide class map from NDui's gold tracker.
///
/// # Arguments
///
/// * `account_dir` - The account directory (`WTF/Account/<ACCOUNT>`)
pub async fn read_class_map_from_ndui(account_dir: &Utf8Path) -> Result<Option<AccountClassMap>> {
    let path = account_dir.join(SAVED_VARIABLES_DIR).join(NDUI_FILE);
    let Some(saved) = read_saved_variables(&path).await? else {
        return Ok(None);
    };

    let Some(gold) = saved
        .get("NDuiADB")
        .and_then(LuaValue::as_table)
        .and_then(|db| db.get_table("totalGold"))
    else {
        return Ok(None);
    };

    let mut map = AccountClassMap::new();
    for (realm, characters) in gold.string_entries() {
        let Some(characters) = characters.as_table() else {
            continue;
        };
        let realm_map = map.entry(realm.to_string()).or_default();
        for (name, record) in characters.string_entries() {
            // { gold, "CLASS" }
            if let Some(token) = record
                .as_table()
                .and_then(|r| r.get_index(2))
                .and_then(LuaValue::as_str)
            {
                realm_map.insert(name.to_string(), token.to_string());
            }
        }
    }

    Ok(Some(map))
}

/// ElvUI first, NDui only when ElvUI has nothing. Always yields a map.
pub async fn load_account_class_map(account_dir: &Utf8Path) -> Result<AccountClassMap> {
    if let Some(map) = read_class_map_from_elvui(account_dir).await? {
        tracing::debug!("Loaded ElvUI class map for {}", account_dir);
        return Ok(map);
    }
    if let Some(map) = read_class_map_from_ndui(account_dir).await? {
        tracing::debug!("Loaded NDui class map for {}", account_dir);
        return Ok(map);
    }
    Ok(AccountClassMap::new())
}
