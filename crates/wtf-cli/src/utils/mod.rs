use crate::errors::CliError;
use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use wtf_core::Character;

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// A character reference as typed on the command line: `ACCOUNT/Realm/Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRef {
    pub account: String,
    pub realm: String,
    pub name: String,
}

impl CharacterRef {
    pub fn parse(spec: &str) -> Result<Self, CliError> {
        let parts: Vec<&str> = spec.split('/').map(str::trim).collect();
        match parts.as_slice() {
            [account, realm, name]
                if !account.is_empty() && !realm.is_empty() && !name.is_empty() =>
            {
                Ok(Self {
                    account: account.to_string(),
                    realm: realm.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(CliError::invalid_character_spec(spec)),
        }
    }

    pub fn matches(&self, character: &Character) -> bool {
        character.account == self.account
            && character.realm == self.realm
            && character.name == self.name
    }
}

/// Parses `#RRGGBB` into its components.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Character name painted in its class color, dimmed when the class is unknown.
pub fn colored_name(character: &Character) -> ColoredString {
    match hex_to_rgb(&character.class_color) {
        Some((r, g, b)) => character.name.truecolor(r, g, b).bold(),
        None => character.name.dimmed(),
    }
}

/// Formats an epoch-millisecond timestamp in local time.
pub fn format_edit_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
