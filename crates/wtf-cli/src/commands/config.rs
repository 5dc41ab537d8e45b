use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use colored::Colorize;
use miette::Result;
use wtf_core::{is_valid_wow_root, OverwriteOptions};

/// One of the toggles of an overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverwriteCategory {
    /// Account SavedVariables/*
    AccountAddon,
    /// Account config-cache.wtf
    AccountSystem,
    /// Character SavedVariables/*, AddOns.txt and layout-local.txt
    PlayerAddon,
    /// Character config-cache.wtf
    PlayerSystem,
    /// Character chat-cache.txt
    Chat,
}

impl OverwriteCategory {
    fn key(self) -> &'static str {
        match self {
            Self::AccountAddon => "accountAddon",
            Self::AccountSystem => "accountSystem",
            Self::PlayerAddon => "playerAddon",
            Self::PlayerSystem => "playerSystem",
            Self::Chat => "chat",
        }
    }

    fn apply(self, options: &mut OverwriteOptions, value: bool) {
        match self {
            Self::AccountAddon => options.account_addon = value,
            Self::AccountSystem => options.account_system = value,
            Self::PlayerAddon => options.player_addon = value,
            Self::PlayerSystem => options.player_system = value,
            Self::Chat => options.chat = value,
        }
    }
}

fn update_config(config_path: &Utf8Path, update: impl FnOnce(&mut AppConfig)) -> Result<()> {
    let mut cfg = config::load_config(config_path);
    update(&mut cfg);
    config::save_config(config_path, &cfg)
        .map_err(|e| CliError::config_save_failed(config_path.to_owned(), e).into())
}

fn print_toggle(name: &str, enabled: bool) {
    let status = if enabled {
        "✓".bright_green()
    } else {
        "✗".bright_red()
    };
    println!("    {} {}", format!("{}:", name).bright_white(), status);
}

pub fn show_config(config_path: &Utf8Path) -> Result<()> {
    let cfg = config::load_config(config_path);

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    match cfg.wow_root_dir.as_ref() {
        Some(root) => {
            let status = if is_valid_wow_root(root) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", "wow_root_dir:".bright_white(), root, status);
        }
        None => println!(
            "  {} {}",
            "wow_root_dir:".bright_white(),
            "(not set)".bright_yellow()
        ),
    }

    println!(
        "  {} {}",
        "source_flavor:".bright_white(),
        cfg.source_flavor().label()
    );
    println!(
        "  {} {}",
        "target_flavor:".bright_white(),
        cfg.target_flavor().label()
    );

    println!("  {}", "overwrite:".bright_white());
    for category in OverwriteCategory::value_variants() {
        let enabled = match category {
            OverwriteCategory::AccountAddon => cfg.overwrite.account_addon,
            OverwriteCategory::AccountSystem => cfg.overwrite.account_system,
            OverwriteCategory::PlayerAddon => cfg.overwrite.player_addon,
            OverwriteCategory::PlayerSystem => cfg.overwrite.player_system,
            OverwriteCategory::Chat => cfg.overwrite.chat,
        };
        print_toggle(category.key(), enabled);
    }

    println!();
    Ok(())
}

pub fn set_wow_root(config_path: &Utf8Path, path: String) -> Result<()> {
    let path = Utf8PathBuf::from(path);
    if !is_valid_wow_root(&path) {
        eprintln!(
            "  {}",
            "The path must point to the World of Warcraft installation folder.".bright_yellow()
        );
        eprintln!(
            "  {}",
            "Example: C:\\Program Files (x86)\\World of Warcraft".bright_yellow()
        );
        eprintln!();
        return Err(CliError::InvalidWowRoot { path }.into());
    }

    update_config(config_path, |cfg| cfg.wow_root_dir = Some(path.clone()))?;

    println!("{}", "✓ WoW root set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn auto_detect_wow_root(config_path: &Utf8Path) -> Result<()> {
    println!(
        "{}",
        "Searching for World of Warcraft installation...".bright_cyan()
    );
    println!();

    match wtf_core::auto_detect_wow_root() {
        Some(detected) => {
            println!("{}", "✓ Found World of Warcraft!".bright_green().bold());
            println!();
            println!(
                "  {} {}",
                "Path:".bright_white().bold(),
                detected.as_str().bright_green()
            );
            println!();

            update_config(config_path, |cfg| cfg.wow_root_dir = Some(detected.clone()))?;

            println!(
                "{}",
                "✓ Configuration updated successfully!"
                    .bright_green()
                    .bold()
            );
        }
        None => {
            println!(
                "{}",
                "✗ Could not automatically detect a World of Warcraft installation"
                    .bright_red()
                    .bold()
            );
            println!();
            println!(
                "  {} Use 'wtf-cli config set-root <path>' to set the path manually",
                "•".bright_cyan()
            );
        }
    }

    Ok(())
}

pub fn set_overwrite_option(
    config_path: &Utf8Path,
    category: OverwriteCategory,
    enabled: bool,
) -> Result<()> {
    update_config(config_path, |cfg| category.apply(&mut cfg.overwrite, enabled))?;

    println!(
        "{} {} = {}",
        "✓".bright_green().bold(),
        category.key().bright_white(),
        enabled
    );
    Ok(())
}

pub fn reset_config(config_path: &Utf8Path) -> Result<()> {
    config::save_config(config_path, &AppConfig::default())
        .map_err(|e| CliError::config_save_failed(config_path.to_owned(), e))?;

    println!("{}", "✓ Configuration reset to defaults".bright_green().bold());
    Ok(())
}
