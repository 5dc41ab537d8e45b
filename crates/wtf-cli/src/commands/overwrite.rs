use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{self, AppConfig};
use crate::utils::{colored_name, CharacterRef};
use camino::Utf8Path;
use colored::Colorize;
use miette::Result;
use wtf_core::overwrite::build_file_list;
use wtf_core::{overwrite_character_config, Character, Flavor, WtfDiscovery};

pub struct OverwriteArgs {
    pub source: String,
    pub target: String,
    pub source_flavor: Option<String>,
    pub target_flavor: Option<String>,
    pub dry_run: bool,
}

fn find_character(
    characters: &[Character],
    spec: &str,
    flavor: &Flavor,
) -> Result<Character, CliError> {
    let parsed = CharacterRef::parse(spec)?;
    characters
        .iter()
        .find(|c| parsed.matches(c))
        .cloned()
        .ok_or_else(|| CliError::character_not_found(spec, flavor))
}

pub async fn overwrite_character(
    config_path: &Utf8Path,
    cfg: &AppConfig,
    args: OverwriteArgs,
) -> Result<()> {
    if cfg.wow_root_dir.is_none() {
        return Err(CliError::RootNotConfigured.into());
    }

    let source_flavor = args
        .source_flavor
        .as_deref()
        .map(Flavor::from)
        .unwrap_or_else(|| cfg.source_flavor());
    let target_flavor = args
        .target_flavor
        .as_deref()
        .map(Flavor::from)
        .unwrap_or_else(|| cfg.target_flavor());

    let discovery = WtfDiscovery::new(cfg.install());
    let (source_characters, target_characters) = tokio::join!(
        discovery.load_characters(&source_flavor),
        discovery.load_characters(&target_flavor)
    );

    let source = find_character(&source_characters, &args.source, &source_flavor)?;
    let mut target = find_character(&target_characters, &args.target, &target_flavor)?;
    if source.same_identity(&target) {
        return Err(CliError::SameCharacter.into());
    }

    let install = discovery.install();
    if args.dry_run {
        let files = build_file_list(install, &cfg.overwrite, &source, &target)
            .await
            .map_err(CliError::from)?;

        println_pad!(
            "{} {} {} {}",
            "🔍 Dry run:".bright_blue().bold(),
            colored_name(&source),
            "→".bright_white(),
            colored_name(&target)
        );
        for pair in &files {
            println_pad!(
                "   {} {} {}",
                "•".bright_cyan(),
                pair.source.as_str().dimmed(),
                format!("→ {}", pair.target).bright_white()
            );
        }
        println_pad!("\n{} file(s) would be copied", files.len());
        return Ok(());
    }

    let report = overwrite_character_config(install, &cfg.overwrite, &source, &mut target)
        .await
        .map_err(CliError::from)?;

    let mut updated = cfg.clone();
    updated.selected_source_flavor = Some(source_flavor.as_str().to_string());
    updated.selected_target_flavor = Some(target_flavor.as_str().to_string());
    if updated != *cfg {
        config::save_config(config_path, &updated)
            .map_err(|e| CliError::config_save_failed(config_path.to_owned(), e))?;
    }

    println!(
        "{} {} {} {}",
        "✓ Overwrote".bright_green().bold(),
        colored_name(&target),
        "with".bright_green(),
        colored_name(&source)
    );
    println_pad!(
        "{} {}",
        "Copied:".bright_white().bold(),
        report.copied.len().to_string().bright_green()
    );
    if !report.skipped.is_empty() {
        println_pad!(
            "{} {}",
            "Skipped:".bright_white().bold(),
            report.skipped.len().to_string().bright_yellow()
        );
        for path in &report.skipped {
            println_pad!("   {} {}", "•".bright_yellow(), path.as_str().dimmed());
        }
    }

    Ok(())
}
