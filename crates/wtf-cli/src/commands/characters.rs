use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::AppConfig;
use crate::utils::{colored_name, format_edit_date};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use wtf_core::{Character, Flavor, WtfDiscovery};

pub struct ListCharactersArgs {
    pub flavor: Option<String>,
    pub json: bool,
}

pub async fn list_characters(cfg: &AppConfig, args: ListCharactersArgs) -> Result<()> {
    if cfg.wow_root_dir.is_none() {
        return Err(CliError::RootNotConfigured.into());
    }

    let flavor = args
        .flavor
        .as_deref()
        .map(Flavor::from)
        .unwrap_or_else(|| cfg.source_flavor());

    let discovery = WtfDiscovery::new(cfg.install());
    let characters = discovery.load_characters(&flavor).await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&characters).into_diagnostic()?
        );
        return Ok(());
    }

    print_characters(&flavor, &characters);
    Ok(())
}

fn print_characters(flavor: &Flavor, characters: &[Character]) {
    println_pad!(
        "{} {}",
        "🎮 Flavor:".bright_blue().bold(),
        flavor.label().bright_cyan().bold()
    );

    if characters.is_empty() {
        println_pad!("{}", "No characters found".bright_yellow());
        return;
    }

    let mut by_account: BTreeMap<&str, Vec<&Character>> = BTreeMap::new();
    for character in characters {
        by_account
            .entry(character.account.as_str())
            .or_default()
            .push(character);
    }

    for (account, mut members) in by_account {
        members.sort_by(|a, b| (&a.realm, &a.name).cmp(&(&b.realm, &b.name)));

        println_pad!("\n{} {}", "👤".bright_white(), account.bright_white().bold());
        for character in members {
            let class = character
                .class()
                .map(|c| c.token().to_string())
                .unwrap_or_else(|| "?".to_string());
            let logged = if character.logged {
                "".normal()
            } else {
                " (never logged in)".dimmed()
            };

            println_pad!(
                "   {} {}-{} {} {}{}",
                "•".bright_cyan(),
                colored_name(character),
                character.realm,
                format!("[{}]", class).dimmed(),
                format_edit_date(character.edit_date).dimmed(),
                logged
            );
        }
    }
}
