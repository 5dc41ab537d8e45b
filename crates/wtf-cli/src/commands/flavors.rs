use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::AppConfig;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use wtf_core::{FlavorOption, WtfDiscovery};

pub struct ListFlavorsArgs {
    pub json: bool,
}

pub async fn list_flavors(cfg: &AppConfig, args: ListFlavorsArgs) -> Result<()> {
    if cfg.wow_root_dir.is_none() {
        return Err(CliError::RootNotConfigured.into());
    }

    let discovery = WtfDiscovery::new(cfg.install());
    let flavors = discovery.load_flavors().await.map_err(CliError::from)?;
    let options: Vec<FlavorOption> = flavors.iter().map(|f| f.to_option()).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&options).into_diagnostic()?);
        return Ok(());
    }

    if options.is_empty() {
        println_pad!("{}", "No game flavors found".bright_yellow());
        return Ok(());
    }

    println_pad!("{}", "🎮 Flavors:".bright_magenta().bold());
    for option in &options {
        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            option.label.bright_cyan().bold(),
            format!("({})", option.value).dimmed()
        );
    }

    Ok(())
}
