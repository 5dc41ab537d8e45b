use camino::Utf8PathBuf;
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    auto_detect_wow_root, list_characters, list_flavors, overwrite_character, reset_config,
    set_overwrite_option, set_wow_root, show_config, ListCharactersArgs, ListFlavorsArgs,
    OverwriteArgs, OverwriteCategory,
};
use errors::CliError;
use miette::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the config file (defaults to config.toml next to the executable)
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the tool configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the game flavors of the configured installation
    Flavors {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the characters of a flavor
    Characters {
        /// Flavor directory, e.g. _retail_ (defaults to the selected source flavor)
        #[arg(short, long)]
        flavor: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy one character's configuration onto another
    Overwrite {
        /// Character to copy from, as ACCOUNT/Realm/Name
        #[arg(short, long)]
        source: String,

        /// Character to overwrite, as ACCOUNT/Realm/Name
        #[arg(short, long)]
        target: String,

        /// Flavor of the source character
        #[arg(long)]
        source_flavor: Option<String>,

        /// Flavor of the target character
        #[arg(long)]
        target_flavor: Option<String>,

        /// Only list the files that would be copied
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Set the World of Warcraft installation folder
    SetRoot { path: String },
    /// Search common locations for a World of Warcraft installation
    AutoDetect,
    /// Enable or disable one overwrite category
    Set {
        #[arg(value_enum)]
        category: OverwriteCategory,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Restore the default configuration
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}

fn init_logging(verbose: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "wtf_cli=debug,wtf_core=debug".into()
        } else {
            "wtf_cli=info,wtf_core=info".into()
        }
    });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    let config_path = utils::config::resolve_config_path(args.config.as_deref())
        .ok_or(CliError::ConfigPathUnavailable)?;
    let cfg = utils::config::load_config(&config_path);

    match args.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => show_config(&config_path),
            ConfigAction::SetRoot { path } => set_wow_root(&config_path, path),
            ConfigAction::AutoDetect => auto_detect_wow_root(&config_path),
            ConfigAction::Set { category, enabled } => {
                set_overwrite_option(&config_path, category, enabled)
            }
            ConfigAction::Reset => reset_config(&config_path),
        },
        Commands::Flavors { json } => list_flavors(&cfg, ListFlavorsArgs { json }).await,
        Commands::Characters { flavor, json } => {
            list_characters(&cfg, ListCharactersArgs { flavor, json }).await
        }
        Commands::Overwrite {
            source,
            target,
            source_flavor,
            target_flavor,
            dry_run,
        } => {
            overwrite_character(
                &config_path,
                &cfg,
                OverwriteArgs {
                    source,
                    target,
                    source_flavor,
                    target_flavor,
                    dry_run,
                },
            )
            .await
        }
    }
}
