use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("World of Warcraft directory is not configured")]
    #[diagnostic(
        code(config::root_not_configured),
        help("Run 'wtf-cli config set-root <path>' or 'wtf-cli config auto-detect'")
    )]
    RootNotConfigured,

    #[error("Not a World of Warcraft directory: {path}")]
    #[diagnostic(
        code(config::invalid_root),
        help("The directory must contain at least one client folder such as _retail_ or _classic_")
    )]
    InvalidWowRoot { path: Utf8PathBuf },

    #[error("Could not determine config path")]
    #[diagnostic(
        code(config::path_unavailable),
        help("Pass an explicit location with --config <path>")
    )]
    ConfigPathUnavailable,

    #[error("Failed to save config to {path}")]
    #[diagnostic(
        code(config::save_failed),
        help("Check file permissions and available disk space")
    )]
    ConfigSaveFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid character: {spec}")]
    #[diagnostic(
        code(character::invalid_spec),
        help("Characters are written as ACCOUNT/Realm/Name, e.g. ACC1/Stormrage/Arthas")
    )]
    InvalidCharacterSpec { spec: String },

    #[error("Character {spec} not found in {flavor}")]
    #[diagnostic(
        code(character::not_found),
        help("Run 'wtf-cli characters --flavor <flavor>' to list the known characters")
    )]
    CharacterNotFound { spec: String, flavor: String },

    #[error("Source and target are the same character")]
    #[diagnostic(code(overwrite::same_character))]
    SameCharacter,

    #[error(transparent)]
    #[diagnostic(code(wtf::core))]
    Core(#[from] wtf_core::Error),
}

impl CliError {
    pub fn invalid_character_spec(spec: impl Into<String>) -> Self {
        Self::InvalidCharacterSpec { spec: spec.into() }
    }

    pub fn character_not_found(spec: impl Into<String>, flavor: impl ToString) -> Self {
        Self::CharacterNotFound {
            spec: spec.into(),
            flavor: flavor.to_string(),
        }
    }

    pub fn config_save_failed(path: Utf8PathBuf, source: std::io::Error) -> Self {
        Self::ConfigSaveFailed { path, source }
    }
}
