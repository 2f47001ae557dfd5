//! Command-line flags for the coach binary.

use crate::config::{Overrides, Provider};
use clap::Parser;
use std::path::PathBuf;

/// Interactive coach that plans a React project and teaches it stage by stage
#[derive(Debug, Parser)]
#[command(name = "coach", version, about)]
pub struct Cli {
    /// Use canned content instead of a language model (no API key needed)
    #[arg(long)]
    pub offline: bool,

    /// Chat model to request from the provider (overrides CHAT_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory of prompt templates overlaid on the built-in set
    #[arg(short, long, value_name = "DIR")]
    pub prompts: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.offline.then_some(Provider::Offline),
            chat_model: self.model.clone(),
            prompts_path: self.prompts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_no_overrides() {
        let cli = Cli::try_parse_from(["coach"]).unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.provider, None);
        assert_eq!(overrides.chat_model, None);
        assert_eq!(overrides.prompts_path, None);
    }

    #[test]
    fn flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "coach",
            "--offline",
            "--model",
            "gpt-4o",
            "--prompts",
            "./my-prompts",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.provider, Some(Provider::Offline));
        assert_eq!(overrides.chat_model.as_deref(), Some("gpt-4o"));
        assert_eq!(overrides.prompts_path, Some(PathBuf::from("./my-prompts")));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["coach", "--turbo"]).is_err());
    }
}
