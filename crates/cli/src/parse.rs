//! ArgMatches → CliAction conversion.

use std::path::PathBuf;

use clap::ArgMatches;
use rollout_kv::{Config, DurabilityName};

/// Store directory used when neither flags, env nor config name one.
pub const DEFAULT_PATH: &str = ".rollout-kv";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Set { key: String, value: String },
    Get { key: String },
    Remove { key: String },
    Keys { prefix: Option<String> },
    Compact,
    Describe,
    Invoke { method: String, args: Vec<String> },
}

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub path: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub durability: Option<String>,
    pub json: bool,
    pub verbose: u8,
}

impl GlobalOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            path: matches.get_one::<String>("path").map(PathBuf::from),
            config: matches.get_one::<String>("config").map(PathBuf::from),
            durability: matches.get_one::<String>("durability").cloned(),
            json: matches.get_flag("json"),
            verbose: matches.get_count("verbose"),
        }
    }

    /// Layer defaults, config file, environment and flags, in that order.
    pub fn load_config<F>(&self, env: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.config {
            Some(file) => Config::from_file(file)?,
            None => Config::default(),
        };
        config.apply_env_from(env)?;

        if let Some(path) = &self.path {
            config.path = Some(path.clone());
        }
        if let Some(name) = &self.durability {
            config.durability = name
                .parse::<DurabilityName>()
                .map_err(anyhow::Error::msg)?;
        }
        if config.path.is_none() {
            config.path = Some(PathBuf::from(DEFAULT_PATH));
        }
        Ok(config)
    }
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "set" => Ok(CliAction::Set {
            key: required(m, "key")?,
            value: required(m, "value")?,
        }),
        "get" => Ok(CliAction::Get {
            key: required(m, "key")?,
        }),
        "remove" => Ok(CliAction::Remove {
            key: required(m, "key")?,
        }),
        "keys" => Ok(CliAction::Keys {
            prefix: m.get_one::<String>("prefix").cloned(),
        }),
        "compact" => Ok(CliAction::Compact),
        "describe" => Ok(CliAction::Describe),
        "invoke" => Ok(CliAction::Invoke {
            method: required(m, "method")?,
            args: m
                .get_many::<String>("args")
                .map(|vals| vals.cloned().collect())
                .unwrap_or_default(),
        }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn required(m: &ArgMatches, name: &str) -> Result<String, String> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("missing argument: {}", name))
}
