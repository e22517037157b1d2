//! rollout-kv CLI: inspect and edit a store from the shell.
//!
//! `rollout-kv [--path DIR] [--config FILE] [--json] [-v...] COMMAND`
//!
//! Exit codes: 0 on success, 1 when `get` finds nothing or an invoked
//! promise rejects, 2 on any other error.

mod commands;
mod format;
mod parse;

use std::process;

use anyhow::Context;
use rollout_kv::{Invocation, RolloutKv};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{
    format_compaction, format_descriptor, format_error, format_invocation, format_keys,
    format_removed, format_value, OutputMode,
};
use parse::{matches_to_action, CliAction, GlobalOptions};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "ROLLOUT_KV_LOG";

fn main() {
    let matches = build_cli().get_matches();
    let opts = GlobalOptions::from_matches(&matches);
    init_tracing(opts.verbose);

    let mode = if opts.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let code = match matches_to_action(&matches)
        .map_err(anyhow::Error::msg)
        .and_then(|action| run(&opts, action, mode))
    {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            2
        }
    };
    process::exit(code);
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(opts: &GlobalOptions, action: CliAction, mode: OutputMode) -> anyhow::Result<i32> {
    if action == CliAction::Describe {
        println!("{}", format_descriptor(&rollout_kv::descriptor(), mode));
        return Ok(0);
    }

    let config = opts.load_config(|var| std::env::var(var).ok())?;
    debug!(?action, path = ?config.path, durability = ?config.durability, "Running command");
    let kv = RolloutKv::from_config(&config).with_context(|| {
        format!(
            "failed to open store at {}",
            config
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        )
    })?;

    let code = match action {
        CliAction::Set { key, value } => {
            kv.set(&key, &value)?;
            if mode == OutputMode::Human {
                println!("OK");
            }
            0
        }
        CliAction::Get { key } => {
            let value = kv.get(&key)?;
            println!("{}", format_value(&key, value.as_deref(), mode));
            if value.is_some() {
                0
            } else {
                1
            }
        }
        CliAction::Remove { key } => {
            let existed = kv.remove(&key)?;
            println!("{}", format_removed(&key, existed, mode));
            0
        }
        CliAction::Keys { prefix } => {
            let mut keys = kv.keys()?;
            if let Some(prefix) = prefix {
                keys.retain(|k| k.starts_with(&prefix));
            }
            println!("{}", format_keys(&keys, mode));
            0
        }
        CliAction::Compact => {
            let stats = kv.compact()?;
            println!("{}", format_compaction(&stats, mode));
            0
        }
        CliAction::Invoke { method, args } => {
            let invocation = invoke(&kv, &method, args)?;
            println!("{}", format_invocation(&invocation, mode));
            match invocation {
                Invocation::Rejected { .. } => 1,
                _ => 0,
            }
        }
        CliAction::Describe => 0,
    };

    kv.close()?;
    Ok(code)
}

/// Call a bridge method by name and wait for the module to drain.
fn invoke(kv: &RolloutKv, method: &str, args: Vec<String>) -> anyhow::Result<Invocation> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let storage = kv.bridge()?;
    let args = Value::from(args);

    runtime.block_on(async {
        let invocation = storage.invoke(method, &args).await;
        storage.shutdown().await?;
        Ok::<_, anyhow::Error>(invocation)
    })
}
