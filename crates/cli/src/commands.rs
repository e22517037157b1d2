//! clap command tree.

use clap::{Arg, ArgAction, Command};

/// Build the top-level `rollout-kv` command.
pub fn build_cli() -> Command {
    Command::new("rollout-kv")
        .about("Inspect and edit a rollout-kv store")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .long("path")
                .short('p')
                .global(true)
                .value_name("DIR")
                .help("Store directory (overrides config and ROLLOUT_KV_PATH)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("durability")
                .long("durability")
                .global(true)
                .value_parser(["none", "strict", "batched"])
                .help("Durability mode (overrides config and ROLLOUT_KV_DURABILITY)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("set")
                .about("Write a value")
                .arg(Arg::new("key").required(true))
                .arg(Arg::new("value").required(true)),
        )
        .subcommand(
            Command::new("get")
                .about("Read a value (exit code 1 if absent)")
                .arg(Arg::new("key").required(true)),
        )
        .subcommand(
            Command::new("remove")
                .visible_alias("rm")
                .about("Delete a key (no-op if absent)")
                .arg(Arg::new("key").required(true)),
        )
        .subcommand(
            Command::new("keys").about("List keys").arg(
                Arg::new("prefix")
                    .long("prefix")
                    .value_name("PREFIX")
                    .help("Only keys starting with PREFIX"),
            ),
        )
        .subcommand(Command::new("compact").about("Rewrite the log to hold only live entries"))
        .subcommand(Command::new("describe").about("Print the bridge module descriptor"))
        .subcommand(
            Command::new("invoke")
                .about("Call a bridge method by name, e.g. `invoke getItem rollout:percent`")
                .arg(Arg::new("method").required(true))
                .arg(Arg::new("args").num_args(0..).action(ArgAction::Append)),
        )
}
