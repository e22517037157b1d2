//! Output formatting for human and JSON modes.

use rollout_kv::{CompactionStats, Invocation, ModuleDescriptor};
use serde_json::{json, Value};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn format_value(key: &str, value: Option<&str>, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "key": key, "value": value }).to_string(),
        OutputMode::Human => match value {
            Some(v) => v.to_string(),
            None => "(nil)".to_string(),
        },
    }
}

pub fn format_removed(key: &str, existed: bool, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "key": key, "removed": existed }).to_string(),
        OutputMode::Human => format!("(integer) {}", u8::from(existed)),
    }
}

pub fn format_keys(keys: &[String], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => Value::from(keys.to_vec()).to_string(),
        OutputMode::Human if keys.is_empty() => "(empty)".to_string(),
        OutputMode::Human => keys
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{}) {}", i + 1, k))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn format_compaction(stats: &CompactionStats, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({
            "bytes_before": stats.bytes_before,
            "bytes_after": stats.bytes_after,
            "live_keys": stats.live_keys,
        })
        .to_string(),
        OutputMode::Human => format!(
            "Compacted {} -> {} bytes ({} live keys)",
            stats.bytes_before, stats.bytes_after, stats.live_keys
        ),
    }
}

pub fn format_descriptor(descriptor: &ModuleDescriptor, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!(descriptor).to_string(),
        OutputMode::Human => {
            let mut out = descriptor.name.to_string();
            for method in descriptor.methods {
                out.push_str(&format!(
                    "\n  {}({}) -> {:?}",
                    method.name,
                    method.params.join(", "),
                    method.returns
                ));
            }
            out
        }
    }
}

pub fn format_invocation(invocation: &Invocation, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!(invocation).to_string(),
        OutputMode::Human => match invocation {
            Invocation::Void => "OK".to_string(),
            Invocation::Resolved { value: Value::Null } => "(nil)".to_string(),
            Invocation::Resolved {
                value: Value::String(s),
            } => s.clone(),
            Invocation::Resolved { value } => value.to_string(),
            Invocation::Rejected { code, message } => format!("(error) {}: {}", code, message),
        },
    }
}

pub fn format_error(error: &anyhow::Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "error": format!("{:#}", error) }).to_string(),
        OutputMode::Human => format!("(error) {:#}", error),
    }
}
