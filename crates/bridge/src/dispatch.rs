//! Dispatch table: call exported methods by name.
//!
//! The host passes a method name and a JSON array of arguments; the reply
//! is an [`Invocation`] the host maps onto its own callback/promise types.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::descriptor::Method;
use crate::error::BridgeError;
use crate::module::RolloutStorage;
use crate::worker::Counters;

/// Outcome of a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Invocation {
    /// Fire-and-forget method accepted; nothing to deliver
    Void,
    /// Promise resolved; `value` is a string or `null` for absence
    Resolved {
        /// Resolved value
        value: Value,
    },
    /// Promise rejected
    Rejected {
        /// Stable error code (`E_STORAGE`, `E_SHUTDOWN`, ...)
        code: String,
        /// Human-readable message
        message: String,
    },
}

impl Invocation {
    fn rejected(error: &BridgeError) -> Self {
        Invocation::Rejected {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl RolloutStorage {
    /// Call an exported method by name.
    ///
    /// `args` must be a JSON array of strings matching the method's
    /// parameters. Unknown methods are rejected. Bad arguments reject a
    /// promise method; for a fire-and-forget method they are logged, counted
    /// in [`BridgeStats::failures`](crate::BridgeStats::failures) and the
    /// call is dropped, since that method has no channel to report on.
    pub async fn invoke(&self, method: &str, args: &Value) -> Invocation {
        let method = match method.parse::<Method>() {
            Ok(m) => m,
            Err(e) => return Invocation::rejected(&e),
        };

        let mut args = match string_args(method, args) {
            Ok(args) => args.into_iter(),
            Err(e) if method.is_void() => {
                Counters::bump(&self.counters.failures);
                warn!(method = %method, error = %e, "Dropping call with invalid arguments");
                return Invocation::Void;
            }
            Err(e) => return Invocation::rejected(&e),
        };
        let mut next = || args.next().unwrap_or_default();

        match method {
            Method::SetItem => {
                let key = next();
                let value = next();
                self.set_item(key, value);
                Invocation::Void
            }
            Method::RemoveItem => {
                self.remove_item(next());
                Invocation::Void
            }
            Method::GetItem => match self.get_item(next()).await {
                Ok(Some(value)) => Invocation::Resolved {
                    value: Value::String(value),
                },
                Ok(None) => Invocation::Resolved { value: Value::Null },
                Err(e) => Invocation::rejected(&e),
            },
        }
    }
}

/// Check `args` against the method's arity and extract the strings.
fn string_args(method: Method, args: &Value) -> Result<Vec<String>, BridgeError> {
    let invalid = |reason: String| BridgeError::InvalidArguments {
        method: method.name().to_string(),
        reason,
    };

    let array = args
        .as_array()
        .ok_or_else(|| invalid("arguments must be an array".to_string()))?;

    let arity = method.spec().arity();
    if array.len() != arity {
        return Err(invalid(format!(
            "expected {} argument(s), got {}",
            arity,
            array.len()
        )));
    }

    array
        .iter()
        .zip(method.spec().params)
        .map(|(arg, name)| {
            arg.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(format!("'{}' must be a string", name)))
        })
        .collect()
}
