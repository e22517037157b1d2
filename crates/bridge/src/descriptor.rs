//! The exported surface of the module.
//!
//! Hosts without reflection discover the module through this table: one
//! entry per method with its parameter names and whether it returns a
//! promise. [`Method`] is the parsed form used by the dispatcher.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::BridgeError;

/// Name the module is registered under in the host runtime.
pub const MODULE_NAME: &str = "RolloutStorage";

/// How a method reports back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnKind {
    /// Fire-and-forget, no acknowledgment
    Void,
    /// Resolves with a value or rejects with a code and message
    Promise,
}

/// One exported method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodSpec {
    /// Method name as the host calls it
    pub name: &'static str,
    /// Parameter names, all strings
    pub params: &'static [&'static str],
    /// Return channel
    pub returns: ReturnKind,
}

impl MethodSpec {
    /// Number of arguments the method takes.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Every method the module exports, in declaration order.
pub const METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: "setItem",
        params: &["key", "value"],
        returns: ReturnKind::Void,
    },
    MethodSpec {
        name: "getItem",
        params: &["key"],
        returns: ReturnKind::Promise,
    },
    MethodSpec {
        name: "removeItem",
        params: &["key"],
        returns: ReturnKind::Void,
    },
];

/// Serializable description of the module for host discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    /// Module name
    pub name: &'static str,
    /// Exported methods
    pub methods: &'static [MethodSpec],
}

/// Describe the module.
pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: MODULE_NAME,
        methods: METHODS,
    }
}

/// A parsed method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `setItem(key, value)`
    SetItem,
    /// `getItem(key)`
    GetItem,
    /// `removeItem(key)`
    RemoveItem,
}

impl Method {
    /// Table entry for this method.
    pub fn spec(&self) -> &'static MethodSpec {
        match self {
            Method::SetItem => &METHODS[0],
            Method::GetItem => &METHODS[1],
            Method::RemoveItem => &METHODS[2],
        }
    }

    /// Method name as the host calls it.
    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Check if the method has no reply channel.
    pub fn is_void(&self) -> bool {
        self.spec().returns == ReturnKind::Void
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setItem" => Ok(Method::SetItem),
            "getItem" => Ok(Method::GetItem),
            "removeItem" => Ok(Method::RemoveItem),
            other => Err(BridgeError::UnknownMethod(other.to_string())),
        }
    }
}
