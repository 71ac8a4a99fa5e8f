//! Transport declarations for packages and remotes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How a client talks to a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    /// Transport type.
    #[serde(rename = "type")]
    pub transport_type: TransportType,

    /// Endpoint for network transports. May contain `{name}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Header declarations, opaque to this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Value>>,

    /// Inputs that fill the URL placeholders, keyed by placeholder name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, Input>>,

    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Transport type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    /// Local process over stdin/stdout.
    #[serde(rename = "stdio")]
    Stdio,
    /// Streamable HTTP.
    #[serde(rename = "streamable-http")]
    StreamableHttp,
    /// Server-sent events.
    #[serde(rename = "sse")]
    Sse,
}

/// A user-supplied input such as a URL variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_secret: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Transport {
    /// The implicit transport of a package that declares none.
    pub fn stdio() -> Self {
        Self::new(TransportType::Stdio, None)
    }

    /// A transport with the given type and optional URL.
    pub fn new(transport_type: TransportType, url: Option<String>) -> Self {
        Self {
            transport_type,
            url,
            headers: None,
            variables: None,
            extra: Map::new(),
        }
    }

    /// Declare a URL variable.
    pub fn with_variable(mut self, name: impl Into<String>, input: Input) -> Self {
        self.variables
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), input);
        self
    }

    /// Names declared in `variables`.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .flat_map(|vars| vars.keys().map(String::as_str))
    }
}

impl TransportType {
    /// Whether this transport needs a URL.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::StreamableHttp | Self::Sse)
    }
}

impl Input {
    /// An input with only a description.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            is_required: None,
            is_secret: None,
            default: None,
            format: None,
            choices: None,
            extra: Map::new(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::StreamableHttp => write!(f, "streamable-http"),
            Self::Sse => write!(f, "sse"),
        }
    }
}
