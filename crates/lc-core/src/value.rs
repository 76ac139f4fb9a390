use serde::{Deserialize, Serialize};

/// Reply shape of the backing store, after Redis' Lua -> RESP conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Nil,
    Integer(i64),
    Bulk(String),
    Array(Vec<StoreValue>),
    Status { ok: String },
}

impl StoreValue {
    pub fn bulk(value: impl Into<String>) -> Self {
        Self::Bulk(value.into())
    }

    pub fn status(value: impl Into<String>) -> Self {
        Self::Status { ok: value.into() }
    }

    pub fn as_bulk(&self) -> Option<&str> {
        match self {
            Self::Bulk(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Integer(_) => "integer",
            Self::Bulk(_) => "bulk",
            Self::Array(_) => "array",
            Self::Status { .. } => "status",
        }
    }
}
