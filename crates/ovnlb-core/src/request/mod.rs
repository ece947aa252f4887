// ── Change requests ──
//
// The only output of the driver: a tagged operation plus a flat attribute
// map, handed to the asynchronous applier that writes the backend.
// Immutable once built.

pub mod normalize;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Backend operation tags understood by the applier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LbCreate,
    LbSync,
    LbUpdate,
    LbDelete,
    ListenerCreate,
    ListenerSync,
    ListenerUpdate,
    ListenerDelete,
    PoolCreate,
    PoolSync,
    PoolUpdate,
    PoolDelete,
    MemberCreate,
    MemberSync,
    MemberUpdate,
    MemberDelete,
    HandleMemberDvr,
    HmCreate,
    HmSync,
    HmUpdate,
    HmDelete,
    HmPurge,
    VipFipSync,
}

/// `action` attribute of a `handle_member_dvr` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DvrAction {
    MemberAdded,
    MemberDeleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    #[serde(rename = "type")]
    op: Operation,
    info: Map<String, Value>,
}

impl ChangeRequest {
    pub(crate) fn new(op: Operation, info: Value) -> Self {
        let info = match info {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { op, info }
    }

    /// Add an attribute while the request is still being built.
    pub(crate) fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.info.insert(key.to_owned(), value.into());
        self
    }

    pub fn op(&self) -> Operation {
        self.op
    }

    pub fn info(&self) -> &Map<String, Value> {
        &self.info
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.info.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Attribute keys in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        self.info.keys().map(String::as_str).collect()
    }
}
