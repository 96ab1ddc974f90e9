//! Domain identifiers.
//!
//! - **ActiveObjectId**: ULID ベース。`IdGenerator` で生成する（シード固定でテスト可能）
//! - **CommandSeq**: worker が実行順に振る連番。ログの相関に使う

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identity of one active object instance (and therefore of its single worker).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActiveObjectId(Ulid);

impl ActiveObjectId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for ActiveObjectId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for ActiveObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ao-{}", self.0)
    }
}

/// Position of a command in the worker's execution order (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandSeq(u64);

impl CommandSeq {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}
