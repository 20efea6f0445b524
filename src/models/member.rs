//! Registered library members.

use super::{default_true, Model};
use crate::types::MEMBERS;
use serde::{Deserialize, Serialize};

/// A registered member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub member_id: String,
    pub name: String,
    pub email: String,

    /// Inactive members cannot borrow.
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Member {
    pub const MEMBER_ID: &'static str = "memberId";
    pub const ACTIVE: &'static str = "active";

    /// A new, active member.
    pub fn new(
        member_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            name: name.into(),
            email: email.into(),
            active: true,
        }
    }
}

impl Model for Member {
    const COLLECTION: &'static str = MEMBERS;
    const KEY_FIELD: &'static str = Self::MEMBER_ID;

    fn key(&self) -> &str {
        &self.member_id
    }
}
