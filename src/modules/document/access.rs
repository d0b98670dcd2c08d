use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Level granted to a non-owner through a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    View,
    Edit,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Edit => "edit",
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Permission::View),
            "edit" => Ok(Permission::Edit),
            other => Err(format!("Unknown permission '{other}'")),
        }
    }
}

/// What a given user may do with a given document, derived fresh from the
/// documents and document_shares tables on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    Shared(Permission),
    Denied,
}

impl Access {
    pub fn resolve(owner_id: &uuid::Uuid, user_id: &uuid::Uuid, share: Option<Permission>) -> Self {
        if owner_id == user_id {
            return Access::Owner;
        }
        match share {
            Some(permission) => Access::Shared(permission),
            None => Access::Denied,
        }
    }

    /// Owner or any share.
    pub fn can_read(&self) -> bool {
        !matches!(self, Access::Denied)
    }

    /// Owner or an edit share.
    pub fn can_write(&self) -> bool {
        matches!(self, Access::Owner | Access::Shared(Permission::Edit))
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Access::Owner)
    }
}
