use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(alias = "PRODUCTION_MANAGER")]
    Manager,
    #[default]
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::Operator => "OPERATOR",
        }
    }

    /// Create, edit any field of, and delete work orders.
    pub fn can_manage_work_orders(&self) -> bool {
        matches!(self, Role::Manager)
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Manager)
    }

    pub fn can_view_reports(&self) -> bool {
        matches!(self, Role::Manager)
    }

    /// Whether this role sees every work order rather than only its own assignments.
    pub fn sees_all_work_orders(&self) -> bool {
        matches!(self, Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANAGER" | "PRODUCTION_MANAGER" => Ok(Role::Manager),
            "OPERATOR" => Ok(Role::Operator),
            _ => Err(()),
        }
    }
}
