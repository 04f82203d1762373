use serde::{Deserialize, Serialize};
use super::role::Role;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// The decoded caller of a request.
///
/// `expired` is set instead of failing so that callers can tell a stale token
/// apart from a forged or garbled one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub expired: bool,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}
