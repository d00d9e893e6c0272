//! User and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A platform user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A role grouping permission strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub is_system_role: bool,
}

/// Build the canonical `module:action` permission string
pub fn permission_key(module: &str, action: &str) -> String {
    format!("{}:{}", module, action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_key() {
        assert_eq!(permission_key("stock", "reserve"), "stock:reserve");
        assert_eq!(permission_key("pedidos", "receive"), "pedidos:receive");
    }
}
