use chrono::{DateTime, Utc};
use serde::Serialize;

/// Dashboard account, created by an admin or on first Discord login.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Internal identifier stored in the session
    pub id: String,
    /// Unique across all users
    pub username: String,
    /// Argon2 PHC string; Discord-only accounts have none
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Discord user id for accounts created through OAuth
    pub discord_id: Option<String>,
    /// Credit balance, randomly seeded on first Discord login
    pub discord_credits: i64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The single authorization predicate for admin-only routes.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

/// Fields needed to insert a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password_hash: Option<String>,
    pub discord_id: Option<String>,
    pub discord_credits: i64,
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            password_hash: Some("$argon2id$v=19$secret".to_string()),
            discord_id: None,
            discord_credits: 0,
            is_admin: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains(r#""username":"alice""#));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }
}
