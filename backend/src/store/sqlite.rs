use std::path::Path;
use std::sync::Mutex;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str =
    "id, username, password_hash, discord_id, discord_credits, is_admin, created_at";

/// SQLite-backed user store.
pub struct UserStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Already exists: {0}")]
    Conflict(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, ref msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            other => StoreError::DatabaseError(other.to_string()),
        }
    }
}

impl UserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::IoError(e.to_string()))?;
            }
            Connection::open(path)?
        };

        // Uniqueness lives in the schema so concurrent creates cannot both win
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT,
                discord_id TEXT UNIQUE,
                discord_credits INTEGER NOT NULL DEFAULT 0,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    /// Insert a user. A taken username or Discord id yields [`StoreError::Conflict`].
    pub fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let conn = self.lock()?;
        insert_user(&conn, new_user)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        find_one(&conn, "id", id)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        find_one(&conn, "username", username)
    }

    pub fn find_by_discord_id(&self, discord_id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        find_one(&conn, "discord_id", discord_id)
    }

    /// Find the user linked to a Discord id, creating it when absent.
    ///
    /// Returns the user and whether it was created. Lookup and insert happen
    /// under one connection lock.
    pub fn find_or_create_discord_user(
        &self,
        discord_id: &str,
        username: &str,
        initial_credits: i64,
    ) -> Result<(User, bool), StoreError> {
        let conn = self.lock()?;

        if let Some(user) = find_one(&conn, "discord_id", discord_id)? {
            return Ok((user, false));
        }

        let user = insert_user(
            &conn,
            NewUser {
                username: username.to_string(),
                password_hash: None,
                discord_id: Some(discord_id.to_string()),
                discord_credits: initial_credits,
                is_admin: false,
            },
        )?;

        Ok((user, true))
    }

    /// All users, oldest first.
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC, username ASC",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }
}

fn insert_user(conn: &Connection, new_user: NewUser) -> Result<User, StoreError> {
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: new_user.username,
        password_hash: new_user.password_hash,
        discord_id: new_user.discord_id,
        discord_credits: new_user.discord_credits,
        is_admin: new_user.is_admin,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO users (id, username, password_hash, discord_id, discord_credits, is_admin, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            user.username,
            user.password_hash,
            user.discord_id,
            user.discord_credits,
            user.is_admin as i32,
            user.created_at.to_rfc3339(),
        ],
    )?;

    tracing::info!(
        "Created user: {} (admin: {}, discord: {})",
        user.username,
        user.is_admin,
        user.discord_id.as_deref().unwrap_or("none")
    );

    Ok(user)
}

/// `column` is always one of our own literals, never user input.
fn find_one(conn: &Connection, column: &str, value: &str) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column),
            params![value],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        discord_id: row.get(3)?,
        discord_credits: row.get(4)?,
        is_admin: row.get::<_, i32>(5)? != 0,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> UserStore {
        UserStore::new(":memory:").unwrap()
    }

    fn local_user(username: &str, is_admin: bool) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: Some("hash".to_string()),
            is_admin,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_find_user() {
        let store = store();
        let created = store.create_user(local_user("alice", true)).unwrap();

        let by_id = store.find_by_id(&created.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(by_id.is_admin);
        assert_eq!(by_id.password_hash.as_deref(), Some("hash"));

        let by_name = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let store = store();
        store.create_user(local_user("alice", false)).unwrap();
        let result = store.create_user(local_user("alice", true));
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_find_missing_user() {
        let store = store();
        assert!(store.find_by_id("nope").unwrap().is_none());
        assert!(store.find_by_username("nope").unwrap().is_none());
        assert!(store.find_by_discord_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_find_or_create_discord_user_is_idempotent() {
        let store = store();
        let (first, created) = store.find_or_create_discord_user("d-1", "gamer", 42).unwrap();
        assert!(created);
        assert_eq!(first.discord_credits, 42);
        assert!(!first.is_admin);
        assert!(first.password_hash.is_none());

        let (second, created) = store.find_or_create_discord_user("d-1", "gamer", 7).unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.discord_credits, 42);
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_discord_username_clash_is_conflict() {
        let store = store();
        store.create_user(local_user("gamer", false)).unwrap();
        let result = store.find_or_create_discord_user("d-2", "gamer", 1);
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn test_list_users() {
        let store = store();
        store.create_user(local_user("alice", true)).unwrap();
        store.create_user(local_user("bob", false)).unwrap();
        let names: Vec<String> = store
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"alice".to_string()));
        assert!(names.contains(&"bob".to_string()));
    }

    #[test]
    fn test_corrupt_created_at_is_error() {
        let store = store();
        let user = store.create_user(local_user("alice", false)).unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE users SET created_at = 'yesterday' WHERE id = ?1",
                params![user.id],
            )
            .unwrap();

        assert!(matches!(
            store.find_by_id(&user.id),
            Err(StoreError::DatabaseError(_))
        ));
        assert!(store.list_users().is_err());
    }

    #[test]
    fn test_file_database_creates_parent_dir() {
        let dir = std::env::temp_dir().join(format!("crazedash-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("users.db");
        let url = format!("sqlite:{}", path.display());

        let store = UserStore::new(&url).unwrap();
        store.create_user(local_user("alice", false)).unwrap();
        drop(store);

        let reopened = UserStore::new(&url).unwrap();
        assert!(reopened.find_by_username("alice").unwrap().is_some());

        let _ = std::fs::remove_dir_all(dir);
    }
}
