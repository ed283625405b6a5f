//! Account storage on the shared database pool.

use authz::types::Role;
use chrono::{DateTime, Utc};
use database::Database;
use sqlx::FromRow;
use tracing::info;
use ulid::Ulid;

use crate::error::{Result, UserError};
use crate::model::{validate_email, validate_username, NewUser, ProfilePatch, User, UserPatch};

/// Raw row shape; the role column is parsed into the closed enum on the
/// way out so the rest of the system never sees a free-form string.
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    bio: String,
    role: String,
    is_superuser: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<User> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: authz::types::InvalidRole| UserError::Validation(e.to_string()))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            bio: row.bio,
            role,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const SELECT_USER: &str = "SELECT id, username, email, first_name, last_name, bio, role, \
     is_superuser, is_active, created_at FROM users";

pub struct UserStore<'a> {
    db: &'a Database,
}

impl<'a> UserStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new account. `active` distinguishes admin-created
    /// accounts (usable immediately) from signups awaiting confirmation.
    pub async fn create(&self, new: NewUser, active: bool) -> Result<User> {
        validate_username(&new.username)?;
        validate_email(&new.email)?;

        let id = Ulid::new().to_string();
        let role = new.role.unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, bio, role,
                               is_superuser, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(new.first_name.as_deref().unwrap_or(""))
        .bind(new.last_name.as_deref().unwrap_or(""))
        .bind(new.bio.as_deref().unwrap_or(""))
        .bind(role.as_str())
        .bind(active)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if database::DatabaseError::is_unique_violation(&e) {
                UserError::Conflict("username or email already in use".to_string())
            } else {
                e.into()
            }
        })?;

        info!("Created user {} ({})", new.username, id);

        self.get_by_id(&id).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.map(User::try_from).transpose()
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE username = ?");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;
        row.map(User::try_from).transpose()
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))
    }

    pub async fn email_in_use(&self, email: &str) -> Result<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
                .bind(email)
                .fetch_one(self.db.pool())
                .await?,
        )
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let sql = format!("{SELECT_USER} ORDER BY username LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?)
    }

    /// Admin-level update; the only path that may change a role.
    pub async fn update(&self, username: &str, patch: UserPatch) -> Result<User> {
        let current = self.get_by_username(username).await?;

        let email = patch.email.unwrap_or(current.email);
        validate_email(&email)?;
        let first_name = patch.first_name.unwrap_or(current.first_name);
        let last_name = patch.last_name.unwrap_or(current.last_name);
        let bio = patch.bio.unwrap_or(current.bio);
        let role = patch.role.unwrap_or(current.role);

        sqlx::query(
            "UPDATE users SET email = ?, first_name = ?, last_name = ?, bio = ?, role = ? WHERE id = ?",
        )
        .bind(&email)
        .bind(&first_name)
        .bind(&last_name)
        .bind(&bio)
        .bind(role.as_str())
        .bind(&current.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if database::DatabaseError::is_unique_violation(&e) {
                UserError::Conflict("email already in use".to_string())
            } else {
                e.into()
            }
        })?;

        self.get_by_id(&current.id).await
    }

    /// Self-profile update; restricted to the mutable profile fields.
    pub async fn update_profile(&self, id: &str, patch: ProfilePatch) -> Result<User> {
        let current = self.get_by_id(id).await?;

        let first_name = patch.first_name.unwrap_or(current.first_name);
        let last_name = patch.last_name.unwrap_or(current.last_name);
        let bio = patch.bio.unwrap_or(current.bio);

        sqlx::query("UPDATE users SET first_name = ?, last_name = ?, bio = ? WHERE id = ?")
            .bind(&first_name)
            .bind(&last_name)
            .bind(&bio)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        self.get_by_id(id).await
    }

    pub async fn activate(&self, id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET is_active = 1 WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::NotFound("user".to_string()));
        }
        info!("Activated user {}", id);
        Ok(())
    }

    pub async fn delete_by_username(&self, username: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::NotFound("user".to_string()));
        }
        info!("Deleted user {}", username);
        Ok(())
    }
}
