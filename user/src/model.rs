use authz::types::{Identity, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UserError};

/// Username the self-profile endpoint reserves for itself.
pub const RESERVED_USERNAME: &str = "me";

pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 254;

/// A registered account.
///
/// Accounts are created inactive at signup and activated by exchanging
/// the emailed confirmation code; accounts created through the admin
/// surface are active from the start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// ULID, stable for the lifetime of the account.
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The authorization view of this account.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            role: self.role,
            superuser: self.is_superuser,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.identity().is_admin()
    }

    pub fn is_moderator(&self) -> bool {
        self.identity().is_moderator()
    }
}

/// Fields accepted when creating an account through the admin surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

/// Admin-level partial update; may change the role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

/// Self-profile partial update. Identifier, username, email, and role
/// are deliberately absent; they are immutable through this path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

/// Usernames are non-empty, at most 150 characters, drawn from
/// letters, digits and `.@+-_`, and must not be the reserved value.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(UserError::Validation("username must not be empty".to_string()));
    }
    if username == RESERVED_USERNAME {
        return Err(UserError::Validation(format!(
            "'{RESERVED_USERNAME}' cannot be used as a username"
        )));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(UserError::Validation(format!(
            "username exceeds {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
    {
        return Err(UserError::Validation(format!(
            "username '{username}' contains invalid characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(UserError::Validation("invalid email address".to_string()));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(UserError::Validation("invalid email address".to_string()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(UserError::Validation("invalid email address".to_string()));
    }
    Ok(())
}
