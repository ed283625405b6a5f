//! Signup and confirmation-code exchange.
//!
//! Signing up creates an inactive account and emails it a single-use,
//! expiring confirmation code. Exchanging the code activates the
//! account. Email dispatch is best effort: a delivery failure is logged
//! and swallowed so the signup call itself still succeeds, and a repeat
//! signup for the same (username, email) pair issues a fresh code.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use chrono::{DateTime, Duration, Utc};
use database::Database;
use rand::Rng;
use sqlx::Row;
use std::sync::Arc;
use tracing::{info, warn};
use ulid::Ulid;

use crate::error::{Result, UserError};
use crate::mailer::Mailer;
use crate::model::{validate_email, validate_username, NewUser, User};
use crate::store::UserStore;

const DEFAULT_CODE_TTL_MINUTES: i64 = 1440;

#[derive(Debug, Clone)]
pub struct SignupConfig {
    /// How long a confirmation code stays valid.
    pub code_ttl_minutes: i64,
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
        }
    }
}

pub struct SignupManager {
    mailer: Arc<Mailer>,
    config: SignupConfig,
}

impl SignupManager {
    pub fn new(mailer: Mailer, config: SignupConfig) -> Self {
        Self {
            mailer: Arc::new(mailer),
            config,
        }
    }

    /// Generate a secure random confirmation code
    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes);
        BASE64.encode(bytes)
    }

    /// Register (or re-register) an account and dispatch a confirmation
    /// code to its email address.
    pub async fn signup(&self, db: &Database, username: &str, email: &str) -> Result<User> {
        validate_username(username)?;
        validate_email(email)?;

        let store = UserStore::new(db);

        let user = match store.find_by_username(username).await? {
            // Same pair as an earlier signup: re-issue a code.
            Some(user) if user.email == email => user,
            Some(_) => {
                return Err(UserError::Validation(
                    "username already registered with a different email".to_string(),
                ))
            }
            None => {
                if store.email_in_use(email).await? {
                    return Err(UserError::Validation("email already in use".to_string()));
                }
                store
                    .create(
                        NewUser {
                            username: username.to_string(),
                            email: email.to_string(),
                            ..Default::default()
                        },
                        false,
                    )
                    .await?
            }
        };

        let code = Self::generate_code();
        let expires_at = Utc::now() + Duration::minutes(self.config.code_ttl_minutes);

        sqlx::query(
            r#"
            INSERT INTO confirmation_codes (id, user_id, code, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Ulid::new().to_string())
        .bind(&user.id)
        .bind(&code)
        .bind(expires_at)
        .bind(false)
        .bind(Utc::now())
        .execute(db.pool())
        .await?;

        // Delivery is best effort and must not hold up the signup; the
        // stored code stays valid either way.
        let mailer = Arc::clone(&self.mailer);
        let to_email = email.to_string();
        let to_username = username.to_string();
        let outbound_code = code.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_confirmation_code(&to_email, &to_username, &outbound_code)
                .await
            {
                warn!("Failed to deliver confirmation code to {}: {}", to_email, e);
            }
        });

        info!("Signup recorded for {}", username);
        Ok(user)
    }

    /// Exchange a confirmation code: validates it against the account's
    /// stored codes, activates the account, and burns the code.
    pub async fn confirm(&self, db: &Database, username: &str, code: &str) -> Result<User> {
        let store = UserStore::new(db);
        let user = store.get_by_username(username).await?;

        let row = sqlx::query(
            "SELECT id, expires_at, used FROM confirmation_codes WHERE user_id = ? AND code = ?",
        )
        .bind(&user.id)
        .bind(code)
        .fetch_optional(db.pool())
        .await?;

        let Some(row) = row else {
            warn!("Invalid confirmation code for {}", username);
            return Err(UserError::Validation(
                "invalid confirmation code".to_string(),
            ));
        };

        let code_id: String = row.get("id");
        let expires_at: DateTime<Utc> = row.get("expires_at");
        let used: bool = row.get("used");

        if used {
            return Err(UserError::Validation(
                "confirmation code already used".to_string(),
            ));
        }
        if expires_at < Utc::now() {
            return Err(UserError::Validation(
                "confirmation code expired".to_string(),
            ));
        }

        sqlx::query("UPDATE confirmation_codes SET used = 1 WHERE id = ?")
            .bind(&code_id)
            .execute(db.pool())
            .await?;

        store.activate(&user.id).await?;

        info!("Confirmed signup for {}", username);
        store.get_by_id(&user.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MailerConfig;
    use database::{initialize_database, DatabaseConfig};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn fresh_database() -> (TempDir, Arc<Database>) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_signup.db");
        let db = initialize_database(DatabaseConfig::new_with_path(db_path))
            .await
            .unwrap();
        (temp_dir, db)
    }

    // The default mailer points at localhost:1025 where nothing listens
    // in the test environment, so every dispatch fails; signups must
    // succeed regardless.
    fn manager() -> SignupManager {
        SignupManager::new(Mailer::new(MailerConfig::default()), SignupConfig::default())
    }

    async fn stored_code(db: &Database, user_id: &str) -> String {
        sqlx::query_scalar(
            "SELECT code FROM confirmation_codes WHERE user_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn signup_rejects_the_reserved_username() {
        let (_guard, db) = fresh_database().await;
        let err = manager()
            .signup(&db, "me", "me@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn signup_survives_mail_failure_and_stores_a_code() {
        let (_guard, db) = fresh_database().await;
        let user = manager()
            .signup(&db, "jane", "jane@example.com")
            .await
            .unwrap();

        assert!(!user.is_active);
        let code = stored_code(&db, &user.id).await;
        assert!(!code.is_empty());
    }

    #[tokio::test]
    async fn repeat_signup_reissues_for_the_same_pair_only() {
        let (_guard, db) = fresh_database().await;
        let manager = manager();

        let first = manager.signup(&db, "jane", "jane@example.com").await.unwrap();
        let second = manager.signup(&db, "jane", "jane@example.com").await.unwrap();
        assert_eq!(first.id, second.id);

        let codes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM confirmation_codes WHERE user_id = ?")
                .bind(&first.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(codes, 2);

        let err = manager
            .signup(&db, "jane", "other@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));

        let err = manager
            .signup(&db, "janet", "jane@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn confirmation_activates_and_burns_the_code() {
        let (_guard, db) = fresh_database().await;
        let manager = manager();

        let user = manager.signup(&db, "jane", "jane@example.com").await.unwrap();
        let code = stored_code(&db, &user.id).await;

        let confirmed = manager.confirm(&db, "jane", &code).await.unwrap();
        assert!(confirmed.is_active);

        // Second exchange of the same code fails.
        let err = manager.confirm(&db, "jane", &code).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn confirmation_rejects_bad_inputs() {
        let (_guard, db) = fresh_database().await;
        let manager = manager();
        manager.signup(&db, "jane", "jane@example.com").await.unwrap();

        let err = manager.confirm(&db, "jane", "wrong-code").await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));

        let err = manager.confirm(&db, "ghost", "whatever").await.unwrap_err();
        assert!(matches!(err, UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_codes_are_rejected() {
        let (_guard, db) = fresh_database().await;
        let manager = SignupManager::new(
            Mailer::new(MailerConfig::default()),
            SignupConfig {
                code_ttl_minutes: -5,
            },
        );

        let user = manager.signup(&db, "jane", "jane@example.com").await.unwrap();
        let code = stored_code(&db, &user.id).await;

        let err = manager.confirm(&db, "jane", &code).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }
}
