use crate::{Database, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Database initialization configuration
pub struct DatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Whether to create tables on initialization
    pub create_tables: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/marginalia.db"),
            create_tables: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new database configuration with a specific database path
    pub fn new_with_path(database_path: PathBuf) -> Self {
        Self {
            database_path,
            create_tables: true,
        }
    }

    /// Set whether to create tables on initialization
    pub fn with_create_tables(mut self, create: bool) -> Self {
        self.create_tables = create;
        self
    }
}

/// Initialize the database with the given configuration
pub async fn initialize_database(config: DatabaseConfig) -> Result<Arc<Database>> {
    let db_path_str = config
        .database_path
        .to_str()
        .ok_or_else(|| crate::DatabaseError::Other("Invalid database path".into()))?;

    let db = Arc::new(Database::new(db_path_str).await?);

    if config.create_tables {
        run_migrations(&db).await?;
    }

    Ok(db)
}

/// Create the schema. Every statement is idempotent so startup can run
/// this unconditionally.
///
/// Cascade rules follow the domain: deleting a title removes its reviews
/// (and through them their comments), deleting a category only detaches
/// titles. The UNIQUE(author_id, title_id) constraint on reviews is the
/// authoritative guarantee behind the one-review-per-user-per-title
/// invariant; application code treats its violation as a conflict.
pub async fn run_migrations(db: &Database) -> Result<()> {
    info!("Running database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            bio TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT 'user',
            is_superuser BOOLEAN NOT NULL DEFAULT 0,
            is_active BOOLEAN NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS confirmation_codes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            code TEXT NOT NULL,
            expires_at TIMESTAMP NOT NULL,
            used BOOLEAN NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS titles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            year INTEGER NOT NULL,
            description TEXT,
            category_id INTEGER,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS title_genres (
            title_id INTEGER NOT NULL,
            genre_id INTEGER NOT NULL,
            PRIMARY KEY (title_id, genre_id),
            FOREIGN KEY (title_id) REFERENCES titles(id) ON DELETE CASCADE,
            FOREIGN KEY (genre_id) REFERENCES genres(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            score INTEGER NOT NULL,
            author_id TEXT NOT NULL,
            title_id INTEGER NOT NULL,
            pub_date TIMESTAMP NOT NULL,
            UNIQUE (author_id, title_id),
            FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (title_id) REFERENCES titles(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            author_id TEXT NOT NULL,
            review_id INTEGER NOT NULL,
            pub_date TIMESTAMP NOT NULL,
            FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(db.pool())
    .await?;

    // Indexes for the common lookup paths
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_title ON reviews(title_id)")
        .execute(db.pool())
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_review ON comments(review_id)")
        .execute(db.pool())
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
        .execute(db.pool())
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(db.pool())
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_confirmation_codes_user ON confirmation_codes(user_id)",
    )
    .execute(db.pool())
    .await?;

    info!("Database migrations completed");

    Ok(())
}
