mod logging;

use std::path::PathBuf;
use tracing::info;

use api::{ApiConfig, AppState};
use database::{initialize_database, DatabaseConfig};
use user::{Mailer, MailerConfig, SignupConfig, SignupManager, TokenConfig, TokenManager};

/// Runtime configuration, assembled from the environment (and .env).
struct Settings {
    data_path: PathBuf,
    port: u16,
    token_secret: String,
    mailer: MailerConfig,
}

impl Settings {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let data_path = PathBuf::from(env_or("DATA_PATH", "./data"));
        let port = env_or("PORT", "3030").parse()?;

        let token_secret = std::env::var("TOKEN_SECRET").map_err(|_| {
            "TOKEN_SECRET must be set; access tokens cannot be signed without it"
        })?;

        let mailer = MailerConfig {
            smtp_host: env_or("SMTP_HOST", "localhost"),
            smtp_port: env_or("SMTP_PORT", "1025").parse()?,
            smtp_username: env_or("SMTP_USERNAME", ""),
            smtp_password: env_or("SMTP_PASSWORD", ""),
            from_email: env_or("MAIL_FROM", "noreply@marginalia.local"),
            from_name: env_or("MAIL_FROM_NAME", "Marginalia"),
        };

        Ok(Self {
            data_path,
            port,
            token_secret,
            mailer,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let _guard = logging::init_logging(&settings.data_path)?;

    info!("=== Marginalia starting ===");

    let db = initialize_database(DatabaseConfig::new_with_path(
        settings.data_path.join("marginalia.db"),
    ))
    .await?;

    let tokens = TokenManager::new(&TokenConfig::new(settings.token_secret.as_str()));
    let signup = SignupManager::new(Mailer::new(settings.mailer), SignupConfig::default());

    let state = AppState::new(db, tokens, signup);

    api::start_server(state, ApiConfig::new().with_port(settings.port)).await?;

    info!("=== Marginalia shutdown complete ===");
    Ok(())
}
