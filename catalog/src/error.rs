use thiserror::Error;

use crate::validation::{LATEST_YEAR, OLDEST_YEAR};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("year {0} is outside the allowed range {OLDEST_YEAR}..={LATEST_YEAR}")]
    YearOutOfRange(i64),

    #[error("score {0} is outside the allowed range 1..=10")]
    ScoreOutOfRange(i64),

    #[error("invalid slug '{0}': only letters, digits, hyphens and underscores are allowed")]
    InvalidSlug(String),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
