//! Input validation for catalog fields.

use crate::error::{CatalogError, Result};

/// Oldest plausible publication year (the Epic of Gilgamesh, roughly).
pub const OLDEST_YEAR: i64 = -2500;
/// Upper bound leaving headroom for announced-but-unreleased works.
pub const LATEST_YEAR: i64 = 2050;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_SLUG_LEN: usize = 50;

/// A title's year must fall in a historically plausible range.
pub fn validate_year(year: i64) -> Result<()> {
    if (OLDEST_YEAR..=LATEST_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(CatalogError::YearOutOfRange(year))
    }
}

/// Review scores are integers from 1 to 10 inclusive.
pub fn validate_score(score: i64) -> Result<()> {
    if (1..=10).contains(&score) {
        Ok(())
    } else {
        Err(CatalogError::ScoreOutOfRange(score))
    }
}

/// Slugs are non-empty, at most 50 characters, and restricted to
/// letters, digits, hyphens and underscores.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(CatalogError::InvalidSlug(slug.to_string()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CatalogError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Display names are non-empty and at most 256 characters.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CatalogError::Validation("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CatalogError::Validation(format!(
            "name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_bounds_are_inclusive() {
        assert!(validate_year(OLDEST_YEAR).is_ok());
        assert!(validate_year(LATEST_YEAR).is_ok());
        assert!(validate_year(1984).is_ok());
        assert!(validate_year(OLDEST_YEAR - 1).is_err());
        assert!(validate_year(LATEST_YEAR + 1).is_err());
    }

    #[test]
    fn score_bounds_are_inclusive() {
        for score in 1..=10 {
            assert!(validate_score(score).is_ok());
        }
        assert!(validate_score(0).is_err());
        assert!(validate_score(11).is_err());
        assert!(validate_score(-3).is_err());
    }

    #[test]
    fn slug_shape_is_enforced() {
        assert!(validate_slug("sci-fi").is_ok());
        assert!(validate_slug("Drama_2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("with spaces").is_err());
        assert!(validate_slug("acc\u{e9}nt").is_err());
        assert!(validate_slug(&"x".repeat(51)).is_err());
    }

    #[test]
    fn name_length_is_bounded() {
        assert!(validate_name("The Master and Margarita").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"n".repeat(257)).is_err());
    }
}
