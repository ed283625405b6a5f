use authz::types::Owned;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A category a title belongs to (at most one). Deleting a category
/// detaches its titles instead of cascading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A genre tag; titles carry zero or more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A catalogued work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// A user's review of a title. At most one review exists per
/// (author, title) pair; `pub_date` is set once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub text: String,
    pub score: i64,
    pub author_id: String,
    pub title_id: i64,
    pub pub_date: DateTime<Utc>,
}

/// A comment on a review. Only reachable through its review's title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author_id: String,
    pub review_id: i64,
    pub pub_date: DateTime<Utc>,
}

impl Owned for Review {
    fn author_id(&self) -> Option<&str> {
        Some(&self.author_id)
    }
}

impl Owned for Comment {
    fn author_id(&self) -> Option<&str> {
        Some(&self.author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviews_and_comments_expose_their_author() {
        let review = Review {
            id: 1,
            text: "fine".to_string(),
            score: 7,
            author_id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            title_id: 1,
            pub_date: Utc::now(),
        };
        assert_eq!(review.author_id(), Some("01ARZ3NDEKTSV4RRFFQ69G5FAV"));
    }
}
