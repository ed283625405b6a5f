//! Typed storage for catalog resources, reviews, and comments.
//!
//! Nested resources are resolved through their full parent chain: a
//! review is looked up as (title, review) and a comment as
//! (title, review, comment). A mismatched chain is a [`DatabaseError::NotFound`],
//! never an empty result.

use crate::{Database, DatabaseError, Result};
use catalog::{
    validate_name, validate_score, validate_slug, validate_year, Category, Comment, Genre, Review,
    Title,
};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::marker::PhantomData;
use tracing::{debug, info};

/// Client-visible message for the one-review-per-title conflict. The
/// application-level existence check and the storage-level constraint
/// violation both surface it, so a lost race is indistinguishable from
/// an ordinary duplicate.
pub const DUPLICATE_REVIEW: &str = "you have already left a review for this title";

/// Storage for the flat slug-keyed lookup tables (categories, genres).
pub struct TermStore<'a, T> {
    db: &'a Database,
    table: &'static str,
    label: &'static str,
    _marker: PhantomData<T>,
}

impl<'a> TermStore<'a, Category> {
    pub fn categories(db: &'a Database) -> Self {
        Self {
            db,
            table: "categories",
            label: "category",
            _marker: PhantomData,
        }
    }
}

impl<'a> TermStore<'a, Genre> {
    pub fn genres(db: &'a Database) -> Self {
        Self {
            db,
            table: "genres",
            label: "genre",
            _marker: PhantomData,
        }
    }
}

impl<'a, T> TermStore<'a, T>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>> {
        let sql = format!(
            "SELECT id, name, slug FROM {} ORDER BY slug LIMIT ? OFFSET ?",
            self.table
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(sqlx::query_scalar(&sql).fetch_one(self.db.pool()).await?)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<T>> {
        let sql = format!("SELECT id, name, slug FROM {} WHERE slug = ?", self.table);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row)
    }

    /// Insert a new term. The slug must be unique; a collision maps to a
    /// conflict rather than a driver error.
    pub async fn create(&self, name: &str, slug: &str) -> Result<T> {
        validate_name(name)?;
        validate_slug(slug)?;

        let sql = format!("INSERT INTO {} (name, slug) VALUES (?, ?)", self.table);
        sqlx::query(&sql)
            .bind(name)
            .bind(slug)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                if DatabaseError::is_unique_violation(&e) {
                    DatabaseError::Conflict(format!("{} slug '{}' already exists", self.label, slug))
                } else {
                    e.into()
                }
            })?;

        info!("Created {} with slug: {}", self.label, slug);

        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(self.label.to_string()))
    }

    pub async fn delete_by_slug(&self, slug: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE slug = ?", self.table);
        let result = sqlx::query(&sql).bind(slug).execute(self.db.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(self.label.to_string()));
        }
        info!("Deleted {} with slug: {}", self.label, slug);
        Ok(())
    }
}

/// A title joined with its category, genres, and aggregate rating.
#[derive(Debug, Clone)]
pub struct TitleRecord {
    pub title: Title,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    /// Integer-rounded mean review score, absent while unreviewed.
    pub rating: Option<i64>,
}

/// Fields for creating a title. Category and genres are referenced by
/// slug, matching the transport payloads.
#[derive(Debug, Clone, Default)]
pub struct NewTitle {
    pub name: String,
    pub year: i64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genres: Vec<String>,
}

/// Partial update for a title; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TitlePatch {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genres: Option<Vec<String>>,
}

pub struct TitleStore<'a> {
    db: &'a Database,
}

impl<'a> TitleStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    async fn category_id(&self, slug: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT id FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| {
                catalog::CatalogError::Validation(format!("unknown category slug '{slug}'")).into()
            })
    }

    async fn genre_id(&self, slug: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT id FROM genres WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| {
                catalog::CatalogError::Validation(format!("unknown genre slug '{slug}'")).into()
            })
    }

    async fn set_genres(&self, title_id: i64, slugs: &[String]) -> Result<()> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = ?")
            .bind(title_id)
            .execute(self.db.pool())
            .await?;
        for slug in slugs {
            let genre_id = self.genre_id(slug).await?;
            sqlx::query("INSERT OR IGNORE INTO title_genres (title_id, genre_id) VALUES (?, ?)")
                .bind(title_id)
                .bind(genre_id)
                .execute(self.db.pool())
                .await?;
        }
        Ok(())
    }

    pub async fn create(&self, new: NewTitle) -> Result<TitleRecord> {
        validate_name(&new.name)?;
        validate_year(new.year)?;

        let category_id = match new.category.as_deref() {
            Some(slug) => Some(self.category_id(slug).await?),
            None => None,
        };

        let result = sqlx::query(
            "INSERT INTO titles (name, year, description, category_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(new.year)
        .bind(&new.description)
        .bind(category_id)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.set_genres(id, &new.genres).await?;

        info!("Created title {} ({})", id, new.name);

        self.record(id).await
    }

    /// Fetch a title with its category, genres, and rating.
    pub async fn record(&self, id: i64) -> Result<TitleRecord> {
        let title = sqlx::query_as::<_, Title>(
            "SELECT id, name, year, description, category_id FROM titles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound("title".to_string()))?;

        self.assemble(title).await
    }

    async fn assemble(&self, title: Title) -> Result<TitleRecord> {
        let category = match title.category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, slug FROM categories WHERE id = ?",
                )
                .bind(category_id)
                .fetch_optional(self.db.pool())
                .await?
            }
            None => None,
        };

        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name, g.slug
            FROM genres g
            JOIN title_genres tg ON tg.genre_id = g.id
            WHERE tg.title_id = ?
            ORDER BY g.slug
            "#,
        )
        .bind(title.id)
        .fetch_all(self.db.pool())
        .await?;

        let rating: Option<f64> =
            sqlx::query_scalar("SELECT AVG(score) FROM reviews WHERE title_id = ?")
                .bind(title.id)
                .fetch_one(self.db.pool())
                .await?;

        Ok(TitleRecord {
            title,
            category,
            genres,
            rating: rating.map(|avg| avg.round() as i64),
        })
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<TitleRecord>> {
        let titles = sqlx::query_as::<_, Title>(
            "SELECT id, name, year, description, category_id FROM titles ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let mut records = Vec::with_capacity(titles.len());
        for title in titles {
            records.push(self.assemble(title).await?);
        }
        Ok(records)
    }

    pub async fn count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM titles")
            .fetch_one(self.db.pool())
            .await?)
    }

    pub async fn update(&self, id: i64, patch: TitlePatch) -> Result<TitleRecord> {
        // Resolve the current row first so a missing title is a clean 404.
        let current = self.record(id).await?;

        let name = patch.name.unwrap_or(current.title.name);
        validate_name(&name)?;
        let year = patch.year.unwrap_or(current.title.year);
        validate_year(year)?;
        let description = patch.description.or(current.title.description);

        let category_id = match patch.category.as_deref() {
            Some(slug) => Some(self.category_id(slug).await?),
            None => current.title.category_id,
        };

        sqlx::query(
            "UPDATE titles SET name = ?, year = ?, description = ?, category_id = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(year)
        .bind(&description)
        .bind(category_id)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if let Some(genres) = patch.genres {
            self.set_genres(id, &genres).await?;
        }

        self.record(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM titles WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("title".to_string()));
        }
        info!("Deleted title {}", id);
        Ok(())
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM titles WHERE id = ?)")
                .bind(id)
                .fetch_one(self.db.pool())
                .await?,
        )
    }
}

pub struct ReviewStore<'a> {
    db: &'a Database,
}

impl<'a> ReviewStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    async fn require_title(&self, title_id: i64) -> Result<()> {
        if TitleStore::new(self.db).exists(title_id).await? {
            Ok(())
        } else {
            Err(DatabaseError::NotFound("title".to_string()))
        }
    }

    /// Resolve a review through its parent title. A review id that exists
    /// under a different title is treated as absent.
    pub async fn get(&self, title_id: i64, review_id: i64) -> Result<Review> {
        self.require_title(title_id).await?;
        sqlx::query_as::<_, Review>(
            "SELECT id, text, score, author_id, title_id, pub_date FROM reviews WHERE id = ? AND title_id = ?",
        )
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound("review".to_string()))
    }

    pub async fn list_for_title(
        &self,
        title_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Review>> {
        self.require_title(title_id).await?;
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT id, text, score, author_id, title_id, pub_date FROM reviews WHERE title_id = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(title_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;
        Ok(reviews)
    }

    pub async fn count_for_title(&self, title_id: i64) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = ?")
                .bind(title_id)
                .fetch_one(self.db.pool())
                .await?,
        )
    }

    /// Create a review, enforcing the one-review-per-(author, title)
    /// invariant.
    ///
    /// The existence check is the fast path; the UNIQUE constraint on
    /// (author_id, title_id) is the guarantee of record. A concurrent
    /// create that slips past the check loses the race at INSERT time and
    /// is reported as the same conflict.
    pub async fn create(
        &self,
        title_id: i64,
        author_id: &str,
        text: &str,
        score: i64,
    ) -> Result<Review> {
        self.require_title(title_id).await?;
        validate_score(score)?;

        let already_reviewed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE author_id = ? AND title_id = ?)",
        )
        .bind(author_id)
        .bind(title_id)
        .fetch_one(self.db.pool())
        .await?;

        if already_reviewed {
            debug!(
                "Rejecting duplicate review: author={} title={}",
                author_id, title_id
            );
            return Err(DatabaseError::Conflict(DUPLICATE_REVIEW.to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO reviews (text, score, author_id, title_id, pub_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(text)
        .bind(score)
        .bind(author_id)
        .bind(title_id)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if DatabaseError::is_unique_violation(&e) {
                DatabaseError::Conflict(DUPLICATE_REVIEW.to_string())
            } else {
                e.into()
            }
        })?;

        let id = result.last_insert_rowid();
        info!("Created review {} on title {}", id, title_id);

        self.get(title_id, id).await
    }

    /// Partial update; only text and score are mutable.
    pub async fn update(
        &self,
        title_id: i64,
        review_id: i64,
        text: Option<&str>,
        score: Option<i64>,
    ) -> Result<Review> {
        let current = self.get(title_id, review_id).await?;

        let text = text.unwrap_or(&current.text);
        let score = score.unwrap_or(current.score);
        validate_score(score)?;

        sqlx::query("UPDATE reviews SET text = ?, score = ? WHERE id = ?")
            .bind(text)
            .bind(score)
            .bind(review_id)
            .execute(self.db.pool())
            .await?;

        self.get(title_id, review_id).await
    }

    pub async fn delete(&self, title_id: i64, review_id: i64) -> Result<()> {
        // Resolve through the parent chain before deleting anything.
        self.get(title_id, review_id).await?;
        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(self.db.pool())
            .await?;
        info!("Deleted review {} on title {}", review_id, title_id);
        Ok(())
    }
}

pub struct CommentStore<'a> {
    db: &'a Database,
}

impl<'a> CommentStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Resolve a comment through its full parent chain
    /// (title -> review -> comment). Both hops must match.
    pub async fn get(&self, title_id: i64, review_id: i64, comment_id: i64) -> Result<Comment> {
        ReviewStore::new(self.db).get(title_id, review_id).await?;
        sqlx::query_as::<_, Comment>(
            "SELECT id, text, author_id, review_id, pub_date FROM comments WHERE id = ? AND review_id = ?",
        )
        .bind(comment_id)
        .bind(review_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound("comment".to_string()))
    }

    pub async fn list_for_review(
        &self,
        title_id: i64,
        review_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>> {
        ReviewStore::new(self.db).get(title_id, review_id).await?;
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, text, author_id, review_id, pub_date FROM comments WHERE review_id = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(review_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;
        Ok(comments)
    }

    pub async fn count_for_review(&self, review_id: i64) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = ?")
                .bind(review_id)
                .fetch_one(self.db.pool())
                .await?,
        )
    }

    pub async fn create(
        &self,
        title_id: i64,
        review_id: i64,
        author_id: &str,
        text: &str,
    ) -> Result<Comment> {
        ReviewStore::new(self.db).get(title_id, review_id).await?;

        let result = sqlx::query(
            "INSERT INTO comments (text, author_id, review_id, pub_date) VALUES (?, ?, ?, ?)",
        )
        .bind(text)
        .bind(author_id)
        .bind(review_id)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        info!("Created comment {} on review {}", id, review_id);

        self.get(title_id, review_id, id).await
    }

    pub async fn update(
        &self,
        title_id: i64,
        review_id: i64,
        comment_id: i64,
        text: &str,
    ) -> Result<Comment> {
        self.get(title_id, review_id, comment_id).await?;
        sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(text)
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;
        self.get(title_id, review_id, comment_id).await
    }

    pub async fn delete(&self, title_id: i64, review_id: i64, comment_id: i64) -> Result<()> {
        self.get(title_id, review_id, comment_id).await?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;
        info!("Deleted comment {} on review {}", comment_id, review_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fresh_database;
    use crate::Database;
    use std::sync::Arc;

    async fn seed_user(db: &Database, username: &str) -> String {
        let id = ulid::Ulid::new().to_string();
        sqlx::query(
            "INSERT INTO users (id, username, email, role, is_active, created_at) VALUES (?, ?, ?, 'user', 1, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
        id
    }

    async fn seed_title(db: &Database, name: &str) -> i64 {
        TitleStore::new(db)
            .create(NewTitle {
                name: name.to_string(),
                year: 1999,
                ..Default::default()
            })
            .await
            .unwrap()
            .title
            .id
    }

    #[tokio::test]
    async fn term_store_enforces_slug_uniqueness() {
        let (_guard, db) = fresh_database().await;
        let categories = TermStore::categories(&db);

        categories.create("Books", "books").await.unwrap();
        let err = categories.create("Books again", "books").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        // The same slug is fine on the other table.
        TermStore::genres(&db).create("Books", "books").await.unwrap();
    }

    #[tokio::test]
    async fn term_store_rejects_malformed_slugs() {
        let (_guard, db) = fresh_database().await;
        let err = TermStore::genres(&db)
            .create("Science Fiction", "sci fi")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Invalid(_)));
    }

    #[tokio::test]
    async fn title_embeds_category_genres_and_rating() {
        let (_guard, db) = fresh_database().await;
        TermStore::categories(&db).create("Books", "books").await.unwrap();
        TermStore::genres(&db).create("Drama", "drama").await.unwrap();
        TermStore::genres(&db).create("Satire", "satire").await.unwrap();

        let record = TitleStore::new(&db)
            .create(NewTitle {
                name: "The Master and Margarita".to_string(),
                year: 1967,
                description: Some("Devil visits Moscow".to_string()),
                category: Some("books".to_string()),
                genres: vec!["drama".to_string(), "satire".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(record.category.as_ref().unwrap().slug, "books");
        assert_eq!(record.genres.len(), 2);
        assert_eq!(record.rating, None);

        let reviews = ReviewStore::new(&db);
        let u1 = seed_user(&db, "u1").await;
        let u2 = seed_user(&db, "u2").await;
        reviews.create(record.title.id, &u1, "good", 7).await.unwrap();
        reviews.create(record.title.id, &u2, "great", 10).await.unwrap();

        let record = TitleStore::new(&db).record(record.title.id).await.unwrap();
        // mean of 7 and 10 is 8.5, rounded half-away-from-zero
        assert_eq!(record.rating, Some(9));
    }

    #[tokio::test]
    async fn unknown_category_slug_is_a_validation_error() {
        let (_guard, db) = fresh_database().await;
        let err = TitleStore::new(&db)
            .create(NewTitle {
                name: "Nameless".to_string(),
                year: 2000,
                category: Some("missing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Invalid(_)));
    }

    #[tokio::test]
    async fn out_of_range_year_and_score_are_rejected() {
        let (_guard, db) = fresh_database().await;
        let err = TitleStore::new(&db)
            .create(NewTitle {
                name: "From the future".to_string(),
                year: 3000,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Invalid(_)));

        let title_id = seed_title(&db, "Scored").await;
        let author = seed_user(&db, "scorer").await;
        let err = ReviewStore::new(&db)
            .create(title_id, &author, "off the chart", 11)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Invalid(_)));
    }

    #[tokio::test]
    async fn second_review_for_same_title_conflicts() {
        let (_guard, db) = fresh_database().await;
        let title_id = seed_title(&db, "Solaris").await;
        let u1 = seed_user(&db, "u1").await;
        let u2 = seed_user(&db, "u2").await;

        let reviews = ReviewStore::new(&db);
        reviews.create(title_id, &u1, "fine", 7).await.unwrap();

        let err = reviews.create(title_id, &u1, "changed my mind", 3).await.unwrap_err();
        match err {
            DatabaseError::Conflict(message) => assert_eq!(message, DUPLICATE_REVIEW),
            other => panic!("expected conflict, got {other:?}"),
        }

        // A different author is unaffected.
        reviews.create(title_id, &u2, "also fine", 8).await.unwrap();
        assert_eq!(reviews.count_for_title(title_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_duplicate_creates_yield_one_success_one_conflict() {
        let (_guard, db) = fresh_database().await;
        let title_id = seed_title(&db, "Raced").await;
        let author = seed_user(&db, "racer").await;

        let db1 = Arc::clone(&db);
        let db2 = Arc::clone(&db);
        let author1 = author.clone();
        let author2 = author.clone();

        let (a, b) = tokio::join!(
            tokio::spawn(async move {
                ReviewStore::new(&db1).create(title_id, &author1, "first", 6).await
            }),
            tokio::spawn(async move {
                ReviewStore::new(&db2).create(title_id, &author2, "second", 9).await
            }),
        );
        let results = [a.unwrap(), b.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DatabaseError::Conflict(_))))
            .count();
        assert_eq!((successes, conflicts), (1, 1));
        assert_eq!(
            ReviewStore::new(&db).count_for_title(title_id).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn mismatched_parent_chain_is_not_found() {
        let (_guard, db) = fresh_database().await;
        let title_a = seed_title(&db, "A").await;
        let title_b = seed_title(&db, "B").await;
        let author = seed_user(&db, "author").await;

        let review = ReviewStore::new(&db)
            .create(title_a, &author, "on A", 5)
            .await
            .unwrap();

        // The review exists, but not under title B.
        let err = ReviewStore::new(&db).get(title_b, review.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));

        let err = CommentStore::new(&db)
            .create(title_b, review.id, &author, "misrouted")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));

        // Through the right chain everything works.
        let comment = CommentStore::new(&db)
            .create(title_a, review.id, &author, "routed")
            .await
            .unwrap();
        assert_eq!(comment.review_id, review.id);
    }

    #[tokio::test]
    async fn category_deletion_detaches_titles() {
        let (_guard, db) = fresh_database().await;
        TermStore::categories(&db).create("Films", "films").await.unwrap();
        let record = TitleStore::new(&db)
            .create(NewTitle {
                name: "Stalker".to_string(),
                year: 1979,
                category: Some("films".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        TermStore::categories(&db).delete_by_slug("films").await.unwrap();

        let record = TitleStore::new(&db).record(record.title.id).await.unwrap();
        assert!(record.category.is_none());
        assert!(record.title.category_id.is_none());
    }

    #[tokio::test]
    async fn title_deletion_cascades_reviews_and_comments() {
        let (_guard, db) = fresh_database().await;
        let title_id = seed_title(&db, "Ephemeral").await;
        let author = seed_user(&db, "author").await;

        let review = ReviewStore::new(&db)
            .create(title_id, &author, "soon gone", 5)
            .await
            .unwrap();
        CommentStore::new(&db)
            .create(title_id, review.id, &author, "me too")
            .await
            .unwrap();

        TitleStore::new(&db).delete(title_id).await.unwrap();

        let reviews: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!((reviews, comments), (0, 0));
    }

    #[tokio::test]
    async fn review_update_touches_only_text_and_score() {
        let (_guard, db) = fresh_database().await;
        let title_id = seed_title(&db, "Edited").await;
        let author = seed_user(&db, "editor").await;

        let reviews = ReviewStore::new(&db);
        let original = reviews.create(title_id, &author, "draft", 4).await.unwrap();

        let updated = reviews
            .update(title_id, original.id, Some("final"), Some(8))
            .await
            .unwrap();
        assert_eq!(updated.text, "final");
        assert_eq!(updated.score, 8);
        assert_eq!(updated.pub_date, original.pub_date);
        assert_eq!(updated.author_id, original.author_id);

        // Partial update leaves the other field alone.
        let updated = reviews
            .update(title_id, original.id, None, Some(9))
            .await
            .unwrap();
        assert_eq!(updated.text, "final");
        assert_eq!(updated.score, 9);
    }
}
