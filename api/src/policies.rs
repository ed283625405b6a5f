//! Per-resource authorization policies.
//!
//! One policy table per resource type, built once at startup and looked
//! up per request. The predicate sets mirror the moderation rules:
//! reads are open, catalog writes are admin-only, and review/comment
//! mutation requires the author, a moderator, or an admin.

use authz::types::{Actor, Owned, Predicate, ResourceAction};
use authz::{Decision, Policy};

use crate::error::ApiError;

/// The policy tables for every exposed resource type.
pub struct Policies {
    /// Categories and genres share one shape.
    pub terms: Policy,
    pub titles: Policy,
    pub reviews: Policy,
    pub comments: Policy,
    pub users: Policy,
}

impl Policies {
    pub fn new() -> Self {
        use Predicate::*;
        use ResourceAction::*;

        let terms = Policy::builder()
            .allow(List, &[ReadOnly])
            .allow(Create, &[IsAdmin])
            .allow(Destroy, &[IsAdmin])
            .build();

        let titles = Policy::builder()
            .allow(List, &[ReadOnly])
            .allow(Retrieve, &[ReadOnly])
            .allow(Create, &[IsAdmin])
            .allow(PartialUpdate, &[IsAdmin])
            .allow(Destroy, &[IsAdmin])
            .build();

        // Anyone may read, creation requires authentication, and
        // mutation additionally requires owner/moderator/admin standing
        // at the object level.
        let moderated = Policy::builder()
            .allow(List, &[ReadOnly])
            .allow(Retrieve, &[ReadOnly])
            .allow(Create, &[IsAuthenticated])
            .allow_object(
                PartialUpdate,
                &[IsAuthenticated],
                &[IsOwner, IsModerator, IsAdmin],
            )
            .allow_object(Destroy, &[IsAuthenticated], &[IsOwner, IsModerator, IsAdmin])
            .build();

        let users = Policy::builder()
            .allow(List, &[IsAdmin])
            .allow(Retrieve, &[IsAdmin])
            .allow(Create, &[IsAdmin])
            .allow(PartialUpdate, &[IsAdmin])
            .allow(Destroy, &[IsAdmin])
            .allow(Me, &[IsAuthenticated])
            .build();

        Self {
            terms,
            titles,
            reviews: moderated.clone(),
            comments: moderated,
            users,
        }
    }
}

impl Default for Policies {
    fn default() -> Self {
        Self::new()
    }
}

/// Collection-level gate. A denied anonymous actor gets 401 so clients
/// know to authenticate; a denied authenticated actor gets 403.
pub fn enforce_request(
    policy: &Policy,
    actor: &Actor,
    action: ResourceAction,
) -> Result<(), ApiError> {
    match policy.check_request(actor, action) {
        Decision::Allow => Ok(()),
        Decision::Deny if actor.is_authenticated() => Err(ApiError::Forbidden),
        Decision::Deny => Err(ApiError::Unauthorized),
    }
}

/// Object-level gate, applied after the target is resolved.
pub fn enforce_object(
    policy: &Policy,
    actor: &Actor,
    action: ResourceAction,
    target: &dyn Owned,
) -> Result<(), ApiError> {
    match policy.check_object(actor, action, target) {
        Decision::Allow => Ok(()),
        Decision::Deny if actor.is_authenticated() => Err(ApiError::Forbidden),
        Decision::Deny => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz::types::{Identity, Role};
    use catalog::Review;
    use chrono::Utc;

    fn review_by(author_id: &str) -> Review {
        Review {
            id: 1,
            text: "decent".to_string(),
            score: 7,
            author_id: author_id.to_string(),
            title_id: 1,
            pub_date: Utc::now(),
        }
    }

    fn authed(id: &str, role: Role) -> Actor {
        Actor::Authenticated(Identity::new(id, role))
    }

    #[test]
    fn anonymous_can_read_reviews_but_not_create() {
        let policies = Policies::new();
        assert!(
            enforce_request(&policies.reviews, &Actor::Anonymous, ResourceAction::List).is_ok()
        );
        assert!(matches!(
            enforce_request(&policies.reviews, &Actor::Anonymous, ResourceAction::Create),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn stranger_cannot_update_a_foreign_review() {
        let policies = Policies::new();
        let review = review_by("u2");
        let u1 = authed("u1", Role::User);

        assert!(enforce_request(&policies.reviews, &u1, ResourceAction::PartialUpdate).is_ok());
        assert!(matches!(
            enforce_object(&policies.reviews, &u1, ResourceAction::PartialUpdate, &review),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn owner_moderator_and_admin_can_update() {
        let policies = Policies::new();
        let review = review_by("u2");

        for actor in [
            authed("u2", Role::User),
            authed("staff", Role::Moderator),
            authed("boss", Role::Admin),
        ] {
            assert!(
                enforce_object(&policies.comments, &actor, ResourceAction::Destroy, &review)
                    .is_ok()
            );
        }
    }

    #[test]
    fn catalog_writes_are_admin_only() {
        let policies = Policies::new();
        let moderator = authed("m", Role::Moderator);

        assert!(matches!(
            enforce_request(&policies.titles, &moderator, ResourceAction::Create),
            Err(ApiError::Forbidden)
        ));
        assert!(enforce_request(
            &policies.titles,
            &authed("a", Role::Admin),
            ResourceAction::Create
        )
        .is_ok());
    }

    #[test]
    fn user_management_denies_unregistered_actions_by_default() {
        let policies = Policies::new();
        let admin = authed("a", Role::Admin);

        // Terms never registered Retrieve or PartialUpdate.
        assert!(matches!(
            enforce_request(&policies.terms, &admin, ResourceAction::Retrieve),
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            enforce_request(&policies.terms, &admin, ResourceAction::PartialUpdate),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn me_requires_authentication_only() {
        let policies = Policies::new();
        assert!(matches!(
            enforce_request(&policies.users, &Actor::Anonymous, ResourceAction::Me),
            Err(ApiError::Unauthorized)
        ));
        assert!(enforce_request(
            &policies.users,
            &authed("u", Role::User),
            ResourceAction::Me
        )
        .is_ok());
    }
}
