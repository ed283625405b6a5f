//! Core authorization types: roles, identities, actions, and the
//! capability predicates evaluated against them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Account role. Exactly one role is authoritative for an account at any
/// time; capability checks derive from it rather than from string
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    /// The wire representation used in the database and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct InvalidRole(pub String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

/// The authorization view of an authenticated account.
///
/// Constructed from a stored user record by the caller; predicates only
/// ever see this projection, never the full account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable account identifier (ULID).
    pub id: String,
    pub role: Role,
    /// Superuser standing counts as admin regardless of the role field.
    pub superuser: bool,
}

impl Identity {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            superuser: false,
        }
    }

    pub fn superuser(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            superuser: true,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.superuser
    }
}

/// The requesting actor: either anonymous or an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated(Identity),
}

impl Actor {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::Authenticated(_))
    }
}

/// A named operation on a resource type. Policies key on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAction {
    List,
    Retrieve,
    Create,
    PartialUpdate,
    Destroy,
    /// Custom self-profile action (read and restricted-field update).
    Me,
}

impl ResourceAction {
    /// Safe actions never mutate state.
    pub fn is_safe(&self) -> bool {
        matches!(self, ResourceAction::List | ResourceAction::Retrieve)
    }
}

/// Object-level targets expose their author, if any. Resources without
/// an ownership notion (titles, categories) return `None`.
pub trait Owned {
    fn author_id(&self) -> Option<&str>;
}

/// A pure capability check. Evaluation has no side effects and cannot
/// fail; a predicate that is missing its required input is simply false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The operation is a safe read (list, retrieve).
    ReadOnly,
    /// The actor is authenticated.
    IsAuthenticated,
    /// The actor authored the target resource.
    IsOwner,
    /// The actor holds the moderator role.
    IsModerator,
    /// The actor holds the admin role or superuser standing.
    IsAdmin,
}

impl Predicate {
    pub fn evaluate(
        &self,
        actor: &Actor,
        action: ResourceAction,
        target: Option<&dyn Owned>,
    ) -> bool {
        match self {
            Predicate::ReadOnly => action.is_safe(),
            Predicate::IsAuthenticated => actor.is_authenticated(),
            Predicate::IsOwner => match (actor.identity(), target.and_then(|t| t.author_id())) {
                (Some(identity), Some(author)) => identity.id == author,
                _ => false,
            },
            Predicate::IsModerator => actor.identity().is_some_and(|i| i.is_moderator()),
            Predicate::IsAdmin => actor.identity().is_some_and(|i| i.is_admin()),
        }
    }
}
