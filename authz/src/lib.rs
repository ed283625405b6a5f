//! Per-action authorization for the Marginalia backend.
//!
//! Authorization is resolved from a per-resource [`Policy`]: a mapping
//! from action name to an ordered set of capability predicates combined
//! with OR semantics. The flow for a request is:
//!
//! 1. The transport layer authenticates the actor (or leaves it anonymous)
//! 2. The handler looks up the policy registered for the resource type
//! 3. [`Policy::check_request`] runs the collection-level predicates
//! 4. For object-targeted operations, the target is resolved and
//!    [`Policy::check_object`] runs the object-level predicates
//!
//! Both levels must pass for an object-targeted write; a collection-level
//! pass never implies an object-level pass. An action with no registered
//! rule is denied regardless of the actor's role.

pub mod types;

use std::collections::HashMap;

use crate::types::{Actor, Owned, Predicate, ResourceAction};

/// The outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Predicates registered for a single action, split into the
/// collection-level (`request`) and object-level (`object`) checks.
#[derive(Debug, Clone, Default)]
struct Rule {
    request: Vec<Predicate>,
    object: Vec<Predicate>,
}

/// An action-to-predicate policy for one resource type.
///
/// Policies are plain configuration: build one per resource at startup
/// and evaluate it per request. Evaluation is stateless and pure.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    rules: HashMap<ResourceAction, Rule>,
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Collection-level check (`has_permission`). Predicates run in
    /// registration order and short-circuit on the first success. An
    /// unregistered action, or one registered with no request
    /// predicates, is denied.
    pub fn check_request(&self, actor: &Actor, action: ResourceAction) -> Decision {
        let Some(rule) = self.rules.get(&action) else {
            return Decision::Deny;
        };
        if rule
            .request
            .iter()
            .any(|p| p.evaluate(actor, action, None))
        {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Object-level check (`has_object_permission`) against a resolved
    /// target. An action with no object predicates has no object-level
    /// requirement and passes; an unregistered action still denies.
    pub fn check_object(
        &self,
        actor: &Actor,
        action: ResourceAction,
        target: &dyn Owned,
    ) -> Decision {
        let Some(rule) = self.rules.get(&action) else {
            return Decision::Deny;
        };
        if rule.object.is_empty()
            || rule
                .object
                .iter()
                .any(|p| p.evaluate(actor, action, Some(target)))
        {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Fluent builder for [`Policy`] tables.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    rules: HashMap<ResourceAction, Rule>,
}

impl PolicyBuilder {
    /// Register an action gated only at the collection level.
    pub fn allow(mut self, action: ResourceAction, request: &[Predicate]) -> Self {
        self.rules.insert(
            action,
            Rule {
                request: request.to_vec(),
                object: Vec::new(),
            },
        );
        self
    }

    /// Register an action with both collection-level and object-level
    /// predicate sets.
    pub fn allow_object(
        mut self,
        action: ResourceAction,
        request: &[Predicate],
        object: &[Predicate],
    ) -> Self {
        self.rules.insert(
            action,
            Rule {
                request: request.to_vec(),
                object: object.to_vec(),
            },
        );
        self
    }

    pub fn build(self) -> Policy {
        Policy { rules: self.rules }
    }
}
