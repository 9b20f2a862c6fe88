//! Access control evaluator.
//!
//! Pure predicates over an actor snapshot: no I/O, no hidden state, and no
//! error path. Anything malformed or missing evaluates to "denied".
//!
//! Roles form a closed set with an explicit tier ranking. An actor may hold
//! several roles; each predicate checks tiers top-first, so holding any
//! higher role always wins over a more restrictive one.

use crate::document::Collection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role tags, ranked by `tier()`. Unknown tags fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
    User,
}

impl Role {
    /// Relative privilege rank; higher is more privileged.
    pub fn tier(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Editor => 2,
            Role::Viewer => 1,
            Role::User => 0,
        }
    }
}

/// Snapshot of the requesting actor, as loaded with the request.
///
/// The capability sets only apply to mid/low tiers: admins bypass them, and
/// plain users ignore them. A missing list is simply an empty set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: u64,

    #[serde(default)]
    pub roles: BTreeSet<Role>,

    #[serde(default)]
    pub editable_collections: BTreeSet<Collection>,

    #[serde(default)]
    pub visible_collections: BTreeSet<Collection>,
}

impl Actor {
    /// Set-intersection role check: does the actor hold any of `roles`?
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }
}

/// Coarse-grained create permission: top tier only.
pub fn can_create(actor: Option<&Actor>) -> bool {
    match actor {
        Some(actor) => actor.has_any_role(&[Role::Admin]),
        None => false,
    }
}

/// Coarse-grained delete permission: top tier only.
pub fn can_delete(actor: Option<&Actor>) -> bool {
    can_create(actor)
}

/// May the actor edit documents in `collection`?
///
/// Admins edit everything; editors edit their assigned collections;
/// viewers and plain users edit nothing.
pub fn can_edit(actor: Option<&Actor>, collection: Collection) -> bool {
    let Some(actor) = actor else {
        return false;
    };

    if actor.has_any_role(&[Role::Admin]) {
        return true;
    }

    if actor.has_any_role(&[Role::Editor]) {
        return actor.editable_collections.contains(&collection);
    }

    false
}

/// May the actor view documents in `collection`?
///
/// Admins view everything. Editors view their visible collections plus
/// everything they can edit. Viewers view their visible collections only.
pub fn can_view(actor: Option<&Actor>, collection: Collection) -> bool {
    let Some(actor) = actor else {
        return false;
    };

    if actor.has_any_role(&[Role::Admin]) {
        return true;
    }

    if actor.has_any_role(&[Role::Editor]) {
        return actor.visible_collections.contains(&collection)
            || actor.editable_collections.contains(&collection);
    }

    if actor.has_any_role(&[Role::Viewer]) {
        return actor.visible_collections.contains(&collection);
    }

    false
}

/// Self-service rule for profile reads/updates: the owner, or an admin.
pub fn is_self_or_admin(actor: Option<&Actor>, owner_id: u64) -> bool {
    match actor {
        Some(actor) => actor.has_any_role(&[Role::Admin]) || actor.id == owner_id,
        None => false,
    }
}

/// May the actor open the admin panel at all?
pub fn can_access_admin(actor: Option<&Actor>) -> bool {
    match actor {
        Some(actor) => actor.has_any_role(&[Role::Admin, Role::Editor, Role::Viewer]),
        None => false,
    }
}

/// Write hook: anything editable must also be viewable.
///
/// Runs on every actor write for edit-capable roles, so the invariant
/// `visible ⊇ editable` holds regardless of how the sets were mutated.
pub fn sync_editable_to_visible(actor: &mut Actor) {
    if actor.has_any_role(&[Role::Admin, Role::Editor]) {
        let editable: Vec<Collection> = actor.editable_collections.iter().copied().collect();
        actor.visible_collections.extend(editable);
    }
}

/// Bootstrap rule for actor creation: the very first actor becomes admin.
///
/// `admin_exists` is the caller's transactional check ("does any admin-role
/// actor already exist?"); re-running with `admin_exists = true` is a no-op,
/// so the promotion can never fire twice.
pub fn ensure_first_admin(roles: &mut BTreeSet<Role>, admin_exists: bool) {
    if !admin_exists {
        roles.insert(Role::Admin);
    }
}
