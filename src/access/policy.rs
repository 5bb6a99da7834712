//! Role policy table and the policy resolver.
//!
//! Every eligibility check in the core routes through `capabilities`; there
//! are no role-string comparisons anywhere else.

use crate::access::errors::AccessError;
use crate::access::grants;
use crate::access::types::{AccessCheck, AccessReason, Role, RoleCapabilities};
use sea_orm::DatabaseConnection;

/// Static capability lookup, one row per role.
pub fn capabilities(role: Role) -> RoleCapabilities {
    match role {
        Role::Viewer | Role::Requester => RoleCapabilities {
            can_submit_request: true,
            can_decide: false,
            can_view_queue: false,
            can_view_audit: false,
            bypasses_grant_check: false,
        },
        Role::DataSteward => RoleCapabilities {
            can_submit_request: false,
            can_decide: false,
            can_view_queue: true,
            can_view_audit: false,
            bypasses_grant_check: true,
        },
        Role::DataOwner => RoleCapabilities {
            can_submit_request: false,
            can_decide: true,
            can_view_queue: true,
            can_view_audit: false,
            bypasses_grant_check: true,
        },
        Role::Admin => RoleCapabilities {
            can_submit_request: true,
            can_decide: true,
            can_view_queue: true,
            can_view_audit: true,
            bypasses_grant_check: true,
        },
    }
}

/// Resolve whether `subject` may access `resource_ref` right now.
///
/// Privileged roles bypass per-resource grants entirely; everyone else
/// needs a grant. Evaluated against the grant store at call time on every
/// check — results are never cached, since grants can change between calls.
pub async fn can_access(
    db: &DatabaseConnection,
    subject: &str,
    role: Role,
    resource_ref: &str,
) -> Result<AccessCheck, AccessError> {
    if capabilities(role).bypasses_grant_check {
        return Ok(AccessCheck {
            allowed: true,
            reason: AccessReason::PrivilegedRole,
        });
    }

    match grants::lookup(db, subject, resource_ref).await? {
        Some(_) => Ok(AccessCheck {
            allowed: true,
            reason: AccessReason::Granted,
        }),
        None => Ok(AccessCheck {
            allowed: false,
            reason: AccessReason::NoGrant,
        }),
    }
}
