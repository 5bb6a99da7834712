//! Access request lifecycle manager.
//!
//! Owns the AccessRequest state machine: PENDING -> {APPROVED, REJECTED},
//! terminal once decided. The decide path is linearizable per request: the
//! status write is a compare-and-set conditioned on PENDING, so of two
//! racing approvers exactly one wins and the other observes a conflict.

use crate::access::audit;
use crate::access::errors::AccessError;
use crate::access::grants;
use crate::access::policy;
use crate::access::types::{
    AccessLevel, AccessRequest, AuditAction, Decision, Grant, RequestStatus, Role,
};
use crate::entities;
use crate::storage::random_id;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::json;

const MIN_REASON_LEN: usize = 5;
const DEFAULT_APPROVED_NOTE: &str = "Approved";
const DEFAULT_REJECTED_NOTE: &str = "Rejected";

/// Filter for listing requests. All fields optional; `limit` is a
/// caller-supplied page size advisory.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<RequestStatus>,
    pub decided_by: Option<String>,
    pub limit: Option<u64>,
}

/// Create a new PENDING request. Duplicate PENDING requests for the same
/// (subject, resource) pair are allowed; deduplication is the caller's
/// policy decision.
pub async fn submit(
    db: &DatabaseConnection,
    requester_subject: &str,
    resource_ref: &str,
    access_level: &str,
    reason: &str,
) -> Result<AccessRequest, AccessError> {
    let level: AccessLevel = access_level.parse()?;

    if requester_subject.trim().is_empty() {
        return Err(AccessError::Validation(
            "requester_subject must be non-empty".to_string(),
        ));
    }
    if resource_ref.trim().is_empty() {
        return Err(AccessError::Validation(
            "resource_ref must be non-empty".to_string(),
        ));
    }
    let reason = reason.trim();
    if reason.len() < MIN_REASON_LEN {
        return Err(AccessError::Validation(format!(
            "reason must be at least {MIN_REASON_LEN} characters"
        )));
    }

    let id = random_id();
    let created_at = Utc::now().timestamp();

    let request = entities::access_request::ActiveModel {
        id: Set(id.clone()),
        resource_ref: Set(resource_ref.to_string()),
        requester_subject: Set(requester_subject.to_string()),
        access_level: Set(level.as_str().to_string()),
        reason: Set(reason.to_string()),
        status: Set(RequestStatus::Pending.as_str().to_string()),
        created_at: Set(created_at),
        decided_by: Set(None),
        decided_at: Set(None),
        decision_note: Set(None),
    };
    request.insert(db).await?;

    audit::append(
        db,
        requester_subject,
        AuditAction::RequestSubmitted,
        "access_request",
        &id,
        Some(json!({ "resource_ref": resource_ref, "access_level": level.as_str() })),
    )
    .await?;

    tracing::info!(request_id = %id, requester = requester_subject, %resource_ref, "access request submitted");

    get(db, &id).await
}

/// Fetch a single request by id.
pub async fn get(db: &DatabaseConnection, request_id: &str) -> Result<AccessRequest, AccessError> {
    use entities::access_request::Entity;

    let model = Entity::find_by_id(request_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AccessError::NotFound(request_id.to_string()))?;
    AccessRequest::try_from(model)
}

/// List requests, `created_at` ascending with the id as stable tiebreak.
pub async fn list(
    db: &DatabaseConnection,
    filter: &ListFilter,
) -> Result<Vec<AccessRequest>, AccessError> {
    use entities::access_request::{Column, Entity};

    let mut query = Entity::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id);

    if let Some(status) = filter.status {
        query = query.filter(Column::Status.eq(status.as_str()));
    }
    if let Some(decided_by) = &filter.decided_by {
        query = query.filter(Column::DecidedBy.eq(decided_by.as_str()));
    }
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }

    let rows = query.all(db).await?;
    rows.into_iter().map(AccessRequest::try_from).collect()
}

/// Decide a PENDING request. Preconditions, checked in order: the request
/// exists; it is still PENDING; the approver's role carries the decide
/// capability. The transition itself is a compare-and-set on the status
/// column, so a decision that loses a race fails with a conflict rather
/// than overwriting the winner.
pub async fn decide(
    db: &DatabaseConnection,
    request_id: &str,
    approver_subject: &str,
    approver_role: &str,
    decision: &str,
    note: Option<&str>,
) -> Result<AccessRequest, AccessError> {
    use entities::access_request::{Column, Entity};

    let role: Role = approver_role.parse()?;
    let decision: Decision = decision.parse()?;
    if approver_subject.trim().is_empty() {
        return Err(AccessError::Validation(
            "approver_subject must be non-empty".to_string(),
        ));
    }

    let current = get(db, request_id).await?;
    if current.status.is_terminal() {
        return Err(AccessError::Conflict(format!(
            "request `{request_id}` is already {}",
            current.status
        )));
    }
    if !policy::capabilities(role).can_decide {
        return Err(AccessError::Forbidden(format!(
            "role {role} may not decide access requests"
        )));
    }

    let new_status = match decision {
        Decision::Approved => RequestStatus::Approved,
        Decision::Rejected => RequestStatus::Rejected,
    };
    let note = match note.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => match decision {
            Decision::Approved => DEFAULT_APPROVED_NOTE.to_string(),
            Decision::Rejected => DEFAULT_REJECTED_NOTE.to_string(),
        },
    };
    let decided_at = Utc::now().timestamp();

    let update = Entity::update_many()
        .col_expr(Column::Status, Expr::value(new_status.as_str()))
        .col_expr(Column::DecidedBy, Expr::value(approver_subject))
        .col_expr(Column::DecidedAt, Expr::value(decided_at))
        .col_expr(Column::DecisionNote, Expr::value(note.as_str()))
        .filter(Column::Id.eq(request_id))
        .filter(Column::Status.eq(RequestStatus::Pending.as_str()))
        .exec(db)
        .await?;

    if update.rows_affected == 0 {
        // Lost the race: another decision committed between our read and
        // the conditional write.
        let after = get(db, request_id).await?;
        tracing::warn!(
            %request_id,
            status = after.status.as_str(),
            "concurrent decision lost the compare-and-set"
        );
        return Err(AccessError::Conflict(format!(
            "request `{request_id}` is already {}",
            after.status
        )));
    }

    audit::append(
        db,
        approver_subject,
        AuditAction::RequestDecided,
        "access_request",
        request_id,
        Some(json!({ "decision": decision.as_str(), "note": note })),
    )
    .await?;

    tracing::info!(
        %request_id,
        approver = approver_subject,
        decision = decision.as_str(),
        "access request decided"
    );

    if decision == Decision::Approved {
        if let Err(err) = grants::upsert(
            db,
            &current.requester_subject,
            &current.resource_ref,
            current.access_level,
            approver_subject,
        )
        .await
        {
            tracing::error!(%request_id, %err, "grant materialization failed after status commit");
            return Err(AccessError::PartialFailure {
                request_id: request_id.to_string(),
            });
        }
    }

    get(db, request_id).await
}

/// Idempotent recovery step for a partial failure: re-materialize the
/// grant for an APPROVED request. Safe to call repeatedly; the underlying
/// upsert replaces rather than appends.
pub async fn reconcile_grant(
    db: &DatabaseConnection,
    request_id: &str,
) -> Result<Grant, AccessError> {
    let request = get(db, request_id).await?;
    if request.status != RequestStatus::Approved {
        return Err(AccessError::Conflict(format!(
            "request `{request_id}` is {}, nothing to reconcile",
            request.status
        )));
    }
    let granted_by = request.decided_by.ok_or(AccessError::Corrupt {
        entity: "access_request",
        detail: "approved request has no decided_by".to_string(),
    })?;

    grants::upsert(
        db,
        &request.requester_subject,
        &request.resource_ref,
        request.access_level,
        &granted_by,
    )
    .await
}
