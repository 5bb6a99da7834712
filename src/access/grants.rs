//! Grant store: durable (subject, resource_ref) -> Grant mapping.
//!
//! Mutations are single-statement writes, atomic per key and independent
//! across keys. The lifecycle manager triggers them on approval; revocation
//! is an explicit administrative action, never a side effect of rejecting
//! a later request.

use crate::access::audit;
use crate::access::errors::AccessError;
use crate::access::types::{AccessLevel, AuditAction, Grant};
use crate::entities;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::json;

/// Insert or replace the grant for (subject, resource_ref). Last committed
/// write wins; at most one grant exists per pair.
pub async fn upsert(
    db: &DatabaseConnection,
    subject: &str,
    resource_ref: &str,
    level: AccessLevel,
    granted_by: &str,
) -> Result<Grant, AccessError> {
    use entities::grant::{ActiveModel, Column, Entity};

    if subject.trim().is_empty() || resource_ref.trim().is_empty() || granted_by.trim().is_empty()
    {
        return Err(AccessError::Validation(
            "grant subject, resource_ref, and granted_by must be non-empty".to_string(),
        ));
    }

    let granted_at = Utc::now().timestamp();
    let grant = ActiveModel {
        subject: Set(subject.to_string()),
        resource_ref: Set(resource_ref.to_string()),
        level: Set(level.as_str().to_string()),
        granted_by: Set(granted_by.to_string()),
        granted_at: Set(granted_at),
    };

    Entity::insert(grant)
        .on_conflict(
            OnConflict::columns([Column::Subject, Column::ResourceRef])
                .update_columns([Column::Level, Column::GrantedBy, Column::GrantedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;

    audit::append(
        db,
        granted_by,
        AuditAction::GrantAdded,
        "grant",
        &grant_entity_id(subject, resource_ref),
        Some(json!({ "level": level.as_str() })),
    )
    .await?;

    tracing::info!(%subject, %resource_ref, level = level.as_str(), "grant upserted");

    Ok(Grant {
        subject: subject.to_string(),
        resource_ref: resource_ref.to_string(),
        level,
        granted_by: granted_by.to_string(),
        granted_at,
    })
}

/// Remove the grant if present. Returns whether one existed; a no-op
/// revoke emits no audit event.
pub async fn revoke(
    db: &DatabaseConnection,
    actor_subject: &str,
    subject: &str,
    resource_ref: &str,
) -> Result<bool, AccessError> {
    use entities::grant::{Column, Entity};

    let res = Entity::delete_many()
        .filter(Column::Subject.eq(subject))
        .filter(Column::ResourceRef.eq(resource_ref))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return Ok(false);
    }

    audit::append(
        db,
        actor_subject,
        AuditAction::GrantRevoked,
        "grant",
        &grant_entity_id(subject, resource_ref),
        None,
    )
    .await?;

    tracing::info!(%subject, %resource_ref, actor = actor_subject, "grant revoked");
    Ok(true)
}

/// Pure read, no side effects.
pub async fn lookup(
    db: &DatabaseConnection,
    subject: &str,
    resource_ref: &str,
) -> Result<Option<Grant>, AccessError> {
    use entities::grant::{Column, Entity};

    let model = Entity::find()
        .filter(Column::Subject.eq(subject))
        .filter(Column::ResourceRef.eq(resource_ref))
        .one(db)
        .await?;

    model.map(Grant::try_from).transpose()
}

fn grant_entity_id(subject: &str, resource_ref: &str) -> String {
    format!("{subject}:{resource_ref}")
}
