//! Append-only audit sink. One immutable event per state-changing
//! operation; appends are durable before the triggering operation returns.

use crate::access::errors::AccessError;
use crate::access::types::{AuditAction, AuditEvent};
use crate::entities;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 500;

pub(crate) async fn append(
    db: &DatabaseConnection,
    actor_subject: &str,
    action: AuditAction,
    entity_type: &str,
    entity_id: &str,
    detail: Option<Value>,
) -> Result<(), AccessError> {
    let event = entities::audit_event::ActiveModel {
        ts: Set(Utc::now().timestamp()),
        actor_subject: Set(actor_subject.to_string()),
        action: Set(action.as_str().to_string()),
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id.to_string()),
        detail: Set(detail.map(|d| d.to_string())),
        ..Default::default()
    };
    event.insert(db).await?;
    Ok(())
}

/// Newest first. Ordered by timestamp, then by the auto-increment id so
/// events sharing a second keep a stable order.
pub async fn list(
    db: &DatabaseConnection,
    limit: Option<u64>,
) -> Result<Vec<AuditEvent>, AccessError> {
    use entities::audit_event::{Column, Entity};

    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let rows = Entity::find()
        .order_by_desc(Column::Ts)
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    rows.into_iter().map(AuditEvent::try_from).collect()
}
