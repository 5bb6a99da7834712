use crate::access::errors::AccessError;
use crate::entities;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role, supplied pre-authenticated on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Viewer,
    Requester,
    DataSteward,
    DataOwner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "VIEWER",
            Role::Requester => "REQUESTER",
            Role::DataSteward => "DATA_STEWARD",
            Role::DataOwner => "DATA_OWNER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIEWER" => Ok(Role::Viewer),
            "REQUESTER" => Ok(Role::Requester),
            "DATA_STEWARD" => Ok(Role::DataSteward),
            "DATA_OWNER" => Ok(Role::DataOwner),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AccessError::Validation(format!("unknown role `{other}`"))),
        }
    }
}

/// Access level carried by a request and by the grant it materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    Reader,
    Writer,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Reader => "READER",
            AccessLevel::Writer => "WRITER",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READER" => Ok(AccessLevel::Reader),
            "WRITER" => Ok(AccessLevel::Writer),
            other => Err(AccessError::Validation(format!(
                "unknown access level `{other}`"
            ))),
        }
    }
}

/// Terminal outcome an approver selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "APPROVED",
            Decision::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(Decision::Approved),
            "REJECTED" => Ok(Decision::Rejected),
            other => Err(AccessError::Validation(format!(
                "decision must be APPROVED or REJECTED, got `{other}`"
            ))),
        }
    }
}

/// Request status. PENDING transitions exactly once; APPROVED and REJECTED
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "APPROVED" => Ok(RequestStatus::Approved),
            "REJECTED" => Ok(RequestStatus::Rejected),
            other => Err(AccessError::Validation(format!(
                "unknown request status `{other}`"
            ))),
        }
    }
}

/// Audit event vocabulary, one action per state-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RequestSubmitted,
    RequestDecided,
    GrantAdded,
    GrantRevoked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RequestSubmitted => "REQUEST_SUBMITTED",
            AuditAction::RequestDecided => "REQUEST_DECIDED",
            AuditAction::GrantAdded => "GRANT_ADDED",
            AuditAction::GrantRevoked => "GRANT_REVOKED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUEST_SUBMITTED" => Ok(AuditAction::RequestSubmitted),
            "REQUEST_DECIDED" => Ok(AuditAction::RequestDecided),
            "GRANT_ADDED" => Ok(AuditAction::GrantAdded),
            "GRANT_REVOKED" => Ok(AuditAction::GrantRevoked),
            other => Err(AccessError::Validation(format!(
                "unknown audit action `{other}`"
            ))),
        }
    }
}

/// Why an access check resolved the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessReason {
    PrivilegedRole,
    Granted,
    NoGrant,
}

/// Result of a policy resolution for (subject, role, resource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCheck {
    pub allowed: bool,
    pub reason: AccessReason,
}

/// One row of the static role capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCapabilities {
    pub can_submit_request: bool,
    pub can_decide: bool,
    pub can_view_queue: bool,
    pub can_view_audit: bool,
    pub bypasses_grant_check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub id: String,
    pub resource_ref: String,
    pub requester_subject: String,
    pub access_level: AccessLevel,
    pub reason: String,
    pub status: RequestStatus,
    pub created_at: i64,
    pub decided_by: Option<String>,
    pub decided_at: Option<i64>,
    pub decision_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub subject: String,
    pub resource_ref: String,
    pub level: AccessLevel,
    pub granted_by: String,
    pub granted_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: i32,
    pub ts: i64,
    pub actor_subject: String,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub detail: Option<serde_json::Value>,
}

impl TryFrom<entities::access_request::Model> for AccessRequest {
    type Error = AccessError;

    fn try_from(m: entities::access_request::Model) -> Result<Self, Self::Error> {
        let status = m.status.parse().map_err(|_| AccessError::Corrupt {
            entity: "access_request",
            detail: format!("unrecognized status `{}`", m.status),
        })?;
        let access_level = m.access_level.parse().map_err(|_| AccessError::Corrupt {
            entity: "access_request",
            detail: format!("unrecognized access level `{}`", m.access_level),
        })?;
        Ok(AccessRequest {
            id: m.id,
            resource_ref: m.resource_ref,
            requester_subject: m.requester_subject,
            access_level,
            reason: m.reason,
            status,
            created_at: m.created_at,
            decided_by: m.decided_by,
            decided_at: m.decided_at,
            decision_note: m.decision_note,
        })
    }
}

impl TryFrom<entities::grant::Model> for Grant {
    type Error = AccessError;

    fn try_from(m: entities::grant::Model) -> Result<Self, Self::Error> {
        let level = m.level.parse().map_err(|_| AccessError::Corrupt {
            entity: "grant",
            detail: format!("unrecognized access level `{}`", m.level),
        })?;
        Ok(Grant {
            subject: m.subject,
            resource_ref: m.resource_ref,
            level,
            granted_by: m.granted_by,
            granted_at: m.granted_at,
        })
    }
}

impl TryFrom<entities::audit_event::Model> for AuditEvent {
    type Error = AccessError;

    fn try_from(m: entities::audit_event::Model) -> Result<Self, Self::Error> {
        let action = m.action.parse().map_err(|_| AccessError::Corrupt {
            entity: "audit_event",
            detail: format!("unrecognized action `{}`", m.action),
        })?;
        let detail = match m.detail {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| AccessError::Corrupt {
                entity: "audit_event",
                detail: format!("undecodable detail payload: {e}"),
            })?),
            None => None,
        };
        Ok(AuditEvent {
            id: m.id,
            ts: m.ts,
            actor_subject: m.actor_subject,
            action,
            entity_type: m.entity_type,
            entity_id: m.entity_id,
            detail,
        })
    }
}
