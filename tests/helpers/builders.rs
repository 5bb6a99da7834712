use portcullis::access::requests;
use portcullis::access::types::AccessRequest;
use sea_orm::DatabaseConnection;

/// Builder for creating PENDING access requests in tests
pub struct PendingRequestBuilder {
    requester_subject: String,
    resource_ref: String,
    access_level: String,
    reason: String,
}

impl PendingRequestBuilder {
    pub fn new(requester_subject: &str) -> Self {
        Self {
            requester_subject: requester_subject.to_string(),
            resource_ref: "res:sales".to_string(),
            access_level: "READER".to_string(),
            reason: "quarterly report".to_string(),
        }
    }

    pub fn with_resource(mut self, resource_ref: &str) -> Self {
        self.resource_ref = resource_ref.to_string();
        self
    }

    pub fn with_level(mut self, access_level: &str) -> Self {
        self.access_level = access_level.to_string();
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> AccessRequest {
        requests::submit(
            db,
            &self.requester_subject,
            &self.resource_ref,
            &self.access_level,
            &self.reason,
        )
        .await
        .expect("Failed to create test request")
    }
}
