use serde_json::Value;
use uuid::Uuid;

use crate::{models::AuditEntry, repository::Store};

/// Append an audit row. Failures are logged and never fail the request.
pub async fn log_audit(
    store: &dyn Store,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    let entry = AuditEntry {
        user_id,
        action: action.to_string(),
        resource: resource.map(str::to_string),
        metadata,
    };

    if let Err(err) = store.record_audit(entry).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
