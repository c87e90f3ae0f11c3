// Active session holder. Passed explicitly to whoever needs it instead of
// living in a global user context.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{SessionRecord, SignInRequest};
use crate::store::Preferences;

#[derive(Debug, Default)]
pub struct SessionContext {
    active: RwLock<Option<SessionRecord>>,
}

impl SessionContext {
    pub fn new() -> Self {
        SessionContext::default()
    }

    pub async fn current(&self) -> Option<SessionRecord> {
        self.active.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.active.read().await.is_some()
    }

    // Makes `record` the active session without touching storage
    pub async fn establish(&self, record: SessionRecord) {
        tracing::info!(user_id = %record.user_id, role = ?record.role, "Session established");
        *self.active.write().await = Some(record);
    }

    // Credential sign-in: activates the session and overwrites the
    // last-session record. A failed write is returned as a warning.
    pub async fn sign_in(&self, request: SignInRequest, prefs: &Preferences) -> (SessionRecord, Option<String>) {
        let record = request.into_record(Utc::now());
        let warning = match prefs.save_last_session(&record) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist last-session record");
                Some(format!("Signed in, but the session could not be saved for quick login: {}", e))
            }
        };
        self.establish(record.clone()).await;
        (record, warning)
    }

    // Ends the active session and erases the last-session record. The
    // biometric preference is left alone.
    pub async fn logout(&self, prefs: &Preferences) -> Option<String> {
        let previous = self.active.write().await.take();
        if let Some(record) = &previous {
            tracing::info!(user_id = %record.user_id, "Session ended");
        }
        match prefs.clear_last_session() {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to erase last-session record");
                Some(format!("Signed out, but the saved session could not be erased: {}", e))
            }
        }
    }
}
