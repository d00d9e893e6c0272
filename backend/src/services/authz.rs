//! Authorization gate for mutating operations
//!
//! Every mutating call goes through [`AuthzService::guard`]: permission is
//! checked before the operation runs, and one audit event is recorded per
//! logical attempt (denied, succeeded, or failed). The gate propagates the
//! operation's result untouched; it only observes it.

use std::future::Future;

use sqlx::PgPool;

use shared::models::AuditOutcome;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::AuditService;

/// Permission check plus audit wrapper around mutating operations
#[derive(Clone)]
pub struct AuthzService {
    audit: AuditService,
}

impl AuthzService {
    /// Create a new AuthzService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            audit: AuditService::new(db),
        }
    }

    /// Run `op` if `user` holds the `module:action` permission
    ///
    /// Denied attempts never execute `op`. Both branches are audited; audit
    /// failures are swallowed by the sink and can never fail the caller.
    pub async fn guard<T, F, Fut>(
        &self,
        user: &AuthUser,
        module: &str,
        action: &str,
        detail: &str,
        op: F,
    ) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let origin = user.origin.as_deref();

        if !user.has_permission(module, action) {
            self.audit
                .record(
                    user.user_id,
                    module,
                    action,
                    AuditOutcome::Denied,
                    detail,
                    origin,
                )
                .await;
            return Err(AppError::InsufficientPermissions);
        }

        let result = op().await;

        match &result {
            Ok(_) => {
                self.audit
                    .record(
                        user.user_id,
                        module,
                        action,
                        AuditOutcome::Succeeded,
                        detail,
                        origin,
                    )
                    .await;
            }
            Err(e) => {
                let failure = format!("{}: {}", detail, e);
                self.audit
                    .record(
                        user.user_id,
                        module,
                        action,
                        AuditOutcome::Failed,
                        &failure,
                        origin,
                    )
                    .await;
            }
        }

        result
    }
}
