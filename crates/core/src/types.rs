/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Tenant/user attribution carried through every sync invocation.
///
/// Session and auth resolution happen upstream of this crate; by the time
/// a sync operation runs, the caller has already been resolved to a tenant
/// and (optionally) an acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: DbId,
    pub user_id: Option<DbId>,
}

impl TenantContext {
    pub fn new(tenant_id: DbId) -> Self {
        Self {
            tenant_id,
            user_id: None,
        }
    }

    pub fn with_user(tenant_id: DbId, user_id: DbId) -> Self {
        Self {
            tenant_id,
            user_id: Some(user_id),
        }
    }
}
