//! Explicit per-request tenant context.

/// Identifies the tenant a request operates on.
///
/// Constructed only from verified sources — validated token claims or
/// a trusted provisioning path — and passed explicitly into
/// tenant-scoped calls. There is no ambient or thread-local tenant
/// state anywhere in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantContext {
    pub tenant_id: i64,
}

impl TenantContext {
    pub fn new(tenant_id: i64) -> Self {
        Self { tenant_id }
    }
}
