//! Tenant provisioning.
//!
//! A tenant without a `JWT_SECRET` can neither issue nor validate a
//! single token, so tenant and secret are created as one unit: if the
//! secret cannot be stored, the tenant row is rolled back.

use tessera_core::error::CoreResult;
use tessera_core::models::tenant::{CreateTenant, Tenant};
use tessera_core::repository::{SecretRepository, TenantRepository};
use tracing::{error, info};

use crate::crypto;
use crate::secrets::{JWT_SECRET_KEY, SecretService};

pub struct TenantProvisioning<T: TenantRepository, S: SecretRepository> {
    tenant_repo: T,
    secrets: SecretService<S>,
}

impl<T: TenantRepository, S: SecretRepository> TenantProvisioning<T, S> {
    pub fn new(tenant_repo: T, secrets: SecretService<S>) -> Self {
        Self {
            tenant_repo,
            secrets,
        }
    }

    /// Create a tenant together with a freshly generated 512-bit
    /// signing secret, stored encrypted under the tenant's scope.
    pub async fn register_tenant(&self, input: CreateTenant) -> CoreResult<Tenant> {
        let tenant = self.tenant_repo.create(input).await?;

        let signing_key = crypto::generate_secure_key();
        let result = self
            .secrets
            .set_secret(
                JWT_SECRET_KEY,
                &signing_key,
                tenant.id,
                "JWT signing secret",
                None,
            )
            .await;

        if let Err(e) = result {
            error!(
                tenant_id = tenant.id,
                error = %e,
                "failed to store tenant signing secret, rolling back tenant"
            );
            if let Err(rollback_err) = self.tenant_repo.delete(tenant.id).await {
                error!(tenant_id = tenant.id, error = %rollback_err, "tenant rollback failed");
            }
            return Err(e);
        }

        info!(tenant_id = tenant.id, name = %tenant.name, "tenant provisioned");
        Ok(tenant)
    }
}
