use super::rows::TenantRow;
use super::Database;
use crate::error::{Error, Result};
use crate::models::{Tenant, TenantSettings};
use chrono::Utc;
use uuid::Uuid;

impl Database {
    /// Create a tenant
    pub async fn create_tenant(&self, tenant: &Tenant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, client_id, name, settings, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant.id.to_string())
        .bind(&tenant.client_id)
        .bind(&tenant.name)
        .bind(serde_json::to_string(&tenant.settings)?)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a tenant by ID
    pub async fn get_tenant(&self, id: Uuid) -> Result<Tenant> {
        let row: TenantRow = sqlx::query_as("SELECT * FROM tenants WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("tenant {}", id)))?;

        row.try_into()
    }

    /// Look a tenant up by its public client id
    pub async fn find_tenant_by_client_id(&self, client_id: &str) -> Result<Option<Tenant>> {
        let row: Option<TenantRow> = sqlx::query_as("SELECT * FROM tenants WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Replace a tenant's settings
    pub async fn update_tenant_settings(&self, id: Uuid, settings: &TenantSettings) -> Result<()> {
        let result = sqlx::query("UPDATE tenants SET settings = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(settings)?)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("tenant {}", id)));
        }

        Ok(())
    }
}
