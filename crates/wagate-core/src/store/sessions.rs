use super::rows::SessionRow;
use super::Database;
use crate::error::{Error, Result};
use crate::models::WhatsAppSession;
use chrono::Utc;
use uuid::Uuid;
use wagate_providers::ProviderType;

impl Database {
    /// Insert a session row
    pub async fn insert_session(&self, session: &WhatsAppSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO whatsapp_sessions (
                id, tenant_id, phone_number, provider_type, session_data,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.id.to_string())
        .bind(session.tenant_id.to_string())
        .bind(&session.phone_number)
        .bind(session.provider_type.as_str())
        .bind(serde_json::to_string(&session.session_data)?)
        .bind(session.is_active)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find the session for a (tenant, phone) pair
    pub async fn find_session(
        &self,
        tenant_id: Uuid,
        phone_number: &str,
    ) -> Result<Option<WhatsAppSession>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT * FROM whatsapp_sessions WHERE tenant_id = ? AND phone_number = ?",
        )
        .bind(tenant_id.to_string())
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find the most recently updated session on a provider for a phone
    /// number, regardless of tenant. Used to route Cloud API webhooks.
    pub async fn find_session_by_provider_phone(
        &self,
        provider_type: ProviderType,
        phone_number: &str,
    ) -> Result<Option<WhatsAppSession>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT * FROM whatsapp_sessions
            WHERE provider_type = ? AND phone_number = ?
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(provider_type.as_str())
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Persist metadata and active flag of a session
    pub async fn update_session(&self, session: &WhatsAppSession) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE whatsapp_sessions
            SET session_data = ?, is_active = ?, updated_at = ?
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(serde_json::to_string(&session.session_data)?)
        .bind(session.is_active)
        .bind(Utc::now())
        .bind(session.id.to_string())
        .bind(session.tenant_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("session {}", session.id)));
        }

        Ok(())
    }

    /// Delete the session for a (tenant, phone) pair. Returns whether a row went away.
    pub async fn delete_session(&self, tenant_id: Uuid, phone_number: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM whatsapp_sessions WHERE tenant_id = ? AND phone_number = ?")
                .bind(tenant_id.to_string())
                .bind(phone_number)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All sessions of a tenant, newest first
    pub async fn list_sessions(&self, tenant_id: Uuid) -> Result<Vec<WhatsAppSession>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT * FROM whatsapp_sessions WHERE tenant_id = ? ORDER BY created_at DESC",
        )
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// (total, active) session counts for a provider across all tenants
    pub async fn count_sessions_by_provider(&self, provider_type: ProviderType) -> Result<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_active THEN 1 ELSE 0 END), 0)
            FROM whatsapp_sessions
            WHERE provider_type = ?
            "#,
        )
        .bind(provider_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
