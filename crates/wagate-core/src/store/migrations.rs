use super::Database;
use crate::error::{Error, Result};

const TABLES: &[(&str, &str)] = &[
    (
        "tenants",
        r#"
        CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            settings TEXT NOT NULL DEFAULT '{}',
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    ),
    (
        "whatsapp_sessions",
        r#"
        CREATE TABLE IF NOT EXISTS whatsapp_sessions (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            provider_type TEXT NOT NULL,
            session_data TEXT NOT NULL DEFAULT '{}',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            UNIQUE (tenant_id, phone_number),
            FOREIGN KEY (tenant_id) REFERENCES tenants(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "messages",
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            session_id TEXT NOT NULL,
            message_id TEXT NOT NULL,
            direction TEXT NOT NULL,
            from_number TEXT NOT NULL,
            to_number TEXT NOT NULL,
            message_type TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL,
            error TEXT,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            UNIQUE (tenant_id, direction, message_id),
            FOREIGN KEY (tenant_id) REFERENCES tenants(id) ON DELETE CASCADE,
            FOREIGN KEY (session_id) REFERENCES whatsapp_sessions(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "ai_agents",
        r#"
        CREATE TABLE IF NOT EXISTS ai_agents (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            system_prompt TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            configuration TEXT NOT NULL DEFAULT '{}',
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            FOREIGN KEY (tenant_id) REFERENCES tenants(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "ai_conversations",
        r#"
        CREATE TABLE IF NOT EXISTS ai_conversations (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            agent_id TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            context TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            UNIQUE (agent_id, phone_number),
            FOREIGN KEY (agent_id) REFERENCES ai_agents(id) ON DELETE CASCADE
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_sessions_tenant ON whatsapp_sessions(tenant_id)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_provider_phone ON whatsapp_sessions(provider_type, phone_number)",
    "CREATE INDEX IF NOT EXISTS idx_messages_tenant_created ON messages(tenant_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_agents_tenant ON ai_agents(tenant_id)",
];

impl Database {
    /// Run database migrations (idempotent)
    pub async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (table, ddl) in TABLES {
            sqlx::query(ddl)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Internal(format!("Migration failed ({}): {}", table, e)))?;
        }

        for ddl in INDEXES {
            sqlx::query(ddl)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Internal(format!("Migration failed (index): {}", e)))?;
        }

        tx.commit().await?;
        Ok(())
    }
}
