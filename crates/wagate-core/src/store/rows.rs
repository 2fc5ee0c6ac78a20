//! Raw rows and their conversion into models

use super::parse_uuid;
use crate::error::{Error, Result};
use crate::models::{AiAgent, AiConversation, Message, Tenant, WhatsAppSession};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(FromRow)]
pub(super) struct TenantRow {
    id: String,
    client_id: String,
    name: String,
    settings: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = Error;

    fn try_from(row: TenantRow) -> Result<Self> {
        Ok(Tenant {
            id: parse_uuid(&row.id, "tenant")?,
            client_id: row.client_id,
            name: row.name,
            settings: serde_json::from_str(&row.settings)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
pub(super) struct SessionRow {
    id: String,
    tenant_id: String,
    phone_number: String,
    provider_type: String,
    session_data: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for WhatsAppSession {
    type Error = Error;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(WhatsAppSession {
            id: parse_uuid(&row.id, "session")?,
            tenant_id: parse_uuid(&row.tenant_id, "tenant")?,
            phone_number: row.phone_number,
            provider_type: row.provider_type.parse()?,
            session_data: serde_json::from_str(&row.session_data)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
pub(super) struct MessageRow {
    id: String,
    tenant_id: String,
    session_id: String,
    message_id: String,
    direction: String,
    from_number: String,
    to_number: String,
    message_type: String,
    content: String,
    status: String,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        Ok(Message {
            id: parse_uuid(&row.id, "message")?,
            tenant_id: parse_uuid(&row.tenant_id, "tenant")?,
            session_id: parse_uuid(&row.session_id, "session")?,
            message_id: row.message_id,
            direction: row.direction.parse()?,
            from_number: row.from_number,
            to_number: row.to_number,
            message_type: row.message_type.parse()?,
            content: serde_json::from_str(&row.content)?,
            status: row.status.parse()?,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
pub(super) struct AgentRow {
    id: String,
    tenant_id: String,
    name: String,
    system_prompt: String,
    is_active: bool,
    configuration: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AgentRow> for AiAgent {
    type Error = Error;

    fn try_from(row: AgentRow) -> Result<Self> {
        Ok(AiAgent {
            id: parse_uuid(&row.id, "agent")?,
            tenant_id: parse_uuid(&row.tenant_id, "tenant")?,
            name: row.name,
            system_prompt: row.system_prompt,
            is_active: row.is_active,
            configuration: serde_json::from_str(&row.configuration)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
pub(super) struct ConversationRow {
    id: String,
    tenant_id: String,
    agent_id: String,
    phone_number: String,
    context: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRow> for AiConversation {
    type Error = Error;

    fn try_from(row: ConversationRow) -> Result<Self> {
        Ok(AiConversation {
            id: parse_uuid(&row.id, "conversation")?,
            tenant_id: parse_uuid(&row.tenant_id, "tenant")?,
            agent_id: parse_uuid(&row.agent_id, "agent")?,
            phone_number: row.phone_number,
            context: serde_json::from_str(&row.context)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
