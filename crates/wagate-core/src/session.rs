//! Session lifecycle per (tenant, phone)
//!
//! ```text
//! not_found ──initialize──▶ qr_ready ──scan──▶ connected ──disconnect──▶ disconnected
//!                    └──────▶ failed / error
//! ```
//!
//! Reads go cache → database → live provider. Anything past the database
//! that fails is logged and skipped; the caller still gets the best status
//! available.

use crate::cache::StatusCache;
use crate::error::{Error, Result};
use crate::factory::ProviderFactory;
use crate::models::WhatsAppSession;
use crate::store::Database;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use wagate_providers::phone::{normalize, parse_session_key};
use wagate_providers::{ProviderType, SessionState, SessionStatus};

/// Session operations
#[derive(Clone)]
pub struct SessionService {
    db: Database,
    factory: Arc<ProviderFactory>,
    cache: StatusCache,
}

impl SessionService {
    /// Create the service
    pub fn new(db: Database, factory: Arc<ProviderFactory>, cache: StatusCache) -> Self {
        Self { db, factory, cache }
    }

    /// Provider registry in use
    pub fn factory(&self) -> &Arc<ProviderFactory> {
        &self.factory
    }

    /// Best-effort teardown of the provider side of a session
    async fn disconnect_remote(&self, session: &WhatsAppSession) {
        let Some(session_id) = session.session_data.session_id.as_deref() else {
            return;
        };

        match self.factory.get_provider(session.provider_type) {
            Ok(provider) => {
                if let Err(e) = provider.disconnect(session_id).await {
                    warn!(session_id, error = %e, "Provider disconnect failed");
                }
            }
            Err(e) => warn!(session_id, error = %e, "No provider to disconnect from"),
        }
    }

    /// Start a fresh session, replacing any previous one for the same phone.
    ///
    /// Provider failures are persisted as a `failed` status rather than
    /// returned as errors.
    #[instrument(skip(self))]
    pub async fn initialize_session(
        &self,
        tenant_id: Uuid,
        phone_number: &str,
        preferred: Option<ProviderType>,
    ) -> Result<SessionStatus> {
        let phone = normalize(phone_number);
        if phone.is_empty() {
            return Err(Error::InvalidInput("phone number is required".to_string()));
        }

        if let Some(existing) = self.db.find_session(tenant_id, &phone).await? {
            info!(%tenant_id, phone = %phone, "Replacing existing session");
            self.disconnect_remote(&existing).await;
            self.db.delete_session(tenant_id, &phone).await?;
            self.cache.invalidate(tenant_id, &phone).await;
        }

        let provider = self.factory.get_provider_for_tenant(tenant_id, preferred)?;
        let provider_type = provider.provider_type();

        let mut session = WhatsAppSession::new(tenant_id, &phone, provider_type);
        self.db.insert_session(&session).await?;

        let mut status = match provider.initialize(&tenant_id.to_string(), &phone).await {
            Ok(status) => status,
            Err(e) => {
                warn!(%tenant_id, phone = %phone, error = %e, "Provider initialize failed");
                SessionStatus::new(&phone, SessionState::Failed).with_message(e.to_string())
            }
        };
        status.phone_number = phone.clone();
        status.provider_type = Some(provider_type);

        session.apply_status(&status);
        self.db.update_session(&session).await?;

        self.cache.invalidate(tenant_id, &phone).await;
        self.cache.set_status(tenant_id, &phone, &status).await;
        if let Some(qr) = &status.qr_code {
            self.cache.set_qr(tenant_id, &phone, qr).await;
        }

        info!(%tenant_id, phone = %phone, provider = %provider_type, state = %status.state, "Session initialized");
        Ok(status)
    }

    /// Current status of a session; `not_found` when there is no row
    #[instrument(skip(self))]
    pub async fn get_session_status(&self, tenant_id: Uuid, phone_number: &str) -> SessionStatus {
        let phone = normalize(phone_number);

        if let Some(status) = self.cache.get_status(tenant_id, &phone).await {
            return status;
        }

        let mut session = match self.db.find_session(tenant_id, &phone).await {
            Ok(Some(session)) => session,
            Ok(None) => return SessionStatus::not_found(phone),
            Err(e) => {
                warn!(%tenant_id, phone = %phone, error = %e, "Session lookup failed");
                return SessionStatus::not_found(phone);
            }
        };

        let mut status = session.to_status();

        if let Some(session_id) = session.session_data.session_id.clone() {
            match self.factory.get_provider(session.provider_type) {
                Ok(provider) => match provider.get_status(&session_id).await {
                    Ok(mut live) => {
                        live.phone_number = phone.clone();
                        live.provider_type = Some(session.provider_type);
                        if live.session_id.is_none() {
                            live.session_id = Some(session_id.clone());
                        }

                        if live.state != status.state || live.qr_code != status.qr_code {
                            debug!(session_id = %session_id, from = %status.state, to = %live.state, "Live status differs from stored");
                            session.apply_status(&live);
                            if let Err(e) = self.db.update_session(&session).await {
                                warn!(session_id = %session_id, error = %e, "Failed to persist live status");
                            }
                            self.cache.invalidate(tenant_id, &phone).await;
                            if let Some(qr) = &live.qr_code {
                                self.cache.set_qr(tenant_id, &phone, qr).await;
                            }
                        }
                        status = live;
                    }
                    Err(e) => warn!(session_id = %session_id, error = %e, "Live status query failed"),
                },
                Err(e) => warn!(session_id = %session_id, error = %e, "Provider unavailable"),
            }
        }

        self.cache.set_status(tenant_id, &phone, &status).await;
        status
    }

    /// QR code for a session waiting to be paired
    #[instrument(skip(self))]
    pub async fn get_qr_code(&self, tenant_id: Uuid, phone_number: &str) -> Option<String> {
        let phone = normalize(phone_number);

        if let Some(qr) = self.cache.get_qr(tenant_id, &phone).await {
            return Some(qr);
        }

        let session = match self.db.find_session(tenant_id, &phone).await {
            Ok(session) => session?,
            Err(e) => {
                warn!(%tenant_id, phone = %phone, error = %e, "Session lookup failed");
                return None;
            }
        };

        if let Some(qr) = session.session_data.qr_code.clone() {
            self.cache.set_qr(tenant_id, &phone, &qr).await;
            return Some(qr);
        }

        let session_id = session.session_data.session_id.as_deref()?;
        let provider = match self.factory.get_provider(session.provider_type) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(session_id, error = %e, "Provider unavailable");
                return None;
            }
        };

        match provider.get_status(session_id).await {
            Ok(live) => {
                let qr = live.qr_code?;
                self.cache.set_qr(tenant_id, &phone, &qr).await;
                Some(qr)
            }
            Err(e) => {
                warn!(session_id, error = %e, "Live QR query failed");
                None
            }
        }
    }

    /// Log a session out and mark it inactive
    #[instrument(skip(self))]
    pub async fn disconnect_session(&self, tenant_id: Uuid, phone_number: &str) -> Result<SessionStatus> {
        let phone = normalize(phone_number);
        let mut session = self
            .db
            .find_session(tenant_id, &phone)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", phone)))?;

        self.disconnect_remote(&session).await;

        let status = SessionStatus::new(&phone, SessionState::Disconnected)
            .with_provider(session.provider_type);
        session.apply_status(&status);
        session.session_data.qr_code = None;
        self.db.update_session(&session).await?;
        self.cache.invalidate(tenant_id, &phone).await;

        info!(%tenant_id, phone = %phone, "Session disconnected");
        Ok(session.to_status())
    }

    /// Remove a session row entirely
    #[instrument(skip(self))]
    pub async fn delete_session(&self, tenant_id: Uuid, phone_number: &str) -> Result<()> {
        let phone = normalize(phone_number);
        let session = self
            .db
            .find_session(tenant_id, &phone)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", phone)))?;

        self.disconnect_remote(&session).await;
        self.db.delete_session(tenant_id, &phone).await?;
        self.cache.invalidate(tenant_id, &phone).await;

        info!(%tenant_id, phone = %phone, "Session deleted");
        Ok(())
    }

    /// Every session of a tenant as stored
    pub async fn list_sessions(&self, tenant_id: Uuid) -> Result<Vec<SessionStatus>> {
        if let Some(sessions) = self.cache.get_tenant_sessions(tenant_id).await {
            return Ok(sessions);
        }

        let sessions: Vec<SessionStatus> = self
            .db
            .list_sessions(tenant_id)
            .await?
            .iter()
            .map(WhatsAppSession::to_status)
            .collect();

        self.cache.set_tenant_sessions(tenant_id, &sessions).await;
        Ok(sessions)
    }

    /// Record a state change pushed by the bridge for `session-{tenant}-{phone}`
    #[instrument(skip(self, qr_code))]
    pub async fn apply_remote_status(
        &self,
        session_key: &str,
        state: SessionState,
        qr_code: Option<String>,
    ) -> Result<WhatsAppSession> {
        let (tenant_id, phone) = parse_session_key(session_key)?;
        let tenant_id = Uuid::parse_str(&tenant_id)
            .map_err(|e| Error::InvalidInput(format!("bad tenant id: {e}")))?;

        let mut session = self
            .db
            .find_session(tenant_id, &phone)
            .await?
            .ok_or_else(|| Error::NotFound(format!("session {}", session_key)))?;

        let status = SessionStatus::new(&phone, state)
            .with_session_id(session_key)
            .with_qr_code(qr_code)
            .with_provider(session.provider_type);
        session.apply_status(&status);
        self.db.update_session(&session).await?;

        self.cache.invalidate(tenant_id, &phone).await;
        self.cache.set_status(tenant_id, &phone, &status).await;
        if let Some(qr) = &status.qr_code {
            self.cache.set_qr(tenant_id, &phone, qr).await;
        }

        info!(%tenant_id, phone = %phone, state = %state, "Session status updated by bridge");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheTtls, MemorySessionCache};
    use crate::factory::tests::FakeProvider;
    use crate::factory::DEFAULT_HEALTH_TTL;
    use crate::models::Tenant;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    struct TestContext {
        service: SessionService,
        db: Database,
        baileys: Arc<FakeProvider>,
        tenant: Tenant,
        _dir: TempDir,
    }

    async fn create_test_context(cache: StatusCache) -> TestContext {
        let dir = TempDir::new().unwrap();
        let db = Database::from_path(&dir.path().join("sessions.db")).await.unwrap();
        let tenant = Tenant::new("Acme");
        db.create_tenant(&tenant).await.unwrap();

        let baileys = Arc::new(FakeProvider::new(ProviderType::Baileys));
        let factory = Arc::new(ProviderFactory::new(DEFAULT_HEALTH_TTL).with_provider(baileys.clone()));
        let service = SessionService::new(db.clone(), factory, cache);

        TestContext {
            service,
            db,
            baileys,
            tenant,
            _dir: dir,
        }
    }

    fn memory_cache() -> StatusCache {
        StatusCache::new(Arc::new(MemorySessionCache::new()), CacheTtls::default())
    }

    #[tokio::test]
    async fn test_initialize_returns_qr_and_persists() {
        let ctx = create_test_context(memory_cache()).await;

        let status = ctx
            .service
            .initialize_session(ctx.tenant.id, "+1 555 123 4567", None)
            .await
            .unwrap();

        assert_eq!(status.state, SessionState::QrReady);
        assert_eq!(status.phone_number, "15551234567");
        assert_eq!(status.provider_type, Some(ProviderType::Baileys));

        let row = ctx
            .db
            .find_session(ctx.tenant.id, "15551234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.session_data.qr_code.as_deref(), Some("qr-15551234567"));
        assert_eq!(
            row.session_data.session_id,
            Some(wagate_providers::phone::session_key(&ctx.tenant.id.to_string(), "15551234567"))
        );
    }

    #[tokio::test]
    async fn test_reinitialize_keeps_single_row() {
        let ctx = create_test_context(memory_cache()).await;

        for phone in ["+15551234567", "1555 123 4567", "15551234567"] {
            ctx.service
                .initialize_session(ctx.tenant.id, phone, None)
                .await
                .unwrap();
        }

        let sessions = ctx.db.list_sessions(ctx.tenant.id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].phone_number, "15551234567");
    }

    #[tokio::test]
    async fn test_empty_phone_rejected() {
        let ctx = create_test_context(memory_cache()).await;
        let err = ctx
            .service
            .initialize_session(ctx.tenant.id, " + ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_status_not_found_without_row() {
        let ctx = create_test_context(memory_cache()).await;
        let status = ctx.service.get_session_status(ctx.tenant.id, "1999").await;
        assert_eq!(status.state, SessionState::NotFound);
    }

    #[tokio::test]
    async fn test_status_uses_cache_before_provider() {
        let ctx = create_test_context(memory_cache()).await;
        ctx.service
            .initialize_session(ctx.tenant.id, "15551234567", None)
            .await
            .unwrap();

        let status = ctx.service.get_session_status(ctx.tenant.id, "15551234567").await;
        assert_eq!(status.state, SessionState::QrReady);
        assert_eq!(ctx.baileys.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_refreshes_from_provider_on_cache_miss() {
        let ctx = create_test_context(StatusCache::disabled()).await;
        ctx.service
            .initialize_session(ctx.tenant.id, "15551234567", None)
            .await
            .unwrap();

        // Fake provider reports Connected on status queries
        let status = ctx.service.get_session_status(ctx.tenant.id, "15551234567").await;
        assert_eq!(status.state, SessionState::Connected);
        assert_eq!(ctx.baileys.status_calls.load(Ordering::SeqCst), 1);

        let row = ctx
            .db
            .find_session(ctx.tenant.id, "15551234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.session_data.status, Some(SessionState::Connected));
    }

    #[tokio::test]
    async fn test_live_refresh_drops_stale_qr_and_list() {
        let ttls = CacheTtls {
            status: std::time::Duration::from_millis(1),
            ..CacheTtls::default()
        };
        let ctx = create_test_context(StatusCache::new(Arc::new(MemorySessionCache::new()), ttls)).await;
        ctx.service
            .initialize_session(ctx.tenant.id, "15551234567", None)
            .await
            .unwrap();
        let listed = ctx.service.list_sessions(ctx.tenant.id).await.unwrap();
        assert_eq!(listed[0].state, SessionState::QrReady);
        assert_eq!(
            ctx.service.get_qr_code(ctx.tenant.id, "15551234567").await.as_deref(),
            Some("qr-15551234567")
        );

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let status = ctx.service.get_session_status(ctx.tenant.id, "15551234567").await;
        assert_eq!(status.state, SessionState::Connected);

        assert!(ctx.service.get_qr_code(ctx.tenant.id, "15551234567").await.is_none());
        let listed = ctx.service.list_sessions(ctx.tenant.id).await.unwrap();
        assert_eq!(listed[0].state, SessionState::Connected);
    }

    #[tokio::test]
    async fn test_qr_from_cache_then_db() {
        let ctx = create_test_context(StatusCache::disabled()).await;
        ctx.service
            .initialize_session(ctx.tenant.id, "15551234567", None)
            .await
            .unwrap();

        let qr = ctx.service.get_qr_code(ctx.tenant.id, "15551234567").await;
        assert_eq!(qr.as_deref(), Some("qr-15551234567"));
        assert!(ctx.service.get_qr_code(ctx.tenant.id, "1999").await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_marks_inactive() {
        let ctx = create_test_context(memory_cache()).await;
        ctx.service
            .initialize_session(ctx.tenant.id, "15551234567", None)
            .await
            .unwrap();

        let status = ctx
            .service
            .disconnect_session(ctx.tenant.id, "15551234567")
            .await
            .unwrap();
        assert_eq!(status.state, SessionState::Disconnected);
        assert!(status.qr_code.is_none());

        let row = ctx
            .db
            .find_session(ctx.tenant.id, "15551234567")
            .await
            .unwrap()
            .unwrap();
        assert!(!row.is_active);

        // Cache was invalidated, so the next read sees the stored state
        let status = ctx.service.get_session_status(ctx.tenant.id, "15551234567").await;
        assert_ne!(status.state, SessionState::QrReady);
    }

    #[tokio::test]
    async fn test_delete_and_missing_session() {
        let ctx = create_test_context(memory_cache()).await;
        ctx.service
            .initialize_session(ctx.tenant.id, "15551234567", None)
            .await
            .unwrap();

        ctx.service
            .delete_session(ctx.tenant.id, "15551234567")
            .await
            .unwrap();
        assert!(ctx
            .service
            .delete_session(ctx.tenant.id, "15551234567")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(ctx
            .service
            .disconnect_session(ctx.tenant.id, "15551234567")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_list_sessions_invalidated_on_initialize() {
        let ctx = create_test_context(memory_cache()).await;
        assert!(ctx.service.list_sessions(ctx.tenant.id).await.unwrap().is_empty());

        ctx.service
            .initialize_session(ctx.tenant.id, "1111", None)
            .await
            .unwrap();
        ctx.service
            .initialize_session(ctx.tenant.id, "2222", None)
            .await
            .unwrap();

        assert_eq!(ctx.service.list_sessions(ctx.tenant.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_apply_remote_status() {
        let ctx = create_test_context(memory_cache()).await;
        ctx.service
            .initialize_session(ctx.tenant.id, "15551234567", None)
            .await
            .unwrap();

        let key = wagate_providers::phone::session_key(&ctx.tenant.id.to_string(), "15551234567");
        let session = ctx
            .service
            .apply_remote_status(&key, SessionState::Connected, None)
            .await
            .unwrap();
        assert!(session.is_active);
        assert!(session.session_data.qr_code.is_none());

        let status = ctx.service.get_session_status(ctx.tenant.id, "15551234567").await;
        assert_eq!(status.state, SessionState::Connected);

        assert!(ctx
            .service
            .apply_remote_status("garbage", SessionState::Connected, None)
            .await
            .is_err());
    }
}
