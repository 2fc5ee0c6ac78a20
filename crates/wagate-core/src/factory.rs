//! Provider registry and routing
//!
//! Routing decisions read a cached health flag per provider type. Flags start
//! at fixed defaults (Baileys healthy, Meta API unhealthy) and are refreshed
//! by [`ProviderFactory::is_provider_healthy`] once the cached entry is older
//! than the health TTL.

use crate::error::Result;
use crate::store::Database;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wagate_providers::{Error as ProviderError, ProviderType, SessionState, SharedProvider};

/// Session id used when probing a provider's health
pub const HEALTH_PROBE_SESSION_ID: &str = "health-check";

/// Default lifetime of a cached health flag
pub const DEFAULT_HEALTH_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct HealthEntry {
    healthy: bool,
    checked_at: Option<Instant>,
}

fn default_health(provider_type: ProviderType) -> bool {
    match provider_type {
        ProviderType::Baileys => true,
        ProviderType::MetaApi => false,
    }
}

/// Per-provider usage summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    /// Provider type
    pub provider_type: ProviderType,
    /// Cached health flag
    pub is_healthy: bool,
    /// Whether an instance is registered
    pub is_registered: bool,
    /// Sessions on this provider, all tenants
    pub total_sessions: i64,
    /// Active sessions on this provider, all tenants
    pub active_sessions: i64,
    /// Not tracked yet; always zero
    pub messages_sent: i64,
    /// Not tracked yet; always zero
    pub average_response_ms: f64,
}

/// Registry of provider instances with cached health flags
pub struct ProviderFactory {
    providers: HashMap<ProviderType, SharedProvider>,
    health: RwLock<HashMap<ProviderType, HealthEntry>>,
    health_ttl: Duration,
}

impl ProviderFactory {
    /// Create an empty factory
    #[must_use]
    pub fn new(health_ttl: Duration) -> Self {
        let health = ProviderType::ALL
            .into_iter()
            .map(|t| {
                (
                    t,
                    HealthEntry {
                        healthy: default_health(t),
                        checked_at: None,
                    },
                )
            })
            .collect();

        Self {
            providers: HashMap::new(),
            health: RwLock::new(health),
            health_ttl,
        }
    }

    /// Register a provider, replacing any previous one of the same type
    #[must_use]
    pub fn with_provider(mut self, provider: SharedProvider) -> Self {
        let provider_type = provider.provider_type();
        info!(provider = %provider_type, "Provider registered");
        self.providers.insert(provider_type, provider);
        self
    }

    /// Registered provider types
    pub fn registered(&self) -> Vec<ProviderType> {
        ProviderType::ALL
            .into_iter()
            .filter(|t| self.providers.contains_key(t))
            .collect()
    }

    /// Get the registered instance of a provider type
    pub fn get_provider(&self, provider_type: ProviderType) -> Result<SharedProvider> {
        self.providers
            .get(&provider_type)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(provider_type.to_string()).into())
    }

    /// Pick the provider for a tenant: the preferred one when its cached
    /// health flag is set, Baileys otherwise.
    pub fn get_provider_for_tenant(
        &self,
        tenant_id: Uuid,
        preferred: Option<ProviderType>,
    ) -> Result<SharedProvider> {
        if let Some(preferred) = preferred {
            if self.cached_health(preferred) && self.providers.contains_key(&preferred) {
                return self.get_provider(preferred);
            }
            debug!(%tenant_id, provider = %preferred, "Preferred provider unavailable, using Baileys");
        }

        self.get_provider(ProviderType::Baileys)
    }

    /// Cached health flag, without probing
    pub fn cached_health(&self, provider_type: ProviderType) -> bool {
        self.health
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&provider_type)
            .map_or_else(|| default_health(provider_type), |entry| entry.healthy)
    }

    fn fresh_health(&self, provider_type: ProviderType) -> Option<bool> {
        let health = self.health.read().unwrap_or_else(PoisonError::into_inner);
        let entry = health.get(&provider_type)?;
        let checked_at = entry.checked_at?;
        (checked_at.elapsed() < self.health_ttl).then_some(entry.healthy)
    }

    fn store_health(&self, provider_type: ProviderType, healthy: bool) {
        self.health
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                provider_type,
                HealthEntry {
                    healthy,
                    checked_at: Some(Instant::now()),
                },
            );
    }

    /// Health of a provider type, probing it when the cached flag is stale.
    ///
    /// Any probe state other than `critical_error` counts as healthy. A probe
    /// error keeps the type's default flag.
    pub async fn is_provider_healthy(&self, provider_type: ProviderType) -> bool {
        if let Some(healthy) = self.fresh_health(provider_type) {
            return healthy;
        }

        let healthy = match self.providers.get(&provider_type) {
            None => false,
            Some(provider) => match provider.get_status(HEALTH_PROBE_SESSION_ID).await {
                Ok(status) => status.state != SessionState::CriticalError,
                Err(e) => {
                    warn!(provider = %provider_type, error = %e, "Health probe failed");
                    default_health(provider_type)
                }
            },
        };

        self.store_health(provider_type, healthy);
        healthy
    }

    /// Usage summary for every provider type
    pub async fn get_provider_stats(&self, db: &Database) -> Result<Vec<ProviderStats>> {
        let mut stats = Vec::with_capacity(ProviderType::ALL.len());

        for provider_type in ProviderType::ALL {
            let (total_sessions, active_sessions) =
                db.count_sessions_by_provider(provider_type).await?;

            stats.push(ProviderStats {
                provider_type,
                is_healthy: self.is_provider_healthy(provider_type).await,
                is_registered: self.providers.contains_key(&provider_type),
                total_sessions,
                active_sessions,
                messages_sent: 0,
                average_response_ms: 0.0,
            });
        }

        Ok(stats)
    }
}
