//! # User Directory
//!
//! Maps identities to roles and decides who the administrator is.
//!
//! Admin status is decided by numeric identity only. The configured admin
//! handle is a bootstrap convenience: while no admin identity is bound, the
//! first interaction from a user carrying that handle binds their identity,
//! and from then on handles are never consulted.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::{MarketError, MarketResult};
use crate::models::{Actor, Role, User};
use crate::store::MarketStore;

pub const ADMIN_ID_SETTING: &str = "admin_id";

/// Result of an admin self-registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyAdmin,
    AdminAlreadyClaimed,
}

pub struct UserDirectory {
    store: Arc<dyn MarketStore>,
    admin_id: RwLock<Option<i64>>,
    admin_handle: Option<String>,
}

impl UserDirectory {
    /// Build a directory. The configured admin id wins over a persisted one.
    pub async fn load(
        store: Arc<dyn MarketStore>,
        configured_admin_id: Option<i64>,
        admin_handle: Option<String>,
    ) -> MarketResult<Self> {
        let admin_id = match configured_admin_id {
            Some(id) => Some(id),
            None => store
                .get_setting(ADMIN_ID_SETTING)
                .await?
                .and_then(|value| value.parse().ok()),
        };

        if let Some(id) = admin_id {
            info!(admin_id = id, "Administrator identity bound");
        } else if let Some(handle) = &admin_handle {
            info!(admin_handle = %handle, "Waiting for administrator handle to bind an identity");
        } else {
            warn!("No administrator configured; seller requests will be refused until /claim_admin");
        }

        Ok(Self {
            store,
            admin_id: RwLock::new(admin_id),
            admin_handle: admin_handle
                .map(|h| h.trim().trim_start_matches('@').to_string())
                .filter(|h| !h.is_empty()),
        })
    }

    pub fn store(&self) -> &Arc<dyn MarketStore> {
        &self.store
    }

    /// The bound admin identity, if any
    pub async fn admin_id(&self) -> Option<i64> {
        *self.admin_id.read().await
    }

    pub async fn get(&self, identity: i64) -> MarketResult<Option<User>> {
        self.store.get_user(identity).await
    }

    /// Resolve `123456` or `@handle` to a known user
    pub async fn resolve(&self, reference: &str) -> MarketResult<Option<User>> {
        let reference = reference.trim();
        match reference.parse::<i64>() {
            Ok(id) => self.store.get_user(id).await,
            Err(_) => self.store.find_user_by_handle(reference).await,
        }
    }

    /// Stored role, `Buyer` for unknown identities
    pub async fn role_of(&self, identity: i64) -> MarketResult<Role> {
        Ok(self
            .store
            .get_user(identity)
            .await?
            .map(|u| u.role)
            .unwrap_or_default())
    }

    /// Identity match against the bound admin. While nothing is bound, a
    /// matching handle binds the caller's identity.
    pub async fn is_admin(&self, identity: i64, handle: Option<&str>) -> MarketResult<bool> {
        if let Some(admin_id) = *self.admin_id.read().await {
            return Ok(admin_id == identity);
        }

        let handle_matches = match (&self.admin_handle, handle) {
            (Some(expected), Some(actual)) => {
                expected.eq_ignore_ascii_case(actual.trim_start_matches('@'))
            }
            _ => false,
        };
        if !handle_matches {
            return Ok(false);
        }

        if self.bind_admin(identity).await? != identity {
            return Ok(false);
        }
        self.store.update_role(identity, Role::Admin).await?;
        Ok(true)
    }

    /// Seller-only operations are open to sellers and to the admin
    pub async fn can_sell(&self, actor: &Actor) -> MarketResult<bool> {
        if self.is_admin(actor.id, actor.handle.as_deref()).await? {
            return Ok(true);
        }
        Ok(self.role_of(actor.id).await? == Role::Seller)
    }

    /// Record an interaction: create the user if absent and refresh the handle.
    /// A supplied role overwrites the stored one.
    pub async fn upsert(
        &self,
        identity: i64,
        handle: Option<&str>,
        role: Option<Role>,
    ) -> MarketResult<()> {
        let initial_role = match role {
            Some(role) => role,
            None if self.is_admin(identity, handle).await? => Role::Admin,
            None => Role::Buyer,
        };

        let created = self.store.insert_user(identity, handle, initial_role).await?;
        if !created {
            self.store.update_handle(identity, handle).await?;
            if let Some(role) = role {
                self.set_role(identity, role).await?;
            }
        }
        Ok(())
    }

    /// Record an inbound event from `actor`: upsert plus the client language
    pub async fn record(&self, actor: &Actor) -> MarketResult<()> {
        self.upsert(actor.id, actor.handle.as_deref(), None).await?;
        if let Some(language_code) = actor.lang() {
            self.store.update_language(actor.id, language_code).await?;
        }
        Ok(())
    }

    /// Stored language of a user, for messages sent outside a reply
    pub async fn language_of(&self, identity: i64) -> MarketResult<Option<String>> {
        Ok(self.store.get_user(identity).await?.and_then(|u| u.language_code))
    }

    pub async fn set_role(&self, identity: i64, role: Role) -> MarketResult<()> {
        self.store.update_role(identity, role).await?;
        info!(user_id = identity, role = %role, "Role updated");
        Ok(())
    }

    /// Admin self-registration, honoured only while no admin is bound
    pub async fn claim_admin(&self, actor: &Actor) -> MarketResult<ClaimOutcome> {
        let current = *self.admin_id.read().await;
        let outcome = match current {
            Some(id) if id == actor.id => ClaimOutcome::AlreadyAdmin,
            Some(_) => ClaimOutcome::AdminAlreadyClaimed,
            None => {
                if self.bind_admin(actor.id).await? == actor.id {
                    ClaimOutcome::Claimed
                } else {
                    ClaimOutcome::AdminAlreadyClaimed
                }
            }
        };

        match outcome {
            ClaimOutcome::Claimed | ClaimOutcome::AlreadyAdmin => {
                self.upsert(actor.id, actor.handle.as_deref(), Some(Role::Admin))
                    .await?;
            }
            ClaimOutcome::AdminAlreadyClaimed => {
                warn!(user_id = actor.id, "Rejected admin claim, an administrator is already bound");
            }
        }
        Ok(outcome)
    }

    /// Fail with `Unauthorized` unless the actor is the admin
    pub async fn require_admin(&self, actor: &Actor, action: &'static str) -> MarketResult<()> {
        if self.is_admin(actor.id, actor.handle.as_deref()).await? {
            Ok(())
        } else {
            warn!(user_id = actor.id, action, "Admin-only action refused");
            Err(MarketError::unauthorized(actor.id, action))
        }
    }

    /// Bind `identity` unless another identity won the race; returns the bound id
    async fn bind_admin(&self, identity: i64) -> MarketResult<i64> {
        let mut admin_id = self.admin_id.write().await;
        if let Some(existing) = *admin_id {
            return Ok(existing);
        }
        self.store
            .set_setting(ADMIN_ID_SETTING, &identity.to_string())
            .await?;
        *admin_id = Some(identity);
        info!(admin_id = identity, "Administrator identity bound");
        Ok(identity)
    }
}
