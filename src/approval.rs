//! # Seller Approval Workflow
//!
//! `unregistered -> pending -> {seller, rejected}`, plus an admin-initiated
//! revoke from `seller` back to `buyer`. No state is terminal: the admin may
//! re-decide a rejection or revoke an approval at any time.
//!
//! Role changes are committed before any message is sent; a failed delivery
//! is logged and reported as `notified: false`, never as an error. Notices
//! are rendered in the recipient's last known language.

use std::sync::Arc;
use tracing::info;

use crate::directory::UserDirectory;
use crate::errors::{MarketError, MarketResult};
use crate::localization::{t_args_lang, t_lang};
use crate::models::{Actor, Role, User};
use crate::notifier::{notify_best_effort, Affordance, CallbackPayload, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerRequestOutcome {
    Submitted { admin_notified: bool },
    AlreadyPending,
    AlreadySeller,
    /// Fail closed: the role stays unchanged
    NoAdminConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub subject: User,
    pub new_role: Role,
    pub subject_notified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked { subject: User, subject_notified: bool },
    NotASeller { subject: User },
}

pub struct ApprovalWorkflow {
    directory: Arc<UserDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl ApprovalWorkflow {
    pub fn new(directory: Arc<UserDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            directory,
            notifier,
        }
    }

    pub async fn request_seller_status(&self, actor: &Actor) -> MarketResult<SellerRequestOutcome> {
        let handle = actor.handle.as_deref();
        self.directory.record(actor).await?;

        if self.directory.is_admin(actor.id, handle).await? {
            return Ok(SellerRequestOutcome::AlreadySeller);
        }

        match self.directory.role_of(actor.id).await? {
            Role::Seller => return Ok(SellerRequestOutcome::AlreadySeller),
            Role::Pending => return Ok(SellerRequestOutcome::AlreadyPending),
            _ => {}
        }

        let Some(admin_id) = self.directory.admin_id().await else {
            info!(user_id = actor.id, "Seller request refused, no administrator bound");
            return Ok(SellerRequestOutcome::NoAdminConfigured);
        };

        self.directory.set_role(actor.id, Role::Pending).await?;
        info!(user_id = actor.id, admin_id, "Seller request submitted");

        let admin_lang = self.directory.language_of(admin_id).await?;
        let admin_lang = admin_lang.as_deref();
        let user_id = actor.id.to_string();
        let text = t_args_lang(
            "admin-new-request",
            &[("user_id", &user_id), ("user", &actor.display_name())],
            admin_lang,
        );
        let buttons = vec![vec![
            Affordance::new(t_lang("button-approve", admin_lang), CallbackPayload::Approve(actor.id)),
            Affordance::new(t_lang("button-reject", admin_lang), CallbackPayload::Reject(actor.id)),
        ]];
        let admin_notified =
            notify_best_effort(self.notifier.as_ref(), admin_id, &text, &buttons).await;

        Ok(SellerRequestOutcome::Submitted { admin_notified })
    }

    /// Approve or reject a requester. Re-deciding re-sends the notice.
    pub async fn decide(&self, admin: &Actor, requester_id: i64, approve: bool) -> MarketResult<Decision> {
        let action = if approve { "approve sellers" } else { "reject sellers" };
        self.directory.require_admin(admin, action).await?;

        let subject = self
            .directory
            .get(requester_id)
            .await?
            .ok_or_else(|| MarketError::UserNotFound(requester_id.to_string()))?;

        let (new_role, notice) = if approve {
            (Role::Seller, "seller-approved-notice")
        } else {
            (Role::Rejected, "seller-rejected-notice")
        };

        self.directory.set_role(requester_id, new_role).await?;
        info!(
            admin_id = admin.id,
            user_id = requester_id,
            previous_role = %subject.role,
            new_role = %new_role,
            "Seller request decided"
        );

        let text = t_lang(notice, subject.language_code.as_deref());
        let subject_notified =
            notify_best_effort(self.notifier.as_ref(), requester_id, &text, &[]).await;

        Ok(Decision {
            subject,
            new_role,
            subject_notified,
        })
    }

    /// Take seller status away. The user drops back to `buyer` and may ask again.
    pub async fn revoke(&self, admin: &Actor, target_id: i64) -> MarketResult<RevokeOutcome> {
        self.directory.require_admin(admin, "revoke sellers").await?;

        let subject = self
            .directory
            .get(target_id)
            .await?
            .ok_or_else(|| MarketError::UserNotFound(target_id.to_string()))?;

        if subject.role != Role::Seller {
            return Ok(RevokeOutcome::NotASeller { subject });
        }

        self.directory.set_role(target_id, Role::Buyer).await?;
        info!(admin_id = admin.id, user_id = target_id, "Seller status revoked");

        let subject_notified = notify_best_effort(
            self.notifier.as_ref(),
            target_id,
            &t_lang("seller-revoked-notice", subject.language_code.as_deref()),
            &[],
        )
        .await;

        Ok(RevokeOutcome::Revoked {
            subject,
            subject_notified,
        })
    }
}
