//! Application context shared by every handler.

use std::sync::Arc;

use crate::approval::ApprovalWorkflow;
use crate::catalog::CatalogStore;
use crate::dialogue::Conversations;
use crate::directory::UserDirectory;
use crate::errors::MarketResult;
use crate::notifier::Notifier;
use crate::product_flow::ProductEntryFlow;
use crate::store::MarketStore;

/// Admin identity settings as read from the configuration
#[derive(Debug, Clone, Default)]
pub struct AdminSettings {
    pub admin_id: Option<i64>,
    pub admin_handle: Option<String>,
}

pub struct Marketplace {
    pub directory: Arc<UserDirectory>,
    pub catalog: CatalogStore,
    pub approval: ApprovalWorkflow,
    pub products: ProductEntryFlow,
    pub conversations: Arc<Conversations>,
}

impl Marketplace {
    pub async fn new(
        store: Arc<dyn MarketStore>,
        notifier: Arc<dyn Notifier>,
        admin: AdminSettings,
    ) -> MarketResult<Self> {
        let directory =
            Arc::new(UserDirectory::load(store.clone(), admin.admin_id, admin.admin_handle).await?);
        let catalog = CatalogStore::new(store);
        let conversations = Arc::new(Conversations::new());

        Ok(Self {
            approval: ApprovalWorkflow::new(directory.clone(), notifier),
            products: ProductEntryFlow::new(directory.clone(), catalog.clone(), conversations.clone()),
            directory,
            catalog,
            conversations,
        })
    }
}
