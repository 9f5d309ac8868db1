use std::sync::Arc;

use crate::config::Config;
use crate::db::DbPool;
use crate::notify::Notifier;
use crate::payments::PaymentProvider;
use crate::signing::UrlSigner;

/// Shared application state handed to every handler
///
/// The payment processor and notifier sit behind trait objects so the
/// server can swap in the sandbox implementations when nothing real is
/// configured, and tests can inject failing ones.
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub config: Config,
    pub payments: Arc<dyn PaymentProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub signer: UrlSigner,
}

impl AppState {
    pub fn new(
        pool: Arc<DbPool>,
        config: Config,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let signer = UrlSigner::new(&config.public_base_url, &config.storage_secret);

        Arc::new(Self {
            pool,
            config,
            payments,
            notifier,
            signer,
        })
    }
}
