use std::sync::Arc;

use crate::clients::{HttpMailer, Mailer, NullMailer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AccountService, SeaOrmAccountService};

/// Build a shared HTTP client with reasonable defaults for API calls.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Storefront/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub account_service: Arc<dyn AccountService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let mailer: Arc<dyn Mailer> = if config.mail.enabled {
            let http_client =
                build_shared_http_client(config.mail.request_timeout_seconds.into())?;
            Arc::new(HttpMailer::new(http_client, config.mail.clone()))
        } else {
            Arc::new(NullMailer)
        };

        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            mailer.clone(),
            config.security.clone(),
            config.site_base().to_string(),
        )) as Arc<dyn AccountService + Send + Sync + 'static>;

        Ok(Self {
            config,
            store,
            mailer,
            account_service,
        })
    }
}
