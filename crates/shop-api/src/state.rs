//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the database handle, the payment strategy and configuration.

use crate::config::AppConfig;
use shop_core::{BoxedPaymentStrategy, CatalogSeed, CheckoutUrls};
use shop_db::ShopDatabase;
use shop_stripe::StripeCheckoutStrategy;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Storage
    pub db: ShopDatabase,
    /// Payment provider
    pub strategy: BoxedPaymentStrategy,
    /// Checkout URLs
    pub urls: CheckoutUrls,
    /// Application config
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, db: ShopDatabase, strategy: BoxedPaymentStrategy) -> Self {
        Self {
            urls: config.checkout_urls(),
            db,
            strategy,
            config: Arc::new(config),
        }
    }

    /// Build state from the environment: open the database, seed the
    /// catalog if it is empty, and configure Stripe.
    pub fn from_env(config: AppConfig) -> anyhow::Result<Self> {
        let db = ShopDatabase::open(&config.database_url)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", config.database_url, e))?
            .with_currency(config.currency);

        seed_catalog(&db)?;

        let stripe_strategy = StripeCheckoutStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        info!("Stripe configured: {:?}", stripe_strategy.config());

        Ok(Self::new(
            config,
            db,
            Arc::new(stripe_strategy) as BoxedPaymentStrategy,
        ))
    }

    /// Success URL with session ID placeholder
    pub fn success_url(&self) -> String {
        self.urls.success_url_with_session()
    }

    pub fn cancel_url(&self) -> String {
        self.urls.cancel_url()
    }
}

/// Load `config/catalog.toml` into an empty catalog
fn seed_catalog(db: &ShopDatabase) -> anyhow::Result<()> {
    if db.catalog().count_products()? > 0 {
        return Ok(());
    }

    let config_paths = [
        "config/catalog.toml",
        "../config/catalog.toml",
        "../../config/catalog.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let seed = CatalogSeed::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            let count = db.catalog().seed(&seed)?;
            info!("Loaded {} products from {}", count, path);
            return Ok(());
        }
    }

    warn!("Catalog is empty and no config/catalog.toml was found");
    Ok(())
}
