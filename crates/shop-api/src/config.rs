//! # Application Configuration

use shop_core::{CheckoutUrls, Currency};
use std::net::SocketAddr;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// SQLite database path
    pub database_url: String,
    /// Currency that catalog prices are denominated in
    pub currency: Currency,
    /// Payment method types offered at checkout
    pub payment_method_types: Vec<String>,
    /// Overrides for the post-checkout redirect targets
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            base_url: var("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            database_url: var("DATABASE_URL").unwrap_or_else(|| "storefront.db".to_string()),
            currency: var("SHOP_CURRENCY")
                .and_then(|c| Currency::from_code(&c))
                .unwrap_or_default(),
            payment_method_types: var("PAYMENT_METHOD_TYPES")
                .map(|v| parse_list(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| vec!["card".to_string()]),
            success_url: var("CHECKOUT_SUCCESS_URL"),
            cancel_url: var("CHECKOUT_CANCEL_URL"),
            log_format: match var("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Redirect targets for the hosted checkout page
    pub fn checkout_urls(&self) -> CheckoutUrls {
        let mut urls = CheckoutUrls::new(&self.base_url);
        if let Some(ref url) = self.success_url {
            urls.success_path = url.clone();
        }
        if let Some(ref url) = self.cancel_url {
            urls.cancel_path = url.clone();
        }
        urls
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            environment: "development".to_string(),
            database_url: "storefront.db".to_string(),
            currency: Currency::default(),
            payment_method_types: vec!["card".to_string()],
            success_url: None,
            cancel_url: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
