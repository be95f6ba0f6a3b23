pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::database::{PgPostingStore, PostingStore};
use crate::error::{Error, Result};
use crate::services::{
    activation_service::ActivationService,
    payment_service::{HttpPaymentGateway, ListingPrice, PaymentGateway},
    posting_service::PostingService,
    storage_service::{LocalObjectStorage, ObjectStorage},
};

/// Public prefix under which stored images are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Clone)]
pub struct AppState {
    pub posting_service: PostingService,
    pub activation_service: ActivationService,
    pub jwt_secret: Arc<str>,
    pub webhook_secret: Arc<str>,
    pub public_rps: u32,
    pub employer_rps: u32,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let store: Arc<dyn PostingStore> = Arc::new(PgPostingStore::new(pool));
        let storage: Arc<dyn ObjectStorage> = Arc::new(LocalObjectStorage::new(
            &config.uploads_dir,
            UPLOADS_ROUTE,
        ));
        let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::new(
            http_client,
            config.payment_api_url.clone(),
            config.payment_api_key.clone(),
            &config.webapp_url,
        )?);
        let price = ListingPrice {
            amount_cents: config.listing_price_cents,
            currency: config.listing_currency.clone(),
        };

        let mut state = Self::from_parts(
            store,
            storage,
            gateway,
            price,
            &config.jwt_secret,
            &config.webhook_secret,
        );
        state.public_rps = config.public_rps;
        state.employer_rps = config.employer_rps;
        Ok(state)
    }

    /// Wires the services around arbitrary collaborators. Rate limits
    /// default to a generous value.
    pub fn from_parts(
        store: Arc<dyn PostingStore>,
        storage: Arc<dyn ObjectStorage>,
        gateway: Arc<dyn PaymentGateway>,
        price: ListingPrice,
        jwt_secret: &str,
        webhook_secret: &str,
    ) -> Self {
        let posting_service = PostingService::new(store, storage, gateway, price);
        let activation_service = posting_service.reconciler().clone();
        Self {
            posting_service,
            activation_service,
            jwt_secret: Arc::from(jwt_secret),
            webhook_secret: Arc::from(webhook_secret),
            public_rps: 1000,
            employer_rps: 1000,
        }
    }
}
