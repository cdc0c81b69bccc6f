//! Application initialization

pub mod routes;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use zapimg_core::Config;
use zapimg_payments::{BtcPayClient, BtcPayConfig, PaymentVerifier};
use zapimg_storage::create_storage;

use crate::session::SessionStore;
use crate::state::AppState;

/// Build the application: storage backend, payment client, session store,
/// and the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    let token = config
        .btcpay_token
        .clone()
        .context("BTC_PAY_SERVER_TOKEN must be set")?;
    let store_id = config
        .btcpay_store_id
        .clone()
        .context("BTC_PAY_SERVER_STORE_ID must be set")?;

    let btcpay = BtcPayClient::new(BtcPayConfig {
        base_url: config.btcpay_base_url.clone(),
        store_id,
        token,
        currency: config.payment_currency.clone(),
        invoice_expiration_minutes: config.invoice_expiration_minutes,
        timeout: Duration::from_secs(config.payment_timeout_secs),
    })
    .context("Failed to initialize BTCPay client")?;
    let payments = PaymentVerifier::new(Arc::new(btcpay), config.payment_amount_sats);

    let sessions = Arc::new(SessionStore::new(config.session_retention_days));
    spawn_session_purge(sessions.clone(), config.session_purge_interval_secs);

    let state = Arc::new(AppState::new(config, storage, payments, sessions));
    let router = routes::build_router(state.clone());

    Ok((state, router))
}

/// Periodically drop sessions idle past the retention window.
fn spawn_session_purge(store: Arc<SessionStore>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(60)));
        loop {
            interval.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                tracing::debug!(removed = removed, "Purged expired sessions");
            }
        }
    });
}
