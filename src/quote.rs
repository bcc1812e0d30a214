use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use coursemax_distance::{call_with_retry, DistanceError, DistanceProvider, RetryPolicy};
use coursemax_metrics::{QUOTES_CALCULATED, QUOTE_DURATION, QUOTE_FAILURES};
use coursemax_pricing::calculate_delivery_fee;
use coursemax_types::{
    ClientInfo, DeliveryFeeRequest, DeliveryFeeResponse, DistanceSummary, DurationSummary,
    StoreInfo,
};

/// Store lookup consumed by the quote flow. Store management itself lives
/// elsewhere; the quote service only needs an address for an ID.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn store_info(&self, store_id: &str) -> Option<StoreInfo>;
}

/// Map-backed directory for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryStoreDirectory {
    stores: std::collections::HashMap<String, StoreInfo>,
}

impl InMemoryStoreDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, store: StoreInfo) {
        self.stores.insert(store.id.clone(), store);
    }
}

#[async_trait]
impl StoreDirectory for InMemoryStoreDirectory {
    async fn store_info(&self, store_id: &str) -> Option<StoreInfo> {
        self.stores.get(store_id).cloned()
    }
}

/// Failures of the quote flow, typed so the frontend can distinguish "fix
/// your input" from "try again" from "no route exists".
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error("unable to calculate delivery fee: {0}")]
    DistanceUnavailable(#[from] DistanceError),
}

impl QuoteError {
    /// Whether a retry might succeed. A missing route or a bad address will
    /// not improve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DistanceUnavailable(e) if e.is_retryable())
    }

    fn metric_label(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::StoreNotFound(_) => "store_not_found",
            Self::DistanceUnavailable(DistanceError::NoRoute) => "no_route",
            Self::DistanceUnavailable(DistanceError::AddressNotFound(_)) => "address_not_found",
            Self::DistanceUnavailable(_) => "provider_unavailable",
        }
    }
}

/// Computes delivery-fee quotes: store lookup, geocoding both endpoints,
/// routing, then the tiered pricing engine.
///
/// Distance failures surface as typed errors and no fallback fee is ever
/// substituted for a failed lookup.
pub struct QuoteService<P, D> {
    provider: Arc<P>,
    directory: Arc<D>,
    retry: RetryPolicy,
}

impl<P, D> QuoteService<P, D>
where
    P: DistanceProvider,
    D: StoreDirectory,
{
    pub fn new(provider: Arc<P>, directory: Arc<D>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            directory,
            retry,
        }
    }

    pub async fn delivery_fee_quote(
        &self,
        request: &DeliveryFeeRequest,
    ) -> Result<DeliveryFeeResponse, QuoteError> {
        let timer = QUOTE_DURATION.start_timer();
        let result = self.quote_inner(request).await;
        timer.observe_duration();

        match &result {
            Ok(response) => {
                QUOTES_CALCULATED.inc();
                info!(
                    store_id = %request.store_id,
                    distance_km = %response.calculation.distance_km,
                    fee = %response.calculation.delivery_fee,
                    tier = %response.calculation.pricing_tier,
                    "delivery fee quoted"
                );
            }
            Err(e) => {
                QUOTE_FAILURES.with_label_values(&[e.metric_label()]).inc();
                warn!(store_id = %request.store_id, error = %e, "quote failed");
            }
        }
        result
    }

    async fn quote_inner(
        &self,
        request: &DeliveryFeeRequest,
    ) -> Result<DeliveryFeeResponse, QuoteError> {
        if request.client_address.trim().is_empty() {
            return Err(QuoteError::InvalidRequest("missing client address".into()));
        }
        if request.client_city.trim().is_empty() {
            return Err(QuoteError::InvalidRequest("missing client city".into()));
        }

        let store = self
            .directory
            .store_info(&request.store_id)
            .await
            .ok_or_else(|| QuoteError::StoreNotFound(request.store_id.clone()))?;

        let client = ClientInfo {
            address: request.client_address.clone(),
            city: request.client_city.clone(),
            postal_code: request.client_postal_code.clone(),
        };

        let store_address = store.full_address();
        let origin = call_with_retry(&self.retry, || self.provider.geocode(&store_address)).await?;

        let client_address = client.full_address();
        let destination =
            call_with_retry(&self.retry, || self.provider.geocode(&client_address)).await?;

        let route =
            call_with_retry(&self.retry, || self.provider.route(origin, destination)).await?;

        let distance_km = Decimal::new(route.distance_meters as i64, 3);
        let duration_minutes = route.duration_seconds.div_ceil(60) as u32;

        let calculation = calculate_delivery_fee(distance_km, duration_minutes);

        Ok(DeliveryFeeResponse {
            distance: DistanceSummary {
                km: calculation.distance_km,
                meters: route.distance_meters,
            },
            estimated_duration: DurationSummary {
                minutes: duration_minutes,
                seconds: route.duration_seconds,
            },
            calculation,
            store_info: store,
            client_info: client,
        })
    }
}

/// Build the retry policy for provider calls from distance settings.
pub fn retry_policy_from(config: &coursemax_config::DistanceConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.max_retries,
        initial_delay: Duration::from_millis(config.initial_retry_delay_ms),
        max_delay: Duration::from_secs(5),
        call_timeout: Duration::from_millis(config.timeout_ms),
    }
}
