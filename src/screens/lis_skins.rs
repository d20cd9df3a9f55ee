//! Skin marketplace settings of a streamer: prize price range and the
//! trade URL prizes are bought with.

use futures::FutureExt;

use crate::api::ServiceClient;
use crate::domain::{PriceRange, TradeUrl};
use crate::error::SyncError;
use crate::sync::{load_all, Fetcher, ManagedResource, OptimisticExecutor};

pub const PRICE_RANGE: &str = "price_range";
pub const TRADE_URL: &str = "trade_url";

enum Section {
    PriceRange(PriceRange),
    TradeUrl(TradeUrl),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LisSkinsSettings {
    pub price_range: PriceRange,
    pub trade_url: Option<String>,
    /// Sections that failed to load on the last refresh.
    pub missing: Vec<&'static str>,
}

pub struct LisSkinsModel {
    client: ServiceClient,
    price_range: ManagedResource<PriceRange>,
    trade_url: ManagedResource<Option<String>>,
}

impl LisSkinsModel {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            price_range: ManagedResource::new(PriceRange::default()),
            trade_url: ManagedResource::new(None),
        }
    }

    pub fn price_range(&self) -> &ManagedResource<PriceRange> {
        &self.price_range
    }

    pub fn trade_url(&self) -> &ManagedResource<Option<String>> {
        &self.trade_url
    }

    pub fn settings(&self) -> LisSkinsSettings {
        LisSkinsSettings {
            price_range: self.price_range.visible(),
            trade_url: self.trade_url.visible(),
            missing: Vec::new(),
        }
    }

    /// Load both settings concurrently; either may fail on its own.
    pub async fn refresh(&self) -> Result<LisSkinsSettings, SyncError> {
        let client = &self.client;
        let fetchers: Vec<Fetcher<'_, Section>> = vec![
            (
                PRICE_RANGE,
                async move { client.price_range().await.map(Section::PriceRange) }.boxed(),
            ),
            (
                TRADE_URL,
                async move { client.trade_url().await.map(Section::TradeUrl) }.boxed(),
            ),
        ];

        let batch = load_all(fetchers).await;
        if let Some(err) = batch.failures().find_map(|(_, e)| e.auth_error()) {
            return Err(err);
        }
        let mut batch = batch.into_result(false)?;

        let missing = batch.failures().map(|(name, _)| *name).collect();
        if let Some(Section::PriceRange(range)) = batch.take(PRICE_RANGE) {
            self.price_range.replace_committed(range);
        }
        if let Some(Section::TradeUrl(url)) = batch.take(TRADE_URL) {
            let url = url.trade_url.filter(|u| !u.trim().is_empty());
            self.trade_url.replace_committed(url);
        }

        Ok(LisSkinsSettings {
            missing,
            ..self.settings()
        })
    }

    /// Invalid ranges are refused before anything changes.
    pub async fn set_price_range(&self, min: f64, max: f64) -> Result<(), SyncError> {
        let range = PriceRange::new(min, max).map_err(SyncError::InvalidInput)?;
        let result =
            OptimisticExecutor::mutate(&self.price_range, range, self.client.set_price_range(min, max))
                .await;
        if let Err(e) = &result {
            tracing::warn!(min, max, error = %e, "Price range rejected, reverted");
        }
        result.map(|_| ())
    }

    pub async fn set_trade_url(&self, trade_url: &str) -> Result<(), SyncError> {
        let trade_url = trade_url.trim();
        if trade_url.is_empty() {
            return Err(SyncError::InvalidInput("Trade URL must not be empty".to_string()));
        }
        OptimisticExecutor::mutate(
            &self.trade_url,
            Some(trade_url.to_string()),
            self.client.set_trade_url(trade_url),
        )
        .await
        .map(|_| ())
    }

    pub async fn unlink_trade_url(&self) -> Result<(), SyncError> {
        OptimisticExecutor::mutate(&self.trade_url, None, self.client.unlink_trade_url())
            .await
            .map(|_| ())
    }
}
