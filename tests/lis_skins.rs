//! Marketplace settings as optimistic resources.

mod common;

use common::mock_backend::{MockBackend, MockResponse};
use giveaway_sync::domain::PriceRange;
use giveaway_sync::screens::lis_skins::TRADE_URL;
use giveaway_sync::screens::LisSkinsModel;
use giveaway_sync::SyncError;

const SETTINGS: &str = "/streamer/lis-skins-settings";
const TRADE: &str = "/streamer/lis-skins-trade-url";

#[tokio::test]
async fn refresh_loads_both_settings() {
    let mock = MockBackend::start().await;
    mock.set_default(SETTINGS, MockResponse::json(r#"{"price_min": 1.0, "price_max": 4.0}"#))
        .await;
    mock.set_default(TRADE, MockResponse::json(r#"{"trade_url": "https://steam/t"}"#))
        .await;
    let (client, _store) = common::client_for(&mock, Some("abc"), None);

    let settings = LisSkinsModel::new(client).refresh().await.unwrap();

    assert_eq!(settings.price_range, PriceRange::new(1.0, 4.0).unwrap());
    assert_eq!(settings.trade_url.as_deref(), Some("https://steam/t"));
    assert!(settings.missing.is_empty());
}

#[tokio::test]
async fn missing_trade_url_does_not_block_price_range() {
    let mock = MockBackend::start().await;
    mock.set_default(SETTINGS, MockResponse::json(r#"{"price_min": 1.0, "price_max": 4.0}"#))
        .await;
    let (client, _store) = common::client_for(&mock, Some("abc"), None);

    let settings = LisSkinsModel::new(client).refresh().await.unwrap();

    assert_eq!(settings.missing, vec![TRADE_URL]);
    assert_eq!(settings.price_range.price_max, Some(4.0));
}

#[tokio::test]
async fn refused_price_range_rolls_back() {
    let mock = MockBackend::start().await;
    mock.set_default(SETTINGS, MockResponse::json(r#"{"price_min": 1.0, "price_max": 4.0}"#))
        .await;
    mock.set_default(TRADE, MockResponse::json("{}")).await;
    let (client, _store) = common::client_for(&mock, Some("abc"), None);
    let model = LisSkinsModel::new(client);
    model.refresh().await.unwrap();

    mock.enqueue(SETTINGS, MockResponse::error(422, "range too wide"))
        .await;
    let err = model.set_price_range(2.0, 500.0).await.unwrap_err();

    assert!(matches!(err, SyncError::Remote { status: 422, .. }));
    assert_eq!(model.price_range().visible(), PriceRange::new(1.0, 4.0).unwrap());
    let posts: Vec<_> = mock
        .requests_to(SETTINGS)
        .await
        .into_iter()
        .filter(|r| r.method == "POST")
        .collect();
    assert_eq!(posts[0].json(), serde_json::json!({"price_min": 2.0, "price_max": 500.0}));
}

#[tokio::test]
async fn accepted_price_range_is_committed() {
    let mock = MockBackend::start().await;
    mock.set_default(SETTINGS, MockResponse::json(r#"{"ok": true}"#)).await;
    let (client, _store) = common::client_for(&mock, Some("abc"), None);
    let model = LisSkinsModel::new(client);

    model.set_price_range(0.5, 3.0).await.unwrap();

    assert_eq!(model.price_range().committed(), PriceRange::new(0.5, 3.0).unwrap());
    assert!(!model.price_range().is_pending());
}

#[tokio::test]
async fn unlink_restores_url_when_refused() {
    let mock = MockBackend::start().await;
    mock.set_default(SETTINGS, MockResponse::json("{}")).await;
    mock.set_default(TRADE, MockResponse::json(r#"{"trade_url": "https://steam/t"}"#))
        .await;
    mock.enqueue(
        "/streamer/lis-skins-trade-url/unlink",
        MockResponse::error(500, "boom"),
    )
    .await;
    let (client, _store) = common::client_for(&mock, Some("abc"), None);
    let model = LisSkinsModel::new(client);
    model.refresh().await.unwrap();

    assert!(model.unlink_trade_url().await.is_err());
    assert_eq!(model.trade_url().visible().as_deref(), Some("https://steam/t"));
}
