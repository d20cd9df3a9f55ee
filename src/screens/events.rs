//! Streamer event settings.
//!
//! Each event's enabled flag and its prize settings are separate
//! [`ManagedResource`]s keyed by event key. Edits show immediately and roll
//! back if the service refuses them.

use futures::FutureExt;

use crate::api::ServiceClient;
use crate::domain::{BulkEventSettings, EventConfig, EventRow, EventUpdate};
use crate::error::SyncError;
use crate::sync::{load_all, Fetcher, ManagedResource, OptimisticExecutor, ResourceSet};

/// Outcome of applying settings to every event.
#[derive(Debug, Default)]
pub struct BulkApplyReport {
    pub applied: Vec<String>,
    pub failed: Vec<(String, SyncError)>,
}

impl BulkApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct EventsModel {
    client: ServiceClient,
    flags: ResourceSet<String, bool>,
    configs: ResourceSet<String, EventConfig>,
}

impl EventsModel {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            flags: ResourceSet::new(),
            configs: ResourceSet::new(),
        }
    }

    /// Adopt a server listing without a network call.
    pub fn apply(&self, rows: &[EventRow]) {
        self.flags
            .reconcile(rows.iter().map(|row| (row.event_key.clone(), row.enabled)));
        self.configs
            .reconcile(rows.iter().map(|row| (row.event_key.clone(), row.config())));
    }

    /// Re-fetch the streamer's events and reconcile local state.
    ///
    /// Events with an edit in flight keep their optimistic value.
    pub async fn refresh(&self) -> Result<Vec<(String, bool)>, SyncError> {
        let me = self.client.streamer_me().await?;
        self.apply(&me.events);
        tracing::debug!(events = self.flags.len(), "Events reconciled");
        Ok(self.flags())
    }

    /// Visible flags in event-key order.
    pub fn flags(&self) -> Vec<(String, bool)> {
        self.flags.snapshot()
    }

    /// Visible prize settings in event-key order.
    pub fn configs(&self) -> Vec<(String, EventConfig)> {
        self.configs.snapshot()
    }

    pub fn is_enabled(&self, event_key: &str) -> Option<bool> {
        self.flags
            .get(&event_key.to_string())
            .map(|resource| resource.visible())
    }

    pub fn config(&self, event_key: &str) -> Option<EventConfig> {
        self.configs
            .get(&event_key.to_string())
            .map(|resource| resource.visible())
    }

    pub fn resource(&self, event_key: &str) -> Option<ManagedResource<bool>> {
        self.flags.get(&event_key.to_string())
    }

    pub fn config_resource(&self, event_key: &str) -> Option<ManagedResource<EventConfig>> {
        self.configs.get(&event_key.to_string())
    }

    /// Enable or disable an event.
    ///
    /// On failure the flag reverts to its value before this call and the
    /// error is returned for the caller to show.
    pub async fn toggle(&self, event_key: &str, enabled: bool) -> Result<(), SyncError> {
        let resource = self
            .resource(event_key)
            .ok_or_else(|| unknown_event(event_key))?;

        let update = EventUpdate::toggle(event_key, enabled);
        let result =
            OptimisticExecutor::mutate(&resource, enabled, self.client.set_event(&update)).await;

        match &result {
            Ok(_) => tracing::info!(event_key, enabled, "Event toggled"),
            Err(e) => tracing::warn!(
                event_key,
                enabled,
                visible = resource.visible(),
                error = %e,
                "Event toggle rejected, reverted"
            ),
        }
        result.map(|_| ())
    }

    /// Save one event's prize settings.
    pub async fn save_config(&self, event_key: &str, config: EventConfig) -> Result<(), SyncError> {
        config.validate().map_err(SyncError::InvalidInput)?;
        let resource = self
            .config_resource(event_key)
            .ok_or_else(|| unknown_event(event_key))?;

        let update = EventUpdate::config(event_key, &config);
        let result =
            OptimisticExecutor::mutate(&resource, config, self.client.set_event(&update)).await;

        match &result {
            Ok(_) => tracing::info!(event_key, "Event settings saved"),
            Err(e) => tracing::warn!(event_key, error = %e, "Event settings rejected, reverted"),
        }
        result.map(|_| ())
    }

    /// Apply `settings` to every known event concurrently.
    ///
    /// Each event is its own optimistic edit: a refused event rolls back
    /// alone and is listed in the report while the others keep the new
    /// values. An authentication failure is returned as an error.
    pub async fn apply_all(&self, settings: BulkEventSettings) -> Result<BulkApplyReport, SyncError> {
        settings.validate().map_err(SyncError::InvalidInput)?;

        let client = &self.client;
        let fetchers: Vec<Fetcher<'_, (), SyncError, String>> = self
            .configs
            .entries()
            .into_iter()
            .map(|(event_key, resource)| {
                let merged = settings.merge_into(resource.visible());
                let update = EventUpdate::bulk(event_key.clone(), &settings);
                let save = async move {
                    OptimisticExecutor::mutate(&resource, merged, client.set_event(&update))
                        .await
                        .map(|_| ())
                }
                .boxed();
                (event_key, save)
            })
            .collect();

        let batch = load_all(fetchers).await;
        if let Some(err) = batch.failures().find_map(|(_, e)| e.auth_error()) {
            return Err(err);
        }

        let mut report = BulkApplyReport::default();
        for outcome in batch.into_outcomes() {
            match outcome.result {
                Ok(()) => report.applied.push(outcome.resource),
                Err(e) => report.failed.push((outcome.resource, e)),
            }
        }
        tracing::info!(
            applied = report.applied.len(),
            failed = report.failed.len(),
            "Bulk event settings applied"
        );
        Ok(report)
    }
}

fn unknown_event(event_key: &str) -> SyncError {
    SyncError::InvalidInput(format!("Unknown event '{}'", event_key))
}
