use crate::{Error, SqliteBackend};
use polydb_core::{ConnectionHandle, RoutingConfig};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::info;

///
/// SqliteRoutingConfig
///
/// Application → SQLite URL map, usually loaded from JSON:
///
/// `{ "applications": { "tournaments": "sqlite://first.db", "events": "sqlite::memory:" } }`
///
/// Applications naming the same URL share one backend.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteRoutingConfig {
    pub applications: BTreeMap<String, String>,
}

impl SqliteRoutingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_application(mut self, app: impl Into<String>, url: impl Into<String>) -> Self {
        self.applications.insert(app.into(), url.into());
        self
    }

    /// Open one backend per distinct URL and route every application to it.
    pub async fn open(&self) -> Result<RoutingConfig, Error> {
        let mut opened: BTreeMap<&str, ConnectionHandle> = BTreeMap::new();
        let mut config = RoutingConfig::new();

        for (app, url) in &self.applications {
            let connection = if let Some(existing) = opened.get(url.as_str()) {
                Arc::clone(existing)
            } else {
                let backend = SqliteBackend::connect(url)
                    .await
                    .map_err(|error| Error::Open {
                        app: app.clone(),
                        url: url.clone(),
                        error,
                    })?;
                let handle: ConnectionHandle = Arc::new(backend);
                opened.insert(url.as_str(), Arc::clone(&handle));
                handle
            };

            info!(%app, %url, "route application");
            config.route(app.clone(), connection)?;
        }

        Ok(config)
    }
}
