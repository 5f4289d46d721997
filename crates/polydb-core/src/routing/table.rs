use crate::{
    connection::ConnectionHandle,
    routing::{RoutingConfig, RoutingError},
};
use derive_more::Display;
use serde::Serialize;
use std::{collections::BTreeMap, fmt, sync::Arc};

// Handle identity: two handles are the same connection when they share an allocation.
pub(crate) fn same_connection(a: &ConnectionHandle, b: &ConnectionHandle) -> bool {
    Arc::ptr_eq(a, b)
}

///
/// ConnectionId
///
/// Dense index of a distinct connection within one routing table.
/// Ids are assigned in order of first appearance over application names
/// sorted ascending, so they are stable across runs for the same config.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[display("connection#{_0}")]
pub struct ConnectionId(usize);

impl ConnectionId {
    #[cfg(test)]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// RoutingEntry
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct RoutingEntry {
    connection: ConnectionId,
}

///
/// RoutingTable
///
/// Authoritative application → connection map. Built once, never mutated,
/// and safe to share across any number of concurrent readers.
///

pub struct RoutingTable {
    entries: BTreeMap<String, RoutingEntry>,
    connections: Vec<ConnectionHandle>,
}

impl RoutingTable {
    #[must_use]
    pub fn new(config: RoutingConfig) -> Self {
        let mut entries = BTreeMap::new();
        let mut connections: Vec<ConnectionHandle> = Vec::new();

        for (app, connection) in config.into_routes() {
            let id = match connections
                .iter()
                .position(|known| same_connection(known, &connection))
            {
                Some(index) => ConnectionId(index),
                None => {
                    connections.push(connection);
                    ConnectionId(connections.len() - 1)
                }
            };
            entries.insert(app, RoutingEntry { connection: id });
        }

        Self {
            entries,
            connections,
        }
    }

    /// Connection routed for `app`.
    pub fn resolve(&self, app: &str) -> Result<&ConnectionHandle, RoutingError> {
        let id = self.connection_id(app)?;

        Ok(&self.connections[id.0])
    }

    /// Id of the connection routed for `app`.
    pub fn connection_id(&self, app: &str) -> Result<ConnectionId, RoutingError> {
        self.entries
            .get(app)
            .map(|entry| entry.connection)
            .ok_or_else(|| RoutingError::UnroutedApplication(app.to_string()))
    }

    #[must_use]
    pub fn connection(&self, id: ConnectionId) -> Option<&ConnectionHandle> {
        self.connections.get(id.0)
    }

    #[must_use]
    pub fn is_routed(&self, app: &str) -> bool {
        self.entries.contains_key(app)
    }

    /// Routed application names, sorted.
    pub fn applications(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Applications sharing connection `id`, sorted.
    pub fn applications_on(&self, id: ConnectionId) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.connection == id)
            .map(|(app, _)| app.as_str())
    }

    /// Distinct connections in id order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &ConnectionHandle)> {
        self.connections
            .iter()
            .enumerate()
            .map(|(index, conn)| (ConnectionId(index), conn))
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<RoutingConfig> for RoutingTable {
    fn from(config: RoutingConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(app, entry)| {
                let dialect = self.connections[entry.connection.0].dialect();
                (app, format!("{} ({dialect})", entry.connection))
            }))
            .finish()
    }
}
