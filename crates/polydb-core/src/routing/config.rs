use crate::{
    connection::ConnectionHandle,
    routing::{RoutingError, table::same_connection},
};
use polydb_schema::validate::naming::validate_ident;
use std::{collections::BTreeMap, fmt};

///
/// RoutingConfig
///
/// Application → connection pairs supplied once at startup. There is no
/// default route: every application a model uses must appear here.
///

#[derive(Clone, Default)]
pub struct RoutingConfig {
    routes: BTreeMap<String, ConnectionHandle>,
}

impl RoutingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `app` to `connection`.
    ///
    /// Routing an application again to the same connection is a no-op;
    /// routing it to a different one is rejected.
    pub fn route(
        &mut self,
        app: impl Into<String>,
        connection: ConnectionHandle,
    ) -> Result<(), RoutingError> {
        let app = app.into();
        validate_ident("application", &app).map_err(RoutingError::InvalidApplication)?;

        if let Some(existing) = self.routes.get(&app) {
            if same_connection(existing, &connection) {
                return Ok(());
            }
            return Err(RoutingError::DuplicateRoute(app));
        }

        self.routes.insert(app, connection);

        Ok(())
    }

    /// Chaining form of [`route`](Self::route).
    pub fn with_route(
        mut self,
        app: impl Into<String>,
        connection: ConnectionHandle,
    ) -> Result<Self, RoutingError> {
        self.route(app, connection)?;

        Ok(self)
    }

    /// Build a config from `(app, connection)` pairs.
    pub fn from_routes<A>(
        routes: impl IntoIterator<Item = (A, ConnectionHandle)>,
    ) -> Result<Self, RoutingError>
    where
        A: Into<String>,
    {
        let mut config = Self::new();
        for (app, connection) in routes {
            config.route(app, connection)?;
        }

        Ok(config)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, app: &str) -> bool {
        self.routes.contains_key(app)
    }

    /// Routes sorted by application name.
    pub(crate) fn into_routes(self) -> impl Iterator<Item = (String, ConnectionHandle)> {
        self.routes.into_iter()
    }
}

impl fmt::Debug for RoutingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.routes.iter())
            .finish()
    }
}
