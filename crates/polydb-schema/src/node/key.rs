use crate::{MODEL_KEY_SEPARATOR, registry::RegistryError, validate::naming};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

///
/// ModelKey
///
/// Stable identity of a model: owning application plus model name,
/// rendered as `app.Model`. Ordering is by application first, so sorted
/// collections of keys are grouped by application.
///

#[derive(
    Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("{app}.{name}")]
pub struct ModelKey {
    pub app: String,
    pub name: String,
}

impl ModelKey {
    #[must_use]
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            name: name.into(),
        }
    }

    /// Parse a relation target reference.
    ///
    /// `app.Model` is taken as written; a bare `Model` resolves inside
    /// `default_app`, the application of the declaring model.
    pub fn parse_reference(reference: &str, default_app: &str) -> Result<Self, RegistryError> {
        let key = match reference.split_once(MODEL_KEY_SEPARATOR) {
            Some((app, name)) => Self::new(app, name),
            None => Self::new(default_app, reference),
        };
        key.validate()?;

        Ok(key)
    }

    /// Check both halves of the key against the identifier rules.
    pub fn validate(&self) -> Result<(), RegistryError> {
        naming::validate_ident("application", &self.app).map_err(RegistryError::InvalidName)?;
        naming::validate_ident("model", &self.name).map_err(RegistryError::InvalidName)?;

        Ok(())
    }

    #[must_use]
    pub fn belongs_to(&self, app: &str) -> bool {
        self.app == app
    }
}

impl FromStr for ModelKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((app, name)) = s.split_once(MODEL_KEY_SEPARATOR) else {
            return Err(RegistryError::InvalidName(format!(
                "model reference '{s}' must be qualified as 'app.Model'"
            )));
        };
        let key = Self::new(app, name);
        key.validate()?;

        Ok(key)
    }
}
