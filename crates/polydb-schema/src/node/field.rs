use crate::types::FieldKind;
use serde::{Deserialize, Serialize};

///
/// FieldDescriptor
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub primary_key: bool,
    pub nullable: bool,

    /// Value is assigned by the backend on insert.
    pub generated: bool,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key: false,
            nullable: false,
            generated: false,
        }
    }

    /// Mark the field as the model's primary key.
    /// Integer keys become backend-generated unless overridden with `generated(false)`.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.generated = self.kind.supports_generation();
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }
}
