use crate::{
    node::{ModelDescriptor, ModelKey},
    registry::RegistryError,
    types::RelationKind,
    validate::naming::validate_ident,
};
use std::collections::BTreeSet;

/// Validate one descriptor on its own: names, primary key shape, and
/// declared relation references. Cross-model checks happen on finalize.
pub(crate) fn validate_model(model: &ModelDescriptor) -> Result<(), RegistryError> {
    model.key.validate()?;
    validate_ident("table", &model.table).map_err(RegistryError::InvalidName)?;

    validate_fields(model)?;
    validate_relations(model)?;

    Ok(())
}

fn invalid(model: &ModelDescriptor, reason: impl Into<String>) -> RegistryError {
    RegistryError::InvalidModel {
        model: model.key.clone(),
        reason: reason.into(),
    }
}

fn validate_fields(model: &ModelDescriptor) -> Result<(), RegistryError> {
    let mut seen = BTreeSet::new();
    for field in &model.fields {
        validate_ident("field", &field.name).map_err(RegistryError::InvalidName)?;
        if !seen.insert(field.name.as_str()) {
            return Err(invalid(model, format!("duplicate field '{}'", field.name)));
        }
        if field.generated && !field.kind.supports_generation() {
            return Err(invalid(
                model,
                format!(
                    "field '{}' of kind {} cannot be backend-generated",
                    field.name, field.kind
                ),
            ));
        }
    }

    let keys: Vec<_> = model.fields.iter().filter(|f| f.primary_key).collect();
    match keys.as_slice() {
        [] => Err(invalid(model, "no primary key field")),
        [pk] if !pk.kind.supports_primary_key() => Err(invalid(
            model,
            format!("primary key '{}' cannot be of kind {}", pk.name, pk.kind),
        )),
        [pk] if pk.nullable => Err(invalid(
            model,
            format!("primary key '{}' cannot be nullable", pk.name),
        )),
        [_] => Ok(()),
        many => {
            let names: Vec<_> = many.iter().map(|f| f.name.as_str()).collect();
            Err(invalid(
                model,
                format!("multiple primary keys: {}", names.join(", ")),
            ))
        }
    }
}

fn validate_relations(model: &ModelDescriptor) -> Result<(), RegistryError> {
    let mut seen = BTreeSet::new();
    let mut columns: BTreeSet<String> = BTreeSet::new();
    for relation in &model.relations {
        validate_ident("relation", &relation.field).map_err(RegistryError::InvalidName)?;
        if model.field(&relation.field).is_some() || !seen.insert(relation.field.as_str()) {
            return Err(invalid(
                model,
                format!("relation '{}' collides with another member", relation.field),
            ));
        }

        // the reference must at least be well-formed; existence is checked on finalize
        ModelKey::parse_reference(&relation.target, model.app())?;

        for (what, name) in [
            ("join table", &relation.through),
            ("related", &relation.related_name),
            ("backward key", &relation.backward_key),
            ("forward key", &relation.forward_key),
        ] {
            if let Some(name) = name {
                validate_ident(what, name).map_err(RegistryError::InvalidName)?;
            }
        }

        if relation.kind == RelationKind::ForeignKey {
            if relation.through.is_some() {
                return Err(invalid(
                    model,
                    format!(
                        "relation '{}' is a foreign key and cannot declare a join table",
                        relation.field
                    ),
                ));
            }

            if let Some(column) = relation.foreign_key_column() {
                if model.field(&column).is_some() {
                    return Err(invalid(
                        model,
                        format!(
                            "foreign key column '{column}' of relation '{}' collides with a field",
                            relation.field
                        ),
                    ));
                }
                if !columns.insert(column.clone()) {
                    return Err(invalid(
                        model,
                        format!(
                            "foreign key column '{column}' of relation '{}' is already used by another relation",
                            relation.field
                        ),
                    ));
                }
            }
        } else if relation.nullable {
            return Err(invalid(
                model,
                format!(
                    "relation '{}' is many-to-many and cannot be nullable",
                    relation.field
                ),
            ));
        }
    }

    Ok(())
}
