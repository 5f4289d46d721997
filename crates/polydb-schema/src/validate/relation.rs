use crate::{
    node::{ModelDescriptor, ModelKey, RelationDescriptor, ResolvedRelation},
    registry::RegistryError,
    types::RelationKind,
};
use std::collections::BTreeMap;

/// Resolve every declared relation against the registered model set.
///
/// Output is sorted by source key then relation field so downstream
/// consumers see a stable order regardless of declaration order.
pub(crate) fn resolve_relations(
    models: &BTreeMap<ModelKey, ModelDescriptor>,
) -> Result<Vec<ResolvedRelation>, RegistryError> {
    // Phase 1: resolve targets and default storage names.
    let mut resolved = Vec::new();
    for model in models.values() {
        for relation in &model.relations {
            resolved.push(resolve_one(models, model, relation)?);
        }
    }
    resolved.sort_by(|a, b| (&a.source, &a.field).cmp(&(&b.source, &b.field)));

    // Phase 2: reverse accessors must be unambiguous on each target.
    validate_related_names(models, &resolved)?;

    Ok(resolved)
}

fn resolve_one(
    models: &BTreeMap<ModelKey, ModelDescriptor>,
    source: &ModelDescriptor,
    relation: &RelationDescriptor,
) -> Result<ResolvedRelation, RegistryError> {
    let target_key = ModelKey::parse_reference(&relation.target, source.app())?;
    let Some(target) = models.get(&target_key) else {
        return Err(RegistryError::UnknownModel {
            model: source.key.clone(),
            field: relation.field.clone(),
            target: target_key,
        });
    };

    let backward_key = relation
        .backward_key
        .clone()
        .unwrap_or_else(|| format!("{}_id", source.table));

    let (through, forward_key) = match relation.kind {
        RelationKind::ManyToMany => (
            Some(
                relation
                    .through
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", source.table, target.table)),
            ),
            relation
                .forward_key
                .clone()
                .unwrap_or_else(|| format!("{}_id", target.table)),
        ),
        RelationKind::ForeignKey => (None, relation.foreign_key_column().unwrap_or_default()),
    };

    // a required self-reference leaves no valid first row
    if relation.kind == RelationKind::ForeignKey && target_key == source.key && !relation.nullable {
        return Err(RegistryError::InvalidRelation {
            model: source.key.clone(),
            field: relation.field.clone(),
            reason: "a foreign key to its own model must be nullable".to_string(),
        });
    }

    if relation.kind == RelationKind::ManyToMany && backward_key == forward_key {
        return Err(RegistryError::InvalidRelation {
            model: source.key.clone(),
            field: relation.field.clone(),
            reason: format!(
                "join columns collide on '{backward_key}'; set backward_key or forward_key"
            ),
        });
    }

    Ok(ResolvedRelation {
        source: source.key.clone(),
        field: relation.field.clone(),
        kind: relation.kind,
        target: target_key,
        source_table: source.table.clone(),
        target_table: target.table.clone(),
        through,
        related_name: relation
            .related_name
            .clone()
            .unwrap_or_else(|| format!("{}s", source.table)),
        backward_key,
        forward_key,
        nullable: relation.nullable,
    })
}

fn validate_related_names(
    models: &BTreeMap<ModelKey, ModelDescriptor>,
    relations: &[ResolvedRelation],
) -> Result<(), RegistryError> {
    let mut claimed: BTreeMap<(&ModelKey, &str), String> = BTreeMap::new();

    for relation in relations {
        let related_name = relation.related_name.as_str();

        if let Some(target) = models.get(&relation.target)
            && (target.field(related_name).is_some() || target.relation(related_name).is_some())
        {
            return Err(RegistryError::RelatedNameConflict {
                target: relation.target.clone(),
                related_name: related_name.to_string(),
                first: format!("member '{}.{related_name}'", relation.target),
                second: relation.label(),
            });
        }

        if let Some(first) = claimed.insert((&relation.target, related_name), relation.label()) {
            return Err(RegistryError::RelatedNameConflict {
                target: relation.target.clone(),
                related_name: related_name.to_string(),
                first,
                second: relation.label(),
            });
        }
    }

    Ok(())
}
