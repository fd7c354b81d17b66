// Copyright 2025 Oxide Computer Company

use openapiv3::{AdditionalProperties, ReferenceOr, Schema, SchemaKind, Type};
use serde_json::Value;

use crate::{
    ElementKind,
    context::ComparisonContext,
    node::{Node, RefOr, typed},
    registry::NodeComparer,
};

/// Scalar keywords, in the order they are compared. They are read from the
/// serialized schema since `openapiv3` spreads them across the per-type
/// structures.
const FACETS: &[(&str, ElementKind)] = &[
    ("title", ElementKind::String),
    ("description", ElementKind::String),
    ("maximum", ElementKind::Number),
    ("multipleOf", ElementKind::Number),
    ("exclusiveMaximum", ElementKind::Boolean),
    ("minimum", ElementKind::Number),
    ("exclusiveMinimum", ElementKind::Boolean),
    ("maxLength", ElementKind::Number),
    ("minLength", ElementKind::Number),
    ("pattern", ElementKind::String),
    ("maxItems", ElementKind::Number),
    ("minItems", ElementKind::Number),
    ("uniqueItems", ElementKind::Boolean),
    ("maxProperties", ElementKind::Number),
    ("minProperties", ElementKind::Number),
    ("required", ElementKind::Any),
    ("enum", ElementKind::Any),
    ("format", ElementKind::String),
    ("nullable", ElementKind::Boolean),
    ("readOnly", ElementKind::Boolean),
    ("writeOnly", ElementKind::Boolean),
    ("deprecated", ElementKind::Boolean),
];

pub(crate) struct SchemaComparer;

impl NodeComparer for SchemaComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Schema, source, target)? else {
            return Ok(());
        };
        let source: RefOr<'a, Schema> = typed(source)?;
        let target: RefOr<'a, Schema> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(source, target)? else {
            return Ok(());
        };

        if !cx.try_enter_schema_pair(source, target)? {
            tracing::trace!(
                pointer = %cx.current_pointer(),
                "schema pair already under comparison"
            );
            return Ok(());
        }
        let result = compare_schema(cx, source, target);
        cx.exit_schema_pair();
        result
    }
}

fn compare_schema<'a>(
    cx: &mut ComparisonContext<'a>,
    source: &'a Schema,
    target: &'a Schema,
) -> anyhow::Result<()> {
    let source_json = serde_json::to_value(source)?;
    let target_json = serde_json::to_value(target)?;

    for (field, kind) in FACETS {
        cx.value_field(
            field,
            *kind,
            facet(&source_json, field),
            facet(&target_json, field),
        )?;
    }

    cx.node_field(
        "default",
        ElementKind::Any,
        source.schema_data.default.as_ref().map(Node::Any),
        target.schema_data.default.as_ref().map(Node::Any),
    )?;

    // Everything past `type` depends on it; a changed type is one update.
    if source_json.get("type") != target_json.get("type") {
        tracing::debug!(
            pointer = %cx.current_pointer(),
            source = ?source_json.get("type"),
            target = ?target_json.get("type"),
            "schema type changed"
        );
        return cx.json_field("type", ElementKind::String, &source_json, &target_json);
    }

    compare_subschemas(cx, source, target)?;

    cx.json_field("discriminator", ElementKind::Any, &source_json, &target_json)?;
    cx.node_field(
        "externalDocs",
        ElementKind::ExternalDocs,
        source.schema_data.external_docs.as_ref().map(Node::ExternalDocs),
        target.schema_data.external_docs.as_ref().map(Node::ExternalDocs),
    )?;
    cx.node_field(
        "example",
        ElementKind::Any,
        source.schema_data.example.as_ref().map(Node::Any),
        target.schema_data.example.as_ref().map(Node::Any),
    )
}

fn compare_subschemas<'a>(
    cx: &mut ComparisonContext<'a>,
    source: &'a Schema,
    target: &'a Schema,
) -> anyhow::Result<()> {
    cx.node_field(
        "items",
        ElementKind::Schema,
        items(source).map(Node::Schema),
        items(target).map(Node::Schema),
    )?;

    cx.walk_field("properties", |cx| {
        cx.compare_map(ElementKind::Schema, properties(source), properties(target))
    })?;

    let source_additional = additional_properties(source);
    let target_additional = additional_properties(target);
    match (source_additional, target_additional) {
        (Some(AdditionalProperties::Any(_)), _) | (_, Some(AdditionalProperties::Any(_))) => {
            cx.value_field(
                "additionalProperties",
                ElementKind::Any,
                source_additional,
                target_additional,
            )?
        }
        _ => cx.node_field(
            "additionalProperties",
            ElementKind::Schema,
            nested_schema(source_additional),
            nested_schema(target_additional),
        )?,
    }

    for (field, select) in [
        ("allOf", all_of as fn(&Schema) -> &[ReferenceOr<Schema>]),
        ("anyOf", any_of),
        ("oneOf", one_of),
    ] {
        let source = select(source).iter().map(|s| Node::Schema(RefOr::from(s)));
        let target = select(target).iter().map(|s| Node::Schema(RefOr::from(s)));
        cx.walk_field(field, |cx| {
            cx.compare_indexed(ElementKind::Schema, source, target)
        })?;
    }

    cx.node_field(
        "not",
        ElementKind::Schema,
        not(source).map(Node::Schema),
        not(target).map(Node::Schema),
    )
}

/// Read a keyword from a serialized schema, treating the values a keyword
/// takes when unset (`null`, `false`, an empty list) as absent.
fn facet<'v>(schema: &'v Value, field: &str) -> Option<&'v Value> {
    schema.get(field).filter(|value| match value {
        Value::Null | Value::Bool(false) => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
        _ => true,
    })
}

// Schemas without a `type` keep their keywords in `AnySchema`, so each
// accessor reads both that and the typed variant.

fn items(schema: &Schema) -> Option<RefOr<'_, Schema>> {
    let items = match &schema.schema_kind {
        SchemaKind::Type(Type::Array(array)) => array.items.as_ref(),
        SchemaKind::Any(any) => any.items.as_ref(),
        _ => None,
    };
    items.map(RefOr::from)
}

fn properties(schema: &Schema) -> Vec<(&String, Node<'_>)> {
    let properties = match &schema.schema_kind {
        SchemaKind::Type(Type::Object(object)) => &object.properties,
        SchemaKind::Any(any) => &any.properties,
        _ => return Vec::new(),
    };
    properties
        .iter()
        .map(|(name, property)| (name, Node::Schema(RefOr::from(property))))
        .collect()
}

fn additional_properties(schema: &Schema) -> Option<&AdditionalProperties> {
    match &schema.schema_kind {
        SchemaKind::Type(Type::Object(object)) => object.additional_properties.as_ref(),
        SchemaKind::Any(any) => any.additional_properties.as_ref(),
        _ => None,
    }
}

fn nested_schema(additional: Option<&AdditionalProperties>) -> Option<Node<'_>> {
    match additional {
        Some(AdditionalProperties::Schema(schema)) => Some(Node::Schema(RefOr::from(schema))),
        _ => None,
    }
}

fn all_of(schema: &Schema) -> &[ReferenceOr<Schema>] {
    match &schema.schema_kind {
        SchemaKind::AllOf { all_of } => all_of,
        SchemaKind::Any(any) => &any.all_of,
        _ => &[],
    }
}

fn any_of(schema: &Schema) -> &[ReferenceOr<Schema>] {
    match &schema.schema_kind {
        SchemaKind::AnyOf { any_of } => any_of,
        SchemaKind::Any(any) => &any.any_of,
        _ => &[],
    }
}

fn one_of(schema: &Schema) -> &[ReferenceOr<Schema>] {
    match &schema.schema_kind {
        SchemaKind::OneOf { one_of } => one_of,
        SchemaKind::Any(any) => &any.one_of,
        _ => &[],
    }
}

fn not(schema: &Schema) -> Option<RefOr<'_, Schema>> {
    match &schema.schema_kind {
        SchemaKind::Not { not } => Some(RefOr::from(not)),
        SchemaKind::Any(any) => any.not.as_ref().map(RefOr::from),
        _ => None,
    }
}
