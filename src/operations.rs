// Copyright 2025 Oxide Computer Company

//! Comparers for path items, operations, and the request and response
//! structures beneath them.

use indexmap::IndexMap;
use openapiv3::{
    Encoding, Example, Header, MediaType, Operation, Parameter, ParameterSchemaOrContent,
    PathItem, ReferenceOr, RequestBody, Response, Responses,
};
use serde_json::Value;

use crate::{
    ElementKind,
    compare::non_empty,
    context::ComparisonContext,
    document::compare_servers,
    node::{Node, RefOr, typed},
    registry::NodeComparer,
    security::requirement_key,
};

pub(crate) struct PathItemComparer;

impl NodeComparer for PathItemComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::PathItem, source, target)?
        else {
            return Ok(());
        };
        let source: &ReferenceOr<PathItem> = typed(source)?;
        let target: &ReferenceOr<PathItem> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(RefOr::from(source), RefOr::from(target))?
        else {
            return Ok(());
        };

        cx.value_field(
            "summary",
            ElementKind::String,
            source.summary.as_ref(),
            target.summary.as_ref(),
        )?;
        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;

        // Operations sit directly under the path, keyed by method.
        cx.compare_map(
            ElementKind::Operation,
            source.iter().map(|(method, op)| (method, Node::Operation(op))),
            target.iter().map(|(method, op)| (method, Node::Operation(op))),
        )?;

        compare_servers(
            cx,
            Some(source.servers.as_slice()),
            Some(target.servers.as_slice()),
        )?;
        compare_parameters(cx, &source.parameters, &target.parameters)
    }
}

/// Parameter lists are compared by position.
fn compare_parameters<'a>(
    cx: &mut ComparisonContext<'a>,
    source: &'a [ReferenceOr<Parameter>],
    target: &'a [ReferenceOr<Parameter>],
) -> anyhow::Result<()> {
    cx.walk_field("parameters", |cx| {
        cx.compare_indexed(
            ElementKind::Parameter,
            source.iter().map(Node::Parameter),
            target.iter().map(Node::Parameter),
        )
    })
}

pub(crate) struct OperationComparer;

impl NodeComparer for OperationComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Operation, source, target)?
        else {
            return Ok(());
        };
        let source: &Operation = typed(source)?;
        let target: &Operation = typed(target)?;

        cx.walk_field("tags", |cx| {
            cx.compare_string_set(ElementKind::String, &source.tags, &target.tags)
        })?;
        cx.value_field(
            "summary",
            ElementKind::String,
            source.summary.as_ref(),
            target.summary.as_ref(),
        )?;
        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;
        cx.node_field(
            "externalDocs",
            ElementKind::ExternalDocs,
            source.external_docs.as_ref().map(Node::ExternalDocs),
            target.external_docs.as_ref().map(Node::ExternalDocs),
        )?;
        cx.value_field(
            "operationId",
            ElementKind::String,
            source.operation_id.as_ref(),
            target.operation_id.as_ref(),
        )?;
        compare_parameters(cx, &source.parameters, &target.parameters)?;
        cx.node_field(
            "requestBody",
            ElementKind::RequestBody,
            source.request_body.as_ref().map(Node::RequestBody),
            target.request_body.as_ref().map(Node::RequestBody),
        )?;
        cx.node_field(
            "responses",
            ElementKind::Responses,
            Some(Node::Responses(&source.responses)),
            Some(Node::Responses(&target.responses)),
        )?;
        cx.value_field(
            "callbacks",
            ElementKind::Any,
            non_empty(&source.callbacks),
            non_empty(&target.callbacks),
        )?;
        cx.value_field(
            "deprecated",
            ElementKind::Boolean,
            Some(&source.deprecated),
            Some(&target.deprecated),
        )?;

        // Unlike the document level, an operation without `security`
        // inherits the document's requirements while an empty list opts out,
        // so the two are different.
        cx.walk_field("security", |cx| {
            match (source.security.as_deref(), target.security.as_deref()) {
                (Some(source), Some(target)) => cx.compare_keyed(
                    ElementKind::SecurityRequirement,
                    source
                        .iter()
                        .map(|r| (requirement_key(r), Node::SecurityRequirement(r))),
                    target
                        .iter()
                        .map(|r| (requirement_key(r), Node::SecurityRequirement(r))),
                ),
                (source, target) => {
                    cx.compare_value(ElementKind::SecurityRequirement, source, target)
                }
            }
        })?;

        compare_servers(
            cx,
            Some(source.servers.as_slice()),
            Some(target.servers.as_slice()),
        )
    }
}

pub(crate) struct ParameterComparer;

impl NodeComparer for ParameterComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Parameter, source, target)?
        else {
            return Ok(());
        };
        let source: &ReferenceOr<Parameter> = typed(source)?;
        let target: &ReferenceOr<Parameter> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(RefOr::from(source), RefOr::from(target))?
        else {
            return Ok(());
        };

        let source_data = source.parameter_data_ref();
        let target_data = target.parameter_data_ref();
        // Location and serialization options live on the enum variants.
        let source_json = serde_json::to_value(source)?;
        let target_json = serde_json::to_value(target)?;

        cx.value_field(
            "name",
            ElementKind::String,
            Some(&source_data.name),
            Some(&target_data.name),
        )?;
        cx.json_field("in", ElementKind::String, &source_json, &target_json)?;
        cx.value_field(
            "description",
            ElementKind::String,
            source_data.description.as_ref(),
            target_data.description.as_ref(),
        )?;
        cx.value_field(
            "required",
            ElementKind::Boolean,
            Some(&source_data.required),
            Some(&target_data.required),
        )?;
        compare_style_flags(
            cx,
            &source_json,
            &target_json,
            &["deprecated", "allowEmptyValue", "style", "explode", "allowReserved"],
        )?;
        compare_schema_or_content(cx, &source_data.format, &target_data.format)?;
        cx.node_field(
            "example",
            ElementKind::Any,
            source_data.example.as_ref().map(Node::Any),
            target_data.example.as_ref().map(Node::Any),
        )?;
        compare_examples(cx, &source_data.examples, &target_data.examples)
    }
}

/// Parameters and headers carry either a `schema` or a `content` map.
fn compare_schema_or_content<'a>(
    cx: &mut ComparisonContext<'a>,
    source: &'a ParameterSchemaOrContent,
    target: &'a ParameterSchemaOrContent,
) -> anyhow::Result<()> {
    let schema = |format: &'a ParameterSchemaOrContent| match format {
        ParameterSchemaOrContent::Schema(schema) => Some(Node::Schema(RefOr::from(schema))),
        ParameterSchemaOrContent::Content(_) => None,
    };
    let content = |format: &'a ParameterSchemaOrContent| match format {
        ParameterSchemaOrContent::Schema(_) => None,
        ParameterSchemaOrContent::Content(content) => Some(content),
    };

    cx.node_field("schema", ElementKind::Schema, schema(source), schema(target))?;
    compare_content(cx, content(source), content(target))
}

fn compare_content<'a>(
    cx: &mut ComparisonContext<'a>,
    source: Option<&'a IndexMap<String, MediaType>>,
    target: Option<&'a IndexMap<String, MediaType>>,
) -> anyhow::Result<()> {
    let entries = |content: Option<&'a IndexMap<String, MediaType>>| {
        content
            .into_iter()
            .flatten()
            .map(|(media_type, media)| (media_type, Node::MediaType(media)))
    };
    cx.walk_field("content", |cx| {
        cx.compare_map(ElementKind::MediaType, entries(source), entries(target))
    })
}

fn compare_examples<'a>(
    cx: &mut ComparisonContext<'a>,
    source: &'a IndexMap<String, ReferenceOr<Example>>,
    target: &'a IndexMap<String, ReferenceOr<Example>>,
) -> anyhow::Result<()> {
    cx.walk_field("examples", |cx| {
        cx.compare_map(
            ElementKind::Example,
            source.iter().map(|(name, e)| (name, Node::Example(e))),
            target.iter().map(|(name, e)| (name, Node::Example(e))),
        )
    })
}

fn compare_headers<'a>(
    cx: &mut ComparisonContext<'a>,
    source: &'a IndexMap<String, ReferenceOr<Header>>,
    target: &'a IndexMap<String, ReferenceOr<Header>>,
) -> anyhow::Result<()> {
    cx.walk_field("headers", |cx| {
        cx.compare_map(
            ElementKind::Header,
            source.iter().map(|(name, h)| (name, Node::Header(h))),
            target.iter().map(|(name, h)| (name, Node::Header(h))),
        )
    })
}

pub(crate) struct RequestBodyComparer;

impl NodeComparer for RequestBodyComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::RequestBody, source, target)?
        else {
            return Ok(());
        };
        let source: &ReferenceOr<RequestBody> = typed(source)?;
        let target: &ReferenceOr<RequestBody> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(RefOr::from(source), RefOr::from(target))?
        else {
            return Ok(());
        };

        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;
        cx.value_field(
            "required",
            ElementKind::Boolean,
            Some(&source.required),
            Some(&target.required),
        )?;
        compare_content(cx, Some(&source.content), Some(&target.content))
    }
}

pub(crate) struct ResponsesComparer;

impl NodeComparer for ResponsesComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Responses, source, target)?
        else {
            return Ok(());
        };
        let source: &Responses = typed(source)?;
        let target: &Responses = typed(target)?;

        cx.node_field(
            "default",
            ElementKind::Response,
            source.default.as_ref().map(Node::Response),
            target.default.as_ref().map(Node::Response),
        )?;
        // Status codes sit directly under `responses`.
        cx.compare_map(
            ElementKind::Response,
            source
                .responses
                .iter()
                .map(|(status, response)| (status, Node::Response(response))),
            target
                .responses
                .iter()
                .map(|(status, response)| (status, Node::Response(response))),
        )
    }
}

pub(crate) struct ResponseComparer;

impl NodeComparer for ResponseComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Response, source, target)?
        else {
            return Ok(());
        };
        let source: &ReferenceOr<Response> = typed(source)?;
        let target: &ReferenceOr<Response> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(RefOr::from(source), RefOr::from(target))?
        else {
            return Ok(());
        };

        cx.value_field(
            "description",
            ElementKind::String,
            Some(&source.description),
            Some(&target.description),
        )?;
        compare_headers(cx, &source.headers, &target.headers)?;
        compare_content(cx, Some(&source.content), Some(&target.content))?;
        cx.value_field(
            "links",
            ElementKind::Any,
            non_empty(&source.links),
            non_empty(&target.links),
        )
    }
}

pub(crate) struct MediaTypeComparer;

impl NodeComparer for MediaTypeComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::MediaType, source, target)?
        else {
            return Ok(());
        };
        let source: &MediaType = typed(source)?;
        let target: &MediaType = typed(target)?;

        cx.node_field(
            "schema",
            ElementKind::Schema,
            source.schema.as_ref().map(|s| Node::Schema(RefOr::from(s))),
            target.schema.as_ref().map(|s| Node::Schema(RefOr::from(s))),
        )?;
        cx.node_field(
            "example",
            ElementKind::Any,
            source.example.as_ref().map(Node::Any),
            target.example.as_ref().map(Node::Any),
        )?;
        compare_examples(cx, &source.examples, &target.examples)?;
        cx.walk_field("encoding", |cx| {
            cx.compare_map(
                ElementKind::Encoding,
                source.encoding.iter().map(|(name, e)| (name, Node::Encoding(e))),
                target.encoding.iter().map(|(name, e)| (name, Node::Encoding(e))),
            )
        })
    }
}

pub(crate) struct EncodingComparer;

impl NodeComparer for EncodingComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Encoding, source, target)?
        else {
            return Ok(());
        };
        let source: &Encoding = typed(source)?;
        let target: &Encoding = typed(target)?;
        let source_json = serde_json::to_value(source)?;
        let target_json = serde_json::to_value(target)?;

        cx.json_field("contentType", ElementKind::String, &source_json, &target_json)?;
        compare_headers(cx, &source.headers, &target.headers)?;
        compare_style_flags(
            cx,
            &source_json,
            &target_json,
            &["style", "explode", "allowReserved"],
        )
    }
}

pub(crate) struct HeaderComparer;

impl NodeComparer for HeaderComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Header, source, target)? else {
            return Ok(());
        };
        let source: &ReferenceOr<Header> = typed(source)?;
        let target: &ReferenceOr<Header> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(RefOr::from(source), RefOr::from(target))?
        else {
            return Ok(());
        };
        let source_json = serde_json::to_value(source)?;
        let target_json = serde_json::to_value(target)?;

        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;
        cx.value_field(
            "required",
            ElementKind::Boolean,
            Some(&source.required),
            Some(&target.required),
        )?;
        compare_style_flags(cx, &source_json, &target_json, &["deprecated", "style", "explode"])?;
        compare_schema_or_content(cx, &source.format, &target.format)?;
        cx.node_field(
            "example",
            ElementKind::Any,
            source.example.as_ref().map(Node::Any),
            target.example.as_ref().map(Node::Any),
        )?;
        compare_examples(cx, &source.examples, &target.examples)
    }
}

/// Serialization flags that `openapiv3` keeps in per-location enums or
/// omits when defaulted. `style` is a string; the rest are booleans.
fn compare_style_flags(
    cx: &mut ComparisonContext<'_>,
    source: &Value,
    target: &Value,
    fields: &[&str],
) -> anyhow::Result<()> {
    for field in fields {
        let kind = match *field {
            "style" => ElementKind::String,
            _ => ElementKind::Boolean,
        };
        cx.json_field(field, kind, source, target)?;
    }
    Ok(())
}

pub(crate) struct ExampleComparer;

impl NodeComparer for ExampleComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Example, source, target)? else {
            return Ok(());
        };
        let source: &ReferenceOr<Example> = typed(source)?;
        let target: &ReferenceOr<Example> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(RefOr::from(source), RefOr::from(target))?
        else {
            return Ok(());
        };

        cx.value_field(
            "summary",
            ElementKind::String,
            source.summary.as_ref(),
            target.summary.as_ref(),
        )?;
        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;
        cx.node_field(
            "value",
            ElementKind::Any,
            source.value.as_ref().map(Node::Any),
            target.value.as_ref().map(Node::Any),
        )?;
        cx.value_field(
            "externalValue",
            ElementKind::Uri,
            source.external_value.as_ref(),
            target.external_value.as_ref(),
        )
    }
}
