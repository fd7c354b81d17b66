// Copyright 2025 Oxide Computer Company

//! Comparers for the document root and its descriptive nodes.

use openapiv3::{
    Components, Contact, ExternalDocumentation, Info, License, OpenAPI, Server, Tag,
};
use serde_json::Value;

use crate::{
    ElementKind,
    compare::non_empty,
    context::ComparisonContext,
    node::{Node, RefOr, typed},
    registry::NodeComparer,
    security::requirement_key,
};

/// The document root.
///
/// An absent document is compared as an empty one: every field of the other
/// side is reported on its own rather than as a whole-document update.
pub(crate) struct DocumentComparer;

impl NodeComparer for DocumentComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let source = source.map(typed::<&OpenAPI>).transpose()?;
        let target = target.map(typed::<&OpenAPI>).transpose()?;
        if source.is_none() && target.is_none() {
            return Ok(());
        }

        // An empty paths object is the same as no paths at all; when only one
        // side has paths the whole container is one update.
        let source_paths = source.map(|doc| &doc.paths).filter(|p| !p.paths.is_empty());
        let target_paths = target.map(|doc| &doc.paths).filter(|p| !p.paths.is_empty());
        cx.walk_field("paths", |cx| match (source_paths, target_paths) {
            (Some(source), Some(target)) => cx.compare_map(
                ElementKind::PathItem,
                source.paths.iter().map(|(path, item)| (path, Node::PathItem(item))),
                target.paths.iter().map(|(path, item)| (path, Node::PathItem(item))),
            ),
            (source, target) => cx.compare_value(ElementKind::Paths, source, target),
        })?;

        cx.node_field(
            "components",
            ElementKind::Components,
            source.and_then(|doc| doc.components.as_ref()).map(Node::Components),
            target.and_then(|doc| doc.components.as_ref()).map(Node::Components),
        )?;

        let servers = |doc: Option<&'a OpenAPI>| doc.map(|doc| doc.servers.as_slice());
        compare_servers(cx, servers(source), servers(target))?;

        cx.node_field(
            "info",
            ElementKind::Info,
            source.map(|doc| Node::Info(&doc.info)),
            target.map(|doc| Node::Info(&doc.info)),
        )?;

        // Document-level security: absent and empty both mean "no
        // requirements".
        let security = |doc: Option<&'a OpenAPI>| {
            doc.and_then(|doc| doc.security.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|requirement| {
                    (
                        requirement_key(requirement),
                        Node::SecurityRequirement(requirement),
                    )
                })
        };
        cx.walk_field("security", |cx| {
            cx.compare_keyed(
                ElementKind::SecurityRequirement,
                security(source),
                security(target),
            )
        })?;

        let tags = |doc: Option<&'a OpenAPI>| {
            doc.map(|doc| doc.tags.as_slice())
                .unwrap_or_default()
                .iter()
                .map(|tag| (tag.name.as_str(), Node::Tag(tag)))
        };
        cx.walk_field("tags", |cx| {
            cx.compare_keyed(ElementKind::Tag, tags(source), tags(target))
        })?;

        cx.node_field(
            "externalDocs",
            ElementKind::ExternalDocs,
            source
                .and_then(|doc| doc.external_docs.as_ref())
                .map(Node::ExternalDocs),
            target
                .and_then(|doc| doc.external_docs.as_ref())
                .map(Node::ExternalDocs),
        )
    }
}

/// Server lists, wherever they appear, are sets keyed by URL.
pub(crate) fn compare_servers<'a>(
    cx: &mut ComparisonContext<'a>,
    source: Option<&'a [Server]>,
    target: Option<&'a [Server]>,
) -> anyhow::Result<()> {
    let entries = |servers: Option<&'a [Server]>| {
        servers
            .unwrap_or_default()
            .iter()
            .map(|server| (server.url.as_str(), Node::Server(server)))
    };
    cx.walk_field("servers", |cx| {
        cx.compare_keyed(ElementKind::Server, entries(source), entries(target))
    })
}

pub(crate) struct InfoComparer;

impl NodeComparer for InfoComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Info, source, target)? else {
            return Ok(());
        };
        let source: &Info = typed(source)?;
        let target: &Info = typed(target)?;

        cx.value_field(
            "title",
            ElementKind::String,
            Some(&source.title),
            Some(&target.title),
        )?;
        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;
        cx.value_field(
            "termsOfService",
            ElementKind::Uri,
            source.terms_of_service.as_ref(),
            target.terms_of_service.as_ref(),
        )?;
        cx.value_field(
            "version",
            ElementKind::String,
            Some(&source.version),
            Some(&target.version),
        )?;
        cx.node_field(
            "contact",
            ElementKind::Contact,
            source.contact.as_ref().map(Node::Contact),
            target.contact.as_ref().map(Node::Contact),
        )?;
        cx.node_field(
            "license",
            ElementKind::License,
            source.license.as_ref().map(Node::License),
            target.license.as_ref().map(Node::License),
        )
    }
}

pub(crate) struct ContactComparer;

impl NodeComparer for ContactComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Contact, source, target)?
        else {
            return Ok(());
        };
        let source: &Contact = typed(source)?;
        let target: &Contact = typed(target)?;

        cx.value_field(
            "name",
            ElementKind::String,
            source.name.as_ref(),
            target.name.as_ref(),
        )?;
        cx.value_field(
            "url",
            ElementKind::Uri,
            source.url.as_ref(),
            target.url.as_ref(),
        )?;
        cx.value_field(
            "email",
            ElementKind::String,
            source.email.as_ref(),
            target.email.as_ref(),
        )
    }
}

pub(crate) struct LicenseComparer;

impl NodeComparer for LicenseComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::License, source, target)?
        else {
            return Ok(());
        };
        let source: &License = typed(source)?;
        let target: &License = typed(target)?;

        cx.value_field(
            "name",
            ElementKind::String,
            Some(&source.name),
            Some(&target.name),
        )?;
        cx.value_field(
            "url",
            ElementKind::Uri,
            source.url.as_ref(),
            target.url.as_ref(),
        )
    }
}

pub(crate) struct ServerComparer;

impl NodeComparer for ServerComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Server, source, target)?
        else {
            return Ok(());
        };
        let source: &Server = typed(source)?;
        let target: &Server = typed(target)?;

        cx.value_field("url", ElementKind::Uri, Some(&source.url), Some(&target.url))?;
        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;

        // Variables are small string records; compare their JSON form.
        let source = serde_json::to_value(source)?;
        let target = serde_json::to_value(target)?;
        cx.walk_field("variables", |cx| {
            cx.compare_json_object(
                ElementKind::ServerVariable,
                source.get("variables"),
                target.get("variables"),
                compare_server_variable,
            )
        })
    }
}

fn compare_server_variable(
    cx: &mut ComparisonContext<'_>,
    source: &Value,
    target: &Value,
) -> anyhow::Result<()> {
    cx.json_field("default", ElementKind::String, source, target)?;
    cx.json_field("description", ElementKind::String, source, target)?;
    cx.json_field("enum", ElementKind::Any, source, target)
}

pub(crate) struct ComponentsComparer;

impl NodeComparer for ComponentsComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Components, source, target)?
        else {
            return Ok(());
        };
        let source: &Components = typed(source)?;
        let target: &Components = typed(target)?;

        cx.walk_field("schemas", |cx| {
            cx.compare_map(
                ElementKind::Schema,
                source
                    .schemas
                    .iter()
                    .map(|(name, schema)| (name, Node::Schema(RefOr::from(schema)))),
                target
                    .schemas
                    .iter()
                    .map(|(name, schema)| (name, Node::Schema(RefOr::from(schema)))),
            )
        })?;
        cx.walk_field("responses", |cx| {
            cx.compare_map(
                ElementKind::Response,
                source.responses.iter().map(|(name, r)| (name, Node::Response(r))),
                target.responses.iter().map(|(name, r)| (name, Node::Response(r))),
            )
        })?;
        cx.walk_field("parameters", |cx| {
            cx.compare_map(
                ElementKind::Parameter,
                source.parameters.iter().map(|(name, p)| (name, Node::Parameter(p))),
                target.parameters.iter().map(|(name, p)| (name, Node::Parameter(p))),
            )
        })?;
        cx.walk_field("examples", |cx| {
            cx.compare_map(
                ElementKind::Example,
                source.examples.iter().map(|(name, e)| (name, Node::Example(e))),
                target.examples.iter().map(|(name, e)| (name, Node::Example(e))),
            )
        })?;
        cx.walk_field("requestBodies", |cx| {
            cx.compare_map(
                ElementKind::RequestBody,
                source
                    .request_bodies
                    .iter()
                    .map(|(name, body)| (name, Node::RequestBody(body))),
                target
                    .request_bodies
                    .iter()
                    .map(|(name, body)| (name, Node::RequestBody(body))),
            )
        })?;
        cx.walk_field("headers", |cx| {
            cx.compare_map(
                ElementKind::Header,
                source.headers.iter().map(|(name, h)| (name, Node::Header(h))),
                target.headers.iter().map(|(name, h)| (name, Node::Header(h))),
            )
        })?;
        cx.walk_field("securitySchemes", |cx| {
            cx.compare_map(
                ElementKind::SecurityScheme,
                source
                    .security_schemes
                    .iter()
                    .map(|(name, scheme)| (name, Node::SecurityScheme(scheme))),
                target
                    .security_schemes
                    .iter()
                    .map(|(name, scheme)| (name, Node::SecurityScheme(scheme))),
            )
        })?;

        cx.value_field(
            "links",
            ElementKind::Any,
            non_empty(&source.links),
            non_empty(&target.links),
        )?;
        cx.value_field(
            "callbacks",
            ElementKind::Any,
            non_empty(&source.callbacks),
            non_empty(&target.callbacks),
        )
    }
}

pub(crate) struct TagComparer;

impl NodeComparer for TagComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::Tag, source, target)? else {
            return Ok(());
        };
        let source: &Tag = typed(source)?;
        let target: &Tag = typed(target)?;

        cx.value_field(
            "name",
            ElementKind::String,
            Some(&source.name),
            Some(&target.name),
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
        )
    }
}

pub(crate) struct ExternalDocsComparer;

impl NodeComparer for ExternalDocsComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) = cx.both_present(ElementKind::ExternalDocs, source, target)?
        else {
            return Ok(());
        };
        let source: &ExternalDocumentation = typed(source)?;
        let target: &ExternalDocumentation = typed(target)?;

        cx.value_field(
            "description",
            ElementKind::String,
            source.description.as_ref(),
            target.description.as_ref(),
        )?;
        cx.value_field("url", ElementKind::Uri, Some(&source.url), Some(&target.url))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{DifferenceOperation, ElementKind, compare};

    fn document() -> serde_json::Value {
        json!({
            "openapi": "3.0.3",
            "info": {
                "title": "pets",
                "version": "1.0.0",
                "contact": { "name": "api team", "email": "api@example.com" }
            },
            "servers": [
                { "url": "https://a.example.com", "description": "primary" },
                {
                    "url": "https://{region}.example.com",
                    "variables": {
                        "region": { "default": "us", "enum": ["us", "eu"] }
                    }
                }
            ],
            "paths": {},
            "tags": [
                { "name": "pets", "description": "pet operations" },
                { "name": "stores" }
            ]
        })
    }

    #[test]
    fn info_fields_are_addressed_by_name() {
        let source = document();
        let mut target = document();
        target["info"]["version"] = json!("2.0.0");
        target["info"]["contact"]["email"] = json!("team@example.com");

        let differences = compare(&source, &target).unwrap();
        let pointers: Vec<_> = differences.iter().map(|d| d.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["#/info/version", "#/info/contact/email"]);
        assert!(
            differences
                .iter()
                .all(|d| d.operation == DifferenceOperation::Update)
        );
    }

    #[test]
    fn servers_are_keyed_by_url() {
        let source = document();
        let mut target = document();
        // Reordering servers is not a change; editing a variable is.
        let servers = target["servers"].as_array_mut().unwrap();
        servers.reverse();
        servers[0]["variables"]["region"]["default"] = json!("eu");

        let differences = compare(&source, &target).unwrap();
        assert_eq!(differences.len(), 1);
        assert_eq!(
            differences[0].pointer,
            "#/servers/1/variables/region/default"
        );
        assert_eq!(differences[0].source_value, Some(json!("us")));
        assert_eq!(differences[0].target_value, Some(json!("eu")));
    }

    #[test]
    fn tags_are_keyed_by_name() {
        let source = document();
        let mut target = document();
        target["tags"][0]["description"] = json!("all about pets");
        target["tags"][1] = json!({ "name": "orders" });

        let differences = compare(&source, &target).unwrap();
        let summary: Vec<_> = differences
            .iter()
            .map(|d| (d.operation, d.pointer.as_str(), d.element_kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    DifferenceOperation::Update,
                    "#/tags/0/description",
                    ElementKind::String
                ),
                (DifferenceOperation::Remove, "#/tags/1", ElementKind::Tag),
                (DifferenceOperation::Add, "#/tags/1", ElementKind::Tag),
            ]
        );
    }

    #[test]
    fn one_sided_node_is_a_single_update() {
        let source = document();
        let mut target = document();
        target["externalDocs"] = json!({ "url": "https://docs.example.com" });
        target["info"]
            .as_object_mut()
            .unwrap()
            .remove("contact");

        let differences = compare(&source, &target).unwrap();
        assert_eq!(differences.len(), 2);

        assert_eq!(differences[0].pointer, "#/info/contact");
        assert_eq!(differences[0].element_kind, ElementKind::Contact);
        assert!(differences[0].source_value.is_some());
        assert_eq!(differences[0].target_value, None);

        assert_eq!(differences[1].pointer, "#/externalDocs");
        assert_eq!(differences[1].operation, DifferenceOperation::Update);
        assert_eq!(differences[1].source_value, None);
    }
}
