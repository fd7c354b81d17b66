// Copyright 2025 Oxide Computer Company

//! Security requirements and the schemes they name.

use openapiv3::{ReferenceOr, SecurityRequirement, SecurityScheme};
use serde_json::Value;

use crate::{
    ElementKind,
    context::ComparisonContext,
    node::{Node, RefOr, typed},
    registry::NodeComparer,
    resolve::Resolvable,
};

/// The identity of a security requirement within a list: the scheme ids it
/// names, sorted and joined with `,`.
pub(crate) fn requirement_key(requirement: &SecurityRequirement) -> String {
    let mut ids: Vec<&str> = requirement.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids.join(",")
}

/// One entry of a `security` list.
///
/// Each scheme id it names is compared twice at `<index>/<id>`: the scope
/// list, as a set, and the scheme each document declares under that id.
pub(crate) struct SecurityRequirementComparer;

impl NodeComparer for SecurityRequirementComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) =
            cx.both_present(ElementKind::SecurityRequirement, source, target)?
        else {
            return Ok(());
        };
        let source: &SecurityRequirement = typed(source)?;
        let target: &SecurityRequirement = typed(target)?;

        // Requirements are matched by their scheme set, so both sides name
        // the same schemes.
        debug_assert_eq!(requirement_key(source), requirement_key(target));
        for (id, source_scopes) in source {
            let Some(target_scopes) = target.get(id) else {
                continue;
            };
            cx.walk_key(id, |cx| {
                compare_scopes(cx, source_scopes, target_scopes)?;
                compare_named_scheme(cx, id)
            })?;
        }
        Ok(())
    }
}

fn compare_scopes(
    cx: &mut ComparisonContext<'_>,
    source: &[String],
    target: &[String],
) -> anyhow::Result<()> {
    let mut sorted_source = source.to_vec();
    let mut sorted_target = target.to_vec();
    sorted_source.sort_unstable();
    sorted_target.sort_unstable();
    if sorted_source != sorted_target {
        cx.compare_value(ElementKind::Scopes, Some(source), Some(target))?;
    }
    Ok(())
}

/// Compare the schemes the two documents declare under `id`. A document
/// that names a scheme it does not declare is treated as not having it.
fn compare_named_scheme<'a>(cx: &mut ComparisonContext<'a>, id: &str) -> anyhow::Result<()> {
    let lookup = |document: Option<&'a openapiv3::OpenAPI>| {
        let scheme = document.and_then(|doc| SecurityScheme::lookup(doc, id));
        if scheme.is_none() {
            tracing::debug!(scheme = id, "security requirement names an undeclared scheme");
        }
        scheme.map(Node::SecurityScheme)
    };
    let source = lookup(cx.source_document());
    let target = lookup(cx.target_document());
    cx.dispatch(ElementKind::SecurityScheme, source, target)
}

pub(crate) struct SecuritySchemeComparer;

impl NodeComparer for SecuritySchemeComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let Some((source, target)) =
            cx.both_present(ElementKind::SecurityScheme, source, target)?
        else {
            return Ok(());
        };
        let source: &ReferenceOr<SecurityScheme> = typed(source)?;
        let target: &ReferenceOr<SecurityScheme> = typed(target)?;
        let Some((source, target)) = cx.resolve_pair(RefOr::from(source), RefOr::from(target))?
        else {
            return Ok(());
        };

        // The scheme variants share field names on the wire, so walk the
        // serialized form.
        let source = serde_json::to_value(source)?;
        let target = serde_json::to_value(target)?;

        cx.json_field("type", ElementKind::String, &source, &target)?;
        cx.json_field("description", ElementKind::String, &source, &target)?;
        cx.json_field("name", ElementKind::String, &source, &target)?;
        cx.json_field("in", ElementKind::String, &source, &target)?;
        cx.json_field("scheme", ElementKind::String, &source, &target)?;
        cx.json_field("bearerFormat", ElementKind::String, &source, &target)?;
        cx.json_field("openIdConnectUrl", ElementKind::Uri, &source, &target)?;
        cx.walk_field("flows", |cx| {
            compare_flows(cx, source.get("flows"), target.get("flows"))
        })
    }
}

const FLOWS: [&str; 4] = ["implicit", "password", "clientCredentials", "authorizationCode"];

/// `openapiv3` may serialize an unset flow as `null`.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn compare_flows(
    cx: &mut ComparisonContext<'_>,
    source: Option<&Value>,
    target: Option<&Value>,
) -> anyhow::Result<()> {
    let (source, target) = match (present(source), present(target)) {
        (Some(source), Some(target)) => (source, target),
        (None, None) => return Ok(()),
        (source, target) => return cx.compare_value(ElementKind::OAuthFlows, source, target),
    };

    for flow in FLOWS {
        cx.walk_field(flow, |cx| compare_flow(cx, source.get(flow), target.get(flow)))?;
    }
    Ok(())
}

fn compare_flow(
    cx: &mut ComparisonContext<'_>,
    source: Option<&Value>,
    target: Option<&Value>,
) -> anyhow::Result<()> {
    let (source, target) = match (present(source), present(target)) {
        (Some(source), Some(target)) => (source, target),
        (None, None) => return Ok(()),
        (source, target) => return cx.compare_value(ElementKind::OAuthFlow, source, target),
    };

    cx.json_field("authorizationUrl", ElementKind::Uri, source, target)?;
    cx.json_field("tokenUrl", ElementKind::Uri, source, target)?;
    cx.json_field("refreshUrl", ElementKind::Uri, source, target)?;
    cx.walk_field("scopes", |cx| {
        cx.compare_json_object(
            ElementKind::String,
            source.get("scopes"),
            target.get("scopes"),
            |cx, source, target| cx.compare_value(ElementKind::String, Some(source), Some(target)),
        )
    })
}
