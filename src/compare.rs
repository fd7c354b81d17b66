// Copyright 2025 Oxide Computer Company

use std::{fmt, hash::Hash};

use anyhow::Context as _;
use indexmap::IndexMap;
use openapiv3::OpenAPI;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    CompareError, CompareOptions, Difference, DifferenceOperation, ElementKind,
    context::ComparisonContext,
    node::{Node, RefOr},
    registry::{ComparerRegistry, NodeComparer},
    resolve::{Reference, Resolvable, ResolveReference},
    setops::{Matched, SetCompare},
};

/// Compare two OpenAPI documents given as JSON.
///
/// A JSON `null` stands for an empty document.
pub fn compare(source: &Value, target: &Value) -> anyhow::Result<Vec<Difference>> {
    Comparator::default().compare(source, target)
}

/// Compare two parsed OpenAPI documents. `None` stands for an empty document.
pub fn compare_documents(
    source: Option<&OpenAPI>,
    target: Option<&OpenAPI>,
) -> anyhow::Result<Vec<Difference>> {
    Comparator::default().compare_documents(source, target)
}

/// A configured comparison engine.
///
/// The comparator holds no per-run state; it may be shared across threads
/// and used for any number of runs.
#[derive(Default)]
pub struct Comparator {
    options: CompareOptions,
    registry: ComparerRegistry,
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        Self {
            options,
            registry: ComparerRegistry::default(),
        }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    pub fn compare(&self, source: &Value, target: &Value) -> anyhow::Result<Vec<Difference>> {
        let source =
            parse_document(source).context("error deserializing source OpenAPI document")?;
        let target =
            parse_document(target).context("error deserializing target OpenAPI document")?;

        self.compare_documents(source.as_ref(), target.as_ref())
    }

    pub fn compare_documents(
        &self,
        source: Option<&OpenAPI>,
        target: Option<&OpenAPI>,
    ) -> anyhow::Result<Vec<Difference>> {
        let mut cx = ComparisonContext::new(
            source,
            target,
            &self.registry,
            self.options.max_schema_pairs,
        );
        cx.dispatch(
            ElementKind::Document,
            source.map(Node::Document),
            target.map(Node::Document),
        )?;

        let differences = cx.into_differences();
        tracing::debug!(differences = differences.len(), "comparison complete");
        Ok(differences)
    }
}

fn parse_document(value: &Value) -> anyhow::Result<Option<OpenAPI>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(OpenAPI::deserialize(value)?))
}

/// Opaque payloads (examples, defaults, links) compare by JSON equality as a
/// single unit.
pub(crate) struct OpaqueComparer;

impl NodeComparer for OpaqueComparer {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()> {
        let source = source.map(|node| node.to_value()).transpose()?;
        let target = target.map(|node| node.to_value()).transpose()?;
        if source != target {
            cx.record(DifferenceOperation::Update, ElementKind::Any, source, target);
        }
        Ok(())
    }
}

/// Generic rules shared by the node comparers.
impl<'a> ComparisonContext<'a> {
    /// Compare two optional values by their serialized form. Any difference,
    /// including presence on one side only, is a single update.
    pub fn compare_value<T>(
        &mut self,
        kind: ElementKind,
        source: Option<&T>,
        target: Option<&T>,
    ) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
    {
        let source = source.map(serde_json::to_value).transpose()?;
        let target = target.map(serde_json::to_value).transpose()?;
        if source != target {
            self.record(DifferenceOperation::Update, kind, source, target);
        }
        Ok(())
    }

    pub fn value_field<T>(
        &mut self,
        field: &str,
        kind: ElementKind,
        source: Option<&T>,
        target: Option<&T>,
    ) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.walk_field(field, |cx| cx.compare_value(kind, source, target))
    }

    /// Compare one key of two serialized nodes.
    ///
    /// Used for fields that `openapiv3` models through enums or flattened
    /// structures, where the JSON key is the stable handle.
    pub fn json_field(
        &mut self,
        field: &str,
        kind: ElementKind,
        source: &Value,
        target: &Value,
    ) -> anyhow::Result<()> {
        self.value_field(field, kind, source.get(field), target.get(field))
    }

    /// Descend into `field` and dispatch to the comparer for `kind`.
    pub fn node_field(
        &mut self,
        field: &str,
        kind: ElementKind,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
    ) -> anyhow::Result<()> {
        if source.is_none() && target.is_none() {
            return Ok(());
        }
        self.walk_field(field, |cx| cx.dispatch(kind, source, target))
    }

    /// Compare two maps entry by entry.
    ///
    /// Keys on one side only are a whole-value removal or addition at the
    /// key; keys on both sides recurse. Source keys come first in source
    /// order, then target-only keys in target order.
    pub fn compare_map<K, S, T>(
        &mut self,
        kind: ElementKind,
        source: S,
        target: T,
    ) -> anyhow::Result<()>
    where
        K: Hash + Eq + Clone + fmt::Display,
        S: IntoIterator<Item = (K, Node<'a>)>,
        T: IntoIterator<Item = (K, Node<'a>)>,
    {
        for entry in SetCompare::new(source, target).entries {
            match entry {
                Matched::AOnly(_, key, node) => self.walk_key(&key.to_string(), |cx| {
                    cx.record_node(DifferenceOperation::Remove, kind, Some(node), None)
                })?,
                Matched::Both(_, _, key, source, target) => {
                    self.walk_key(&key.to_string(), |cx| {
                        cx.dispatch(kind, Some(source), Some(target))
                    })?
                }
                Matched::BOnly(_, key, node) => self.walk_key(&key.to_string(), |cx| {
                    cx.record_node(DifferenceOperation::Add, kind, None, Some(node))
                })?,
            }
        }
        Ok(())
    }

    /// Compare two lists position by position. Trailing entries of the
    /// longer list are removals or additions at their index.
    pub fn compare_indexed<S, T>(
        &mut self,
        kind: ElementKind,
        source: S,
        target: T,
    ) -> anyhow::Result<()>
    where
        S: IntoIterator<Item = Node<'a>>,
        T: IntoIterator<Item = Node<'a>>,
    {
        let source: Vec<_> = source.into_iter().collect();
        let target: Vec<_> = target.into_iter().collect();

        for index in 0..source.len().max(target.len()) {
            let source = source.get(index).copied();
            let target = target.get(index).copied();
            self.walk_index(index, |cx| match (source, target) {
                (Some(_), Some(_)) => cx.dispatch(kind, source, target),
                (Some(_), None) => cx.record_node(DifferenceOperation::Remove, kind, source, None),
                (None, Some(_)) => cx.record_node(DifferenceOperation::Add, kind, None, target),
                (None, None) => Ok(()),
            })?;
        }
        Ok(())
    }

    /// Compare two lists whose elements are identified by a derived key
    /// rather than by position.
    ///
    /// Matched elements recurse at the lower of their two indices, so the
    /// pointer does not depend on which document is the source. Unmatched
    /// elements are a whole-element removal or addition at their index on
    /// their own side.
    pub fn compare_keyed<K, S, T>(
        &mut self,
        kind: ElementKind,
        source: S,
        target: T,
    ) -> anyhow::Result<()>
    where
        K: Hash + Eq + Clone,
        S: IntoIterator<Item = (K, Node<'a>)>,
        T: IntoIterator<Item = (K, Node<'a>)>,
    {
        for entry in SetCompare::new(source, target).entries {
            match entry {
                Matched::AOnly(index, _, node) => self.walk_index(index, |cx| {
                    cx.record_node(DifferenceOperation::Remove, kind, Some(node), None)
                })?,
                Matched::Both(source_index, target_index, _, source, target) => self
                    .walk_index(source_index.min(target_index), |cx| {
                        cx.dispatch(kind, Some(source), Some(target))
                    })?,
                Matched::BOnly(index, _, node) => self.walk_index(index, |cx| {
                    cx.record_node(DifferenceOperation::Add, kind, None, Some(node))
                })?,
            }
        }
        Ok(())
    }

    /// A list of plain strings treated as a set, such as an operation's
    /// tags.
    pub fn compare_string_set(
        &mut self,
        kind: ElementKind,
        source: &[String],
        target: &[String],
    ) -> anyhow::Result<()> {
        let source = source.iter().map(|value| (value.as_str(), value));
        let target = target.iter().map(|value| (value.as_str(), value));

        for entry in SetCompare::new(source, target).entries {
            match entry {
                Matched::AOnly(index, _, value) => self.walk_index(index, |cx| {
                    let value = Value::from(value.as_str());
                    cx.record(DifferenceOperation::Remove, kind, Some(value), None);
                    Ok(())
                })?,
                Matched::Both(..) => {}
                Matched::BOnly(index, _, value) => self.walk_index(index, |cx| {
                    let value = Value::from(value.as_str());
                    cx.record(DifferenceOperation::Add, kind, None, Some(value));
                    Ok(())
                })?,
            }
        }
        Ok(())
    }

    /// Compare two JSON objects key by key, calling `matched` for keys
    /// present on both sides.
    pub fn compare_json_object<F>(
        &mut self,
        kind: ElementKind,
        source: Option<&Value>,
        target: Option<&Value>,
        mut matched: F,
    ) -> anyhow::Result<()>
    where
        F: FnMut(&mut Self, &Value, &Value) -> anyhow::Result<()>,
    {
        let source = object_entries(source);
        let target = object_entries(target);

        for entry in SetCompare::new(source, target).entries {
            match entry {
                Matched::AOnly(_, key, value) => self.walk_key(key, |cx| {
                    cx.record(DifferenceOperation::Remove, kind, Some(value.clone()), None);
                    Ok(())
                })?,
                Matched::Both(_, _, key, source, target) => {
                    self.walk_key(key, |cx| matched(cx, source, target))?
                }
                Matched::BOnly(_, key, value) => self.walk_key(key, |cx| {
                    cx.record(DifferenceOperation::Add, kind, None, Some(value.clone()));
                    Ok(())
                })?,
            }
        }
        Ok(())
    }

    /// Pair up two referencing nodes and resolve each against its own
    /// document.
    ///
    /// When both sides are pointers to different entries, the divergence is
    /// recorded once at `$ref` and `None` is returned: the referenced
    /// contents are compared where they are declared, not here.
    pub fn resolve_pair<T>(
        &mut self,
        source: RefOr<'a, T>,
        target: RefOr<'a, T>,
    ) -> anyhow::Result<Option<(&'a T, &'a T)>>
    where
        T: Resolvable,
    {
        if let (RefOr::Reference(source), RefOr::Reference(target)) = (source, target) {
            if Reference::parse(source)? != Reference::parse(target)? {
                tracing::debug!(
                    pointer = %self.current_pointer(),
                    source,
                    target,
                    "references diverge"
                );
                self.walk_field("$ref", |cx| {
                    cx.record(
                        DifferenceOperation::Update,
                        ElementKind::Reference,
                        Some(Value::from(source)),
                        Some(Value::from(target)),
                    );
                    Ok(())
                })?;
                return Ok(None);
            }
        }

        let source = resolve_in(self.source_document(), source)?;
        let target = resolve_in(self.target_document(), target)?;
        Ok(Some((source, target)))
    }
}

fn resolve_in<'a, T>(document: Option<&'a OpenAPI>, node: RefOr<'a, T>) -> anyhow::Result<&'a T>
where
    T: Resolvable,
{
    match node {
        RefOr::Item(item) => Ok(item),
        RefOr::Reference(reference) => {
            let document = document.ok_or_else(|| CompareError::UnresolvedReference {
                reference: reference.to_string(),
                expected: T::KIND.element_kind(),
            })?;
            Ok(document.resolve_reference::<T>(reference)?)
        }
    }
}

fn object_entries(value: Option<&Value>) -> Vec<(&String, &Value)> {
    value
        .and_then(Value::as_object)
        .map(|object| object.iter().collect())
        .unwrap_or_default()
}

/// Presence of a map that treats "empty" the same as "absent".
pub(crate) fn non_empty<T>(map: &IndexMap<String, T>) -> Option<&IndexMap<String, T>> {
    (!map.is_empty()).then_some(map)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Comparator, compare};
    use crate::{CompareError, CompareOptions, DifferenceOperation, ElementKind};

    fn document(schemas: serde_json::Value) -> serde_json::Value {
        json!({
            "openapi": "3.0.3",
            "info": { "title": "compare", "version": "1.0.0" },
            "paths": {},
            "components": { "schemas": schemas }
        })
    }

    #[test]
    fn null_documents_compare_empty() {
        assert!(compare(&json!(null), &json!(null)).unwrap().is_empty());
    }

    #[test]
    fn invalid_document_reports_side() {
        let err = compare(&json!({ "openapi": 3 }), &json!(null)).unwrap_err();
        assert!(err.to_string().contains("source"), "{err}");

        let err = compare(&json!(null), &json!({ "openapi": 3 })).unwrap_err();
        assert!(err.to_string().contains("target"), "{err}");
    }

    #[test]
    fn map_order_follows_source_then_target() {
        let source = document(json!({
            "B": { "type": "string" },
            "A": { "type": "string" },
            "C": { "type": "string" }
        }));
        let target = document(json!({
            "D": { "type": "string" },
            "C": { "type": "integer" },
            "B": { "type": "string" }
        }));

        let differences = compare(&source, &target).unwrap();
        let summary: Vec<_> = differences
            .iter()
            .map(|d| (d.operation, d.pointer.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (DifferenceOperation::Remove, "#/components/schemas/A"),
                (DifferenceOperation::Update, "#/components/schemas/C/type"),
                (DifferenceOperation::Add, "#/components/schemas/D"),
            ]
        );
    }

    #[test]
    fn composition_lists_compare_by_position() {
        let source = document(json!({
            "U": { "oneOf": [ { "type": "string" }, { "type": "integer" } ] }
        }));
        let target = document(json!({
            "U": { "oneOf": [ { "type": "string" } ] }
        }));

        let differences = compare(&source, &target).unwrap();
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].pointer, "#/components/schemas/U/oneOf/1");
        assert_eq!(differences[0].operation, DifferenceOperation::Remove);
        assert_eq!(differences[0].element_kind, ElementKind::Schema);
        assert_eq!(
            differences[0].source_value,
            Some(json!({ "type": "integer" }))
        );
    }

    #[test]
    fn schema_pair_budget_aborts_the_run() {
        let source = document(json!({
            "A": { "type": "string" },
            "B": { "type": "string" }
        }));

        let comparator = Comparator::new(CompareOptions::default().with_max_schema_pairs(1));
        let err = comparator.compare(&source, &source).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::BudgetExceeded { limit: 1 })
        ));

        let comparator = Comparator::new(CompareOptions::default().with_max_schema_pairs(2));
        assert!(comparator.compare(&source, &source).unwrap().is_empty());
    }
}
