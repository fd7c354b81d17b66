// Copyright 2025 Oxide Computer Company

use std::{collections::HashSet, ptr};

use openapiv3::{OpenAPI, Schema};
use serde_json::Value;

use crate::{
    CompareError, Difference, DifferenceOperation, ElementKind,
    node::Node,
    path::PointerStack,
    registry::ComparerRegistry,
};

/// State for a single comparison run.
///
/// The context borrows both documents for the length of the run so that
/// resolved nodes (and the cycle guard's identity checks) can refer directly
/// into them.
pub(crate) struct ComparisonContext<'a> {
    source: Option<&'a OpenAPI>,
    target: Option<&'a OpenAPI>,
    registry: &'a ComparerRegistry,
    max_schema_pairs: Option<usize>,
    path: PointerStack,
    /// Schemas being compared on the source side, innermost last.
    source_guard: Vec<&'a Schema>,
    /// Counterparts of `source_guard`, position for position.
    target_guard: Vec<&'a Schema>,
    /// Every distinct schema pair entered during the run, by address.
    visited_pairs: HashSet<(usize, usize)>,
    differences: Vec<Difference>,
}

impl<'a> ComparisonContext<'a> {
    pub fn new(
        source: Option<&'a OpenAPI>,
        target: Option<&'a OpenAPI>,
        registry: &'a ComparerRegistry,
        max_schema_pairs: Option<usize>,
    ) -> Self {
        Self {
            source,
            target,
            registry,
            max_schema_pairs,
            path: PointerStack::new(),
            source_guard: Vec::new(),
            target_guard: Vec::new(),
            visited_pairs: HashSet::new(),
            differences: Vec::new(),
        }
    }

    pub fn into_differences(self) -> Vec<Difference> {
        self.differences
    }

    pub fn source_document(&self) -> Option<&'a OpenAPI> {
        self.source
    }

    pub fn target_document(&self) -> Option<&'a OpenAPI> {
        self.target
    }

    pub fn current_pointer(&self) -> String {
        self.path.current_pointer()
    }

    fn walk<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        let result = f(self);
        self.path.pop();
        result
    }

    /// Run `f` one level down, under a fixed field name.
    pub fn walk_field<F>(&mut self, field: &str, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        self.path.push_field(field);
        self.walk(f)
    }

    /// Run `f` one level down, under a literal key from the document.
    pub fn walk_key<F>(&mut self, key: &str, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        self.path.push_key(key);
        self.walk(f)
    }

    pub fn walk_index<F>(&mut self, index: usize, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        self.path.push_field(&index.to_string());
        self.walk(f)
    }

    /// Append a difference at the current pointer.
    pub fn record(
        &mut self,
        operation: DifferenceOperation,
        element_kind: ElementKind,
        source_value: Option<Value>,
        target_value: Option<Value>,
    ) {
        self.differences.push(Difference::new(
            self.path.current_pointer(),
            operation,
            element_kind,
            source_value,
            target_value,
        ));
    }

    /// Append a difference carrying the serialized nodes.
    pub fn record_node(
        &mut self,
        operation: DifferenceOperation,
        element_kind: ElementKind,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
    ) -> anyhow::Result<()> {
        let source_value = source.map(|node| node.to_value()).transpose()?;
        let target_value = target.map(|node| node.to_value()).transpose()?;
        self.record(operation, element_kind, source_value, target_value);
        Ok(())
    }

    /// Hand a pair of nodes to the comparer registered for `kind`.
    pub fn dispatch(
        &mut self,
        kind: ElementKind,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
    ) -> anyhow::Result<()> {
        let registry = self.registry;
        registry.get(kind)?.compare(source, target, self)
    }

    /// Presence rules shared by node comparers.
    ///
    /// Returns both nodes when both are present. When exactly one is present
    /// the whole node is reported as a single update and `None` is returned,
    /// as it is when both are absent.
    pub fn both_present(
        &mut self,
        kind: ElementKind,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
    ) -> anyhow::Result<Option<(Node<'a>, Node<'a>)>> {
        match (source, target) {
            (Some(source), Some(target)) => Ok(Some((source, target))),
            (None, None) => Ok(None),
            (source, target) => {
                self.record_node(DifferenceOperation::Update, kind, source, target)?;
                Ok(None)
            }
        }
    }

    /// Push a resolved schema pair onto the cycle guard.
    ///
    /// Returns `false`, leaving the guard untouched, when the same pair is
    /// already being compared further up the walk. A `true` return must be
    /// matched by [`Self::exit_schema_pair`].
    pub fn try_enter_schema_pair(
        &mut self,
        source: &'a Schema,
        target: &'a Schema,
    ) -> Result<bool, CompareError> {
        let reentered = self
            .source_guard
            .iter()
            .zip(&self.target_guard)
            .any(|(s, t)| ptr::eq(*s, source) && ptr::eq(*t, target));
        if reentered {
            return Ok(false);
        }

        let pair = (ptr::from_ref(source) as usize, ptr::from_ref(target) as usize);
        if self.visited_pairs.insert(pair) {
            if let Some(limit) = self.max_schema_pairs {
                if self.visited_pairs.len() > limit {
                    return Err(CompareError::BudgetExceeded { limit });
                }
            }
        }

        self.source_guard.push(source);
        self.target_guard.push(target);
        Ok(true)
    }

    pub fn exit_schema_pair(&mut self) {
        self.source_guard.pop();
        self.target_guard.pop();
    }
}
