// Copyright 2025 Oxide Computer Company

use std::collections::BTreeMap;

use crate::{
    CompareError, ElementKind,
    compare::OpaqueComparer,
    context::ComparisonContext,
    document::{
        ComponentsComparer, ContactComparer, DocumentComparer, ExternalDocsComparer,
        InfoComparer, LicenseComparer, ServerComparer, TagComparer,
    },
    node::Node,
    operations::{
        EncodingComparer, ExampleComparer, HeaderComparer, MediaTypeComparer,
        OperationComparer, ParameterComparer, PathItemComparer, RequestBodyComparer,
        ResponseComparer, ResponsesComparer,
    },
    schema::SchemaComparer,
    security::{SecurityRequirementComparer, SecuritySchemeComparer},
};

/// The comparison rule for one node kind.
///
/// Either side may be absent. Implementations append differences to the
/// context at its current pointer and recurse into children through
/// [`ComparisonContext::dispatch`].
pub(crate) trait NodeComparer: Send + Sync {
    fn compare<'a>(
        &self,
        source: Option<Node<'a>>,
        target: Option<Node<'a>>,
        cx: &mut ComparisonContext<'a>,
    ) -> anyhow::Result<()>;
}

/// Maps each node kind to the comparer that handles it.
pub(crate) struct ComparerRegistry {
    comparers: BTreeMap<ElementKind, Box<dyn NodeComparer>>,
}

impl ComparerRegistry {
    /// A registry with no comparers at all.
    pub fn empty() -> Self {
        Self {
            comparers: BTreeMap::new(),
        }
    }

    pub fn register<C>(&mut self, kind: ElementKind, comparer: C) -> &mut Self
    where
        C: NodeComparer + 'static,
    {
        self.comparers.insert(kind, Box::new(comparer));
        self
    }

    pub fn get(&self, kind: ElementKind) -> Result<&dyn NodeComparer, CompareError> {
        self.comparers
            .get(&kind)
            .map(Box::as_ref)
            .ok_or(CompareError::MissingComparer { kind })
    }
}

impl Default for ComparerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(ElementKind::Document, DocumentComparer)
            .register(ElementKind::Info, InfoComparer)
            .register(ElementKind::Contact, ContactComparer)
            .register(ElementKind::License, LicenseComparer)
            .register(ElementKind::Server, ServerComparer)
            .register(ElementKind::Components, ComponentsComparer)
            .register(ElementKind::PathItem, PathItemComparer)
            .register(ElementKind::Operation, OperationComparer)
            .register(ElementKind::Parameter, ParameterComparer)
            .register(ElementKind::RequestBody, RequestBodyComparer)
            .register(ElementKind::Responses, ResponsesComparer)
            .register(ElementKind::Response, ResponseComparer)
            .register(ElementKind::MediaType, MediaTypeComparer)
            .register(ElementKind::Encoding, EncodingComparer)
            .register(ElementKind::Header, HeaderComparer)
            .register(ElementKind::Example, ExampleComparer)
            .register(ElementKind::Schema, SchemaComparer)
            .register(ElementKind::SecurityRequirement, SecurityRequirementComparer)
            .register(ElementKind::SecurityScheme, SecuritySchemeComparer)
            .register(ElementKind::Tag, TagComparer)
            .register(ElementKind::ExternalDocs, ExternalDocsComparer)
            .register(ElementKind::Any, OpaqueComparer);
        registry
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ComparerRegistry;
    use crate::{CompareError, ElementKind, context::ComparisonContext, node::Node};

    #[test]
    fn every_node_kind_is_registered() {
        let registry = ComparerRegistry::default();
        for kind in [
            ElementKind::Document,
            ElementKind::Info,
            ElementKind::Contact,
            ElementKind::License,
            ElementKind::Server,
            ElementKind::Components,
            ElementKind::PathItem,
            ElementKind::Operation,
            ElementKind::Parameter,
            ElementKind::RequestBody,
            ElementKind::Responses,
            ElementKind::Response,
            ElementKind::MediaType,
            ElementKind::Encoding,
            ElementKind::Header,
            ElementKind::Example,
            ElementKind::Schema,
            ElementKind::SecurityRequirement,
            ElementKind::SecurityScheme,
            ElementKind::Tag,
            ElementKind::ExternalDocs,
            ElementKind::Any,
        ] {
            assert!(registry.get(kind).is_ok(), "{kind} is not registered");
        }
    }

    #[test]
    fn missing_comparer_is_a_configuration_error() {
        let registry = ComparerRegistry::empty();
        let mut cx = ComparisonContext::new(None, None, &registry, None);

        let source = json!("a");
        let target = json!("b");
        let err = cx
            .dispatch(
                ElementKind::Any,
                Some(Node::Any(&source)),
                Some(Node::Any(&target)),
            )
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::MissingComparer {
                kind: ElementKind::Any
            })
        ));
        assert!(cx.into_differences().is_empty());
    }
}
