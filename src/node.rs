// Copyright 2025 Oxide Computer Company

//! Borrowed views over the comparable nodes of an OpenAPI document.
//!
//! The registry dispatches on [`Node`]: each variant names one node kind and
//! borrows the underlying `openapiv3` value from its document for the whole
//! comparison run.

use openapiv3::{
    Components, Contact, Encoding, Example, ExternalDocumentation, Header, Info, License,
    MediaType, OpenAPI, Operation, Parameter, PathItem, ReferenceOr, RequestBody, Response,
    Responses, Schema, SecurityRequirement, SecurityScheme, Server, Tag,
};
use serde_json::Value;

use crate::{CompareError, ElementKind};

/// A position that holds either a `$ref` or an inline `T`.
///
/// `openapiv3` stores nested schemas both as `ReferenceOr<Schema>` and as
/// `ReferenceOr<Box<Schema>>`; this view erases the difference.
#[derive(Debug)]
pub(crate) enum RefOr<'a, T> {
    Reference(&'a str),
    Item(&'a T),
}

impl<T> Clone for RefOr<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RefOr<'_, T> {}

impl<'a, T> From<&'a ReferenceOr<T>> for RefOr<'a, T> {
    fn from(value: &'a ReferenceOr<T>) -> Self {
        match value {
            ReferenceOr::Reference { reference } => Self::Reference(reference),
            ReferenceOr::Item(item) => Self::Item(item),
        }
    }
}

impl<'a> From<&'a ReferenceOr<Box<Schema>>> for RefOr<'a, Schema> {
    fn from(value: &'a ReferenceOr<Box<Schema>>) -> Self {
        match value {
            ReferenceOr::Reference { reference } => Self::Reference(reference),
            ReferenceOr::Item(schema) => Self::Item(schema),
        }
    }
}

impl<'a, T> From<&'a Box<ReferenceOr<T>>> for RefOr<'a, T> {
    fn from(value: &'a Box<ReferenceOr<T>>) -> Self {
        Self::from(value.as_ref())
    }
}

/// Extraction of a typed view from a [`Node`].
pub(crate) trait FromNode<'a>: Sized {
    const KIND: ElementKind;

    fn from_node(node: Node<'a>) -> Option<Self>;
}

/// Extract the typed view a comparer expects, or fail with a configuration
/// error naming the mismatch.
pub(crate) fn typed<'a, T: FromNode<'a>>(node: Node<'a>) -> Result<T, CompareError> {
    let found = node.kind();
    T::from_node(node).ok_or(CompareError::UnexpectedNode {
        expected: T::KIND,
        found,
    })
}

macro_rules! nodes {
    ($($variant:ident($ty:ty),)*) => {
        #[derive(Clone, Copy, Debug)]
        pub(crate) enum Node<'a> {
            $($variant(&'a $ty),)*
            Schema(RefOr<'a, Schema>),
            /// An opaque JSON payload such as an example value.
            Any(&'a Value),
        }

        impl Node<'_> {
            pub fn kind(&self) -> ElementKind {
                match self {
                    $(Self::$variant(_) => ElementKind::$variant,)*
                    Self::Schema(_) => ElementKind::Schema,
                    Self::Any(_) => ElementKind::Any,
                }
            }

            /// The node as it appears in its document, serialized.
            ///
            /// Pointer nodes serialize as `{"$ref": ...}`; they are not
            /// resolved.
            pub fn to_value(&self) -> anyhow::Result<Value> {
                let value = match self {
                    $(Self::$variant(node) => serde_json::to_value(node)?,)*
                    Self::Schema(RefOr::Reference(reference)) => {
                        serde_json::json!({ "$ref": reference })
                    }
                    Self::Schema(RefOr::Item(schema)) => serde_json::to_value(schema)?,
                    Self::Any(value) => (*value).clone(),
                };
                Ok(value)
            }
        }

        $(
            impl<'a> FromNode<'a> for &'a $ty {
                const KIND: ElementKind = ElementKind::$variant;

                fn from_node(node: Node<'a>) -> Option<Self> {
                    match node {
                        Node::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

nodes! {
    Document(OpenAPI),
    Info(Info),
    Contact(Contact),
    License(License),
    Server(Server),
    Components(Components),
    PathItem(ReferenceOr<PathItem>),
    Operation(Operation),
    Parameter(ReferenceOr<Parameter>),
    RequestBody(ReferenceOr<RequestBody>),
    Responses(Responses),
    Response(ReferenceOr<Response>),
    MediaType(MediaType),
    Encoding(Encoding),
    Header(ReferenceOr<Header>),
    Example(ReferenceOr<Example>),
    SecurityRequirement(SecurityRequirement),
    SecurityScheme(ReferenceOr<SecurityScheme>),
    Tag(Tag),
    ExternalDocs(ExternalDocumentation),
}

impl<'a> FromNode<'a> for RefOr<'a, Schema> {
    const KIND: ElementKind = ElementKind::Schema;

    fn from_node(node: Node<'a>) -> Option<Self> {
        match node {
            Node::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

impl<'a> FromNode<'a> for &'a Value {
    const KIND: ElementKind = ElementKind::Any;

    fn from_node(node: Node<'a>) -> Option<Self> {
        match node {
            Node::Any(value) => Some(value),
            _ => None,
        }
    }
}
