// Copyright 2025 Oxide Computer Company

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// One reported unit of change between a source and a target document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Difference {
    /// Location of the change, e.g. `#/paths/~1users/get/responses/200`.
    pub pointer: String,
    pub operation: DifferenceOperation,
    /// The kind of element that was compared at `pointer`.
    pub element_kind: ElementKind,
    /// The value in the source document; `None` when the element is absent
    /// there.
    pub source_value: Option<Value>,
    /// The value in the target document; `None` when the element is absent
    /// there.
    pub target_value: Option<Value>,
}

impl Difference {
    pub(crate) fn new(
        pointer: String,
        operation: DifferenceOperation,
        element_kind: ElementKind,
        source_value: Option<Value>,
        target_value: Option<Value>,
    ) -> Self {
        Self {
            pointer,
            operation,
            element_kind,
            source_value,
            target_value,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.operation, self.pointer, self.element_kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DifferenceOperation {
    /// The element exists only in the target document.
    Add,
    /// The element exists only in the source document.
    Remove,
    /// The element exists in both documents (or is wholly absent on one
    /// side of a field that both sides declare) and differs.
    Update,
}

impl DifferenceOperation {
    /// The operation observed when source and target are swapped.
    pub fn inverse(self) -> Self {
        match self {
            Self::Add => Self::Remove,
            Self::Remove => Self::Add,
            Self::Update => Self::Update,
        }
    }
}

impl fmt::Display for DifferenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// The closed set of element kinds the engine compares.
///
/// Node kinds double as registry keys; the leaf kinds (`String`, `Boolean`,
/// `Number`, `Uri`, `Scopes`, `Reference`, `Any`) describe scalar and opaque
/// values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ElementKind {
    Document,
    Info,
    Contact,
    License,
    Server,
    ServerVariable,
    Components,
    Paths,
    PathItem,
    Operation,
    Parameter,
    RequestBody,
    Responses,
    Response,
    MediaType,
    Encoding,
    Header,
    Example,
    Schema,
    SecurityRequirement,
    SecurityScheme,
    OAuthFlows,
    OAuthFlow,
    Tag,
    ExternalDocs,
    Any,
    Reference,
    Scopes,
    String,
    Boolean,
    Number,
    Uri,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Document => "document",
            Self::Info => "info",
            Self::Contact => "contact",
            Self::License => "license",
            Self::Server => "server",
            Self::ServerVariable => "server variable",
            Self::Components => "components",
            Self::Paths => "paths",
            Self::PathItem => "path item",
            Self::Operation => "operation",
            Self::Parameter => "parameter",
            Self::RequestBody => "request body",
            Self::Responses => "responses",
            Self::Response => "response",
            Self::MediaType => "media type",
            Self::Encoding => "encoding",
            Self::Header => "header",
            Self::Example => "example",
            Self::Schema => "schema",
            Self::SecurityRequirement => "security requirement",
            Self::SecurityScheme => "security scheme",
            Self::OAuthFlows => "oauth flows",
            Self::OAuthFlow => "oauth flow",
            Self::Tag => "tag",
            Self::ExternalDocs => "external docs",
            Self::Any => "any",
            Self::Reference => "reference",
            Self::Scopes => "scopes",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Uri => "uri",
        };
        f.write_str(name)
    }
}
