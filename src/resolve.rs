// Copyright 2025 Oxide Computer Company

use std::{fmt, sync::LazyLock};

use openapiv3::{
    Example, Header, OpenAPI, Parameter, PathItem, ReferenceOr, RequestBody, Response, Schema,
    SecurityScheme,
};
use regex::Regex;

use crate::{CompareError, ElementKind, path::unescape_json_pointer_segment};

/// The component table a reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Schema,
    Response,
    Parameter,
    Example,
    RequestBody,
    Header,
    SecurityScheme,
    PathItem,
}

impl ReferenceKind {
    fn from_section(section: &str) -> Option<Self> {
        match section {
            "schemas" => Some(Self::Schema),
            "responses" => Some(Self::Response),
            "parameters" => Some(Self::Parameter),
            "examples" => Some(Self::Example),
            "requestBodies" => Some(Self::RequestBody),
            "headers" => Some(Self::Header),
            "securitySchemes" => Some(Self::SecurityScheme),
            _ => None,
        }
    }

    pub fn element_kind(self) -> ElementKind {
        match self {
            Self::Schema => ElementKind::Schema,
            Self::Response => ElementKind::Response,
            Self::Parameter => ElementKind::Parameter,
            Self::Example => ElementKind::Example,
            Self::RequestBody => ElementKind::RequestBody,
            Self::Header => ElementKind::Header,
            Self::SecurityScheme => ElementKind::SecurityScheme,
            Self::PathItem => ElementKind::PathItem,
        }
    }
}

/// A parsed `$ref`: the table it points into and the entry's id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub id: String,
}

impl Reference {
    pub fn parse(reference: &str) -> Result<Self, CompareError> {
        static COMPONENT: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^#/components/([A-Za-z]+)/([^/]+)$").unwrap());
        static PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#/paths/([^/]+)$").unwrap());

        let invalid = || CompareError::InvalidReference {
            reference: reference.to_string(),
        };

        if let Some(captures) = COMPONENT.captures(reference) {
            let kind = ReferenceKind::from_section(&captures[1]).ok_or_else(invalid)?;
            return Ok(Self {
                kind,
                id: unescape_json_pointer_segment(&captures[2]),
            });
        }

        if let Some(captures) = PATH.captures(reference) {
            return Ok(Self {
                kind: ReferenceKind::PathItem,
                id: unescape_json_pointer_segment(&captures[1]),
            });
        }

        Err(invalid())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.id)
    }
}

/// A node type that can live behind a `$ref`.
pub trait Resolvable: Sized {
    const KIND: ReferenceKind;

    fn lookup<'d>(document: &'d OpenAPI, id: &str) -> Option<&'d ReferenceOr<Self>>;
}

macro_rules! component_resolvable {
    ($($ty:ty => $kind:ident, $field:ident;)*) => {
        $(
            impl Resolvable for $ty {
                const KIND: ReferenceKind = ReferenceKind::$kind;

                fn lookup<'d>(document: &'d OpenAPI, id: &str) -> Option<&'d ReferenceOr<Self>> {
                    document.components.as_ref()?.$field.get(id)
                }
            }
        )*
    };
}

component_resolvable! {
    Schema => Schema, schemas;
    Response => Response, responses;
    Parameter => Parameter, parameters;
    Example => Example, examples;
    RequestBody => RequestBody, request_bodies;
    Header => Header, headers;
    SecurityScheme => SecurityScheme, security_schemes;
}

impl Resolvable for PathItem {
    const KIND: ReferenceKind = ReferenceKind::PathItem;

    fn lookup<'d>(document: &'d OpenAPI, id: &str) -> Option<&'d ReferenceOr<Self>> {
        document.paths.paths.get(id)
    }
}

/// Reference resolution scoped to one document.
pub trait ResolveReference {
    /// Follow `reference` (and any alias chain behind it) to the node it
    /// designates.
    fn resolve_reference<T: Resolvable>(&self, reference: &str) -> Result<&T, CompareError>;

    /// Look up a component by id without going through a `$ref` string, as
    /// security requirements name their schemes.
    fn resolve_component<T: Resolvable>(&self, id: &str) -> Result<Option<&T>, CompareError>;
}

impl ResolveReference for OpenAPI {
    fn resolve_reference<T: Resolvable>(&self, reference: &str) -> Result<&T, CompareError> {
        let mut visited = Vec::new();
        let mut current = reference;

        loop {
            if visited.contains(&current) {
                return Err(CompareError::CyclicReference {
                    reference: reference.to_string(),
                });
            }
            visited.push(current);

            let parsed = Reference::parse(current)?;
            let unresolved = || CompareError::UnresolvedReference {
                reference: current.to_string(),
                expected: T::KIND.element_kind(),
            };
            if parsed.kind != T::KIND {
                return Err(unresolved());
            }

            match T::lookup(self, &parsed.id).ok_or_else(unresolved)? {
                ReferenceOr::Item(item) => return Ok(item),
                ReferenceOr::Reference { reference } => current = reference.as_str(),
            }
        }
    }

    fn resolve_component<T: Resolvable>(&self, id: &str) -> Result<Option<&T>, CompareError> {
        match T::lookup(self, id) {
            None => Ok(None),
            Some(ReferenceOr::Item(item)) => Ok(Some(item)),
            Some(ReferenceOr::Reference { reference }) => {
                self.resolve_reference::<T>(reference).map(Some)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use openapiv3::{OpenAPI, PathItem, Schema, SecurityScheme};
    use serde_json::json;

    use super::{Reference, ReferenceKind, ResolveReference};
    use crate::CompareError;

    fn document() -> OpenAPI {
        serde_json::from_value(json!({
            "openapi": "3.0.3",
            "info": { "title": "resolve", "version": "1" },
            "paths": {
                "/users": { "summary": "users" }
            },
            "components": {
                "schemas": {
                    "User": { "type": "object", "title": "user" },
                    "Alias": { "$ref": "#/components/schemas/User" },
                    "Loop1": { "$ref": "#/components/schemas/Loop2" },
                    "Loop2": { "$ref": "#/components/schemas/Loop1" }
                },
                "securitySchemes": {
                    "basic": { "type": "http", "scheme": "basic" }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn parse_component_reference() {
        let reference = Reference::parse("#/components/schemas/User").unwrap();
        assert_eq!(reference.kind, ReferenceKind::Schema);
        assert_eq!(reference.id, "User");

        let reference = Reference::parse("#/components/requestBodies/Body").unwrap();
        assert_eq!(reference.kind, ReferenceKind::RequestBody);
    }

    #[test]
    fn parse_path_reference_unescapes() {
        let reference = Reference::parse("#/paths/~1users~1{id}").unwrap();
        assert_eq!(reference.kind, ReferenceKind::PathItem);
        assert_eq!(reference.id, "/users/{id}");
    }

    #[test]
    fn parse_invalid_reference() {
        for reference in [
            "components/schemas/User",
            "#/components/widgets/User",
            "#/components/schemas/User/properties/name",
            "https://example.com/schema.json",
        ] {
            let err = Reference::parse(reference).expect_err(reference);
            assert!(matches!(err, CompareError::InvalidReference { .. }));
        }
    }

    #[test]
    fn resolve_follows_aliases() {
        let doc = document();
        let schema = doc
            .resolve_reference::<Schema>("#/components/schemas/Alias")
            .unwrap();
        assert_eq!(schema.schema_data.title.as_deref(), Some("user"));
    }

    #[test]
    fn resolve_detects_alias_cycles() {
        let doc = document();
        let err = doc
            .resolve_reference::<Schema>("#/components/schemas/Loop1")
            .unwrap_err();
        assert!(matches!(err, CompareError::CyclicReference { .. }));
    }

    #[test]
    fn resolve_wrong_kind_or_missing() {
        let doc = document();
        let err = doc
            .resolve_reference::<Schema>("#/components/securitySchemes/basic")
            .unwrap_err();
        assert!(matches!(err, CompareError::UnresolvedReference { .. }));

        let err = doc
            .resolve_reference::<Schema>("#/components/schemas/Missing")
            .unwrap_err();
        assert!(matches!(err, CompareError::UnresolvedReference { .. }));
    }

    #[test]
    fn resolve_path_item_and_component_by_id() {
        let doc = document();
        let item = doc.resolve_reference::<PathItem>("#/paths/~1users").unwrap();
        assert_eq!(item.summary.as_deref(), Some("users"));

        assert!(
            doc.resolve_component::<SecurityScheme>("basic")
                .unwrap()
                .is_some()
        );
        assert!(
            doc.resolve_component::<SecurityScheme>("oauth")
                .unwrap()
                .is_none()
        );
    }
}
