// Copyright 2025 Oxide Computer Company

use openapi_diff::{Difference, DifferenceOperation, ElementKind, compare, compare_documents};
use openapiv3::OpenAPI;
use serde_json::{Value, json};

/// A small API with a self-referencing schema shared by two operations.
fn base() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": "test", "version": "1.0.0" },
        "tags": [
            { "name": "nodes" },
            { "name": "admin" }
        ],
        "paths": {
            "/test": {
                "get": {
                    "operationId": "get_test",
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Node" }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "operationId": "post_test",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Node" }
                            }
                        }
                    },
                    "responses": {
                        "204": { "description": "created" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Node" }
                        },
                        "owner": { "$ref": "#/components/schemas/schemaObject1" }
                    }
                },
                "schemaObject1": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                },
                "schemaObject2": {
                    "type": "object",
                    "properties": { "id": { "type": "integer" } }
                }
            }
        }
    })
}

fn patched(patch: Value) -> Value {
    let patch: Vec<json_patch::PatchOperation> = serde_json::from_value(patch).unwrap();
    let mut doc = base();
    json_patch::patch(&mut doc, &patch).unwrap();
    doc
}

fn summary(differences: &[Difference]) -> Vec<(DifferenceOperation, &str, ElementKind)> {
    differences
        .iter()
        .map(|d| (d.operation, d.pointer.as_str(), d.element_kind))
        .collect()
}

#[test]
fn test_identical_documents() {
    let doc = base();
    assert!(compare(&doc, &doc.clone()).unwrap().is_empty());

    let parsed: OpenAPI = serde_json::from_value(base()).unwrap();
    assert!(
        compare_documents(Some(&parsed), Some(&parsed))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_empty_paths_is_one_update() {
    let source = base();
    let target = patched(json!([
        { "op": "replace", "path": "/paths", "value": {} }
    ]));

    let differences = compare(&source, &target).unwrap();
    assert_eq!(
        summary(&differences),
        vec![(DifferenceOperation::Update, "#/paths", ElementKind::Paths)]
    );
    let source_paths = differences[0].source_value.as_ref().unwrap();
    assert!(source_paths["/test"]["get"].is_object());
    assert_eq!(differences[0].target_value, None);
}

#[test]
fn test_operation_added_and_removed() {
    let source = base();
    let target = patched(json!([
        { "op": "move", "from": "/paths/~1test/post", "path": "/paths/~1test/patch" }
    ]));

    let differences = compare(&source, &target).unwrap();
    assert_eq!(
        summary(&differences),
        vec![
            (
                DifferenceOperation::Remove,
                "#/paths/~1test/post",
                ElementKind::Operation
            ),
            (
                DifferenceOperation::Add,
                "#/paths/~1test/patch",
                ElementKind::Operation
            ),
        ]
    );
    assert_eq!(
        differences[0].source_value.as_ref().unwrap()["operationId"],
        json!("post_test")
    );
    assert_eq!(differences[0].target_value, None);
    assert_eq!(differences[1].source_value, None);
}

#[test]
fn test_recursive_schema_change_surfaces_per_location() {
    let source = base();
    let target = patched(json!([
        { "op": "add", "path": "/components/schemas/Node/description", "value": "a tree node" }
    ]));

    // The walk re-enters Node through `children/items`; the cycle guard stops
    // it there, so each location that reaches Node reports the change once.
    let differences = compare(&source, &target).unwrap();
    assert_eq!(
        summary(&differences),
        vec![
            (
                DifferenceOperation::Update,
                "#/paths/~1test/get/responses/200/content/application~1json/schema/description",
                ElementKind::String
            ),
            (
                DifferenceOperation::Update,
                "#/paths/~1test/post/requestBody/content/application~1json/schema/description",
                ElementKind::String
            ),
            (
                DifferenceOperation::Update,
                "#/components/schemas/Node/description",
                ElementKind::String
            ),
        ]
    );
}

#[test]
fn test_self_referencing_schemas_terminate() {
    let doc = |title: &str| {
        json!({
            "openapi": "3.0.3",
            "info": { "title": "cycle", "version": "1" },
            "paths": {},
            "components": {
                "schemas": {
                    "A": {
                        "type": "object",
                        "title": title,
                        "properties": {
                            "next": { "$ref": "#/components/schemas/A" },
                            "all": { "type": "array", "items": { "$ref": "#/components/schemas/A" } }
                        }
                    }
                }
            }
        })
    };

    assert!(compare(&doc("node"), &doc("node")).unwrap().is_empty());

    let differences = compare(&doc("node"), &doc("link")).unwrap();
    assert_eq!(
        summary(&differences),
        vec![(
            DifferenceOperation::Update,
            "#/components/schemas/A/title",
            ElementKind::String
        )]
    );
}

#[test]
fn test_reference_divergence_is_not_followed() {
    let source = base();
    let target = patched(json!([
        {
            "op": "replace",
            "path": "/components/schemas/Node/properties/owner/$ref",
            "value": "#/components/schemas/schemaObject2"
        }
    ]));

    let differences = compare(&source, &target).unwrap();
    assert_eq!(
        summary(&differences),
        vec![
            (
                DifferenceOperation::Update,
                "#/paths/~1test/get/responses/200/content/application~1json/schema/properties/owner/$ref",
                ElementKind::Reference
            ),
            (
                DifferenceOperation::Update,
                "#/paths/~1test/post/requestBody/content/application~1json/schema/properties/owner/$ref",
                ElementKind::Reference
            ),
            (
                DifferenceOperation::Update,
                "#/components/schemas/Node/properties/owner/$ref",
                ElementKind::Reference
            ),
        ]
    );
    for difference in &differences {
        assert_eq!(
            difference.source_value,
            Some(json!("#/components/schemas/schemaObject1"))
        );
        assert_eq!(
            difference.target_value,
            Some(json!("#/components/schemas/schemaObject2"))
        );
    }
}

#[test]
fn test_swapping_sides_inverts_operations() {
    let patches = [
        json!([{ "op": "move", "from": "/paths/~1test/post", "path": "/paths/~1test/patch" }]),
        json!([{ "op": "add", "path": "/components/schemas/Node/description", "value": "node" }]),
        json!([{ "op": "remove", "path": "/components/schemas/schemaObject2" }]),
        json!([{ "op": "replace", "path": "/paths", "value": {} }]),
        json!([{ "op": "add", "path": "/tags/-", "value": { "name": "extra" } }]),
        json!([
            { "op": "move", "from": "/tags/0", "path": "/tags/-" },
            { "op": "add", "path": "/tags/1/description", "value": "tree nodes" }
        ]),
        json!([
            { "op": "move", "from": "/tags/0", "path": "/tags/-" },
            { "op": "add", "path": "/tags/0/description", "value": "administration" },
            { "op": "add", "path": "/tags/1/description", "value": "tree nodes" }
        ]),
        json!([
            {
                "op": "replace",
                "path": "/components/schemas/Node/properties/owner/$ref",
                "value": "#/components/schemas/schemaObject2"
            },
            {
                "op": "add",
                "path": "/paths/~1test/get/responses/200/content/application~1json/example",
                "value": { "children": [] }
            }
        ]),
    ];

    for patch in patches {
        let source = base();
        let target = patched(patch.clone());

        let forward = compare(&source, &target).unwrap();
        let backward = compare(&target, &source).unwrap();
        assert!(!forward.is_empty(), "{patch}");
        assert_eq!(forward.len(), backward.len(), "{patch}");

        for difference in &forward {
            let mirrored = backward.iter().any(|other| {
                other.pointer == difference.pointer
                    && other.element_kind == difference.element_kind
                    && other.operation == difference.operation.inverse()
                    && other.source_value == difference.target_value
                    && other.target_value == difference.source_value
            });
            assert!(mirrored, "{patch}: no mirror for {difference}");
        }
    }
}

#[test]
fn test_reordered_tags_keep_their_pointer() {
    let source = base();
    let target = patched(json!([
        { "op": "move", "from": "/tags/0", "path": "/tags/-" },
        { "op": "add", "path": "/tags/1/description", "value": "tree nodes" }
    ]));

    // `nodes` sits at 0 in the source and 1 in the target; either way round
    // the change is reported at the lower index.
    let forward = compare(&source, &target).unwrap();
    let backward = compare(&target, &source).unwrap();
    assert_eq!(
        summary(&forward),
        vec![(
            DifferenceOperation::Update,
            "#/tags/0/description",
            ElementKind::String
        )]
    );
    assert_eq!(summary(&forward), summary(&backward));
    assert_eq!(forward[0].target_value, Some(json!("tree nodes")));
    assert_eq!(backward[0].source_value, Some(json!("tree nodes")));
}

#[test]
fn test_repeated_runs_are_identical() {
    let source = base();
    let target = patched(json!([
        { "op": "add", "path": "/components/schemas/Node/description", "value": "node" },
        { "op": "remove", "path": "/components/schemas/schemaObject2" },
        { "op": "move", "from": "/paths/~1test/post", "path": "/paths/~1test/put" }
    ]));

    let first = serde_json::to_string(&compare(&source, &target).unwrap()).unwrap();
    let second = serde_json::to_string(&compare(&source, &target).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_null_document_is_empty() {
    assert!(compare(&Value::Null, &Value::Null).unwrap().is_empty());

    let differences = compare(&Value::Null, &base()).unwrap();
    assert_eq!(
        summary(&differences),
        vec![
            (DifferenceOperation::Update, "#/paths", ElementKind::Paths),
            (
                DifferenceOperation::Update,
                "#/components",
                ElementKind::Components
            ),
            (DifferenceOperation::Update, "#/info", ElementKind::Info),
            (DifferenceOperation::Add, "#/tags/0", ElementKind::Tag),
            (DifferenceOperation::Add, "#/tags/1", ElementKind::Tag),
        ]
    );
    assert!(differences.iter().all(|d| d.source_value.is_none()));
}

#[test]
fn test_differences_serialize() {
    let target = patched(json!([
        { "op": "replace", "path": "/info/version", "value": "2.0.0" }
    ]));

    let differences = compare(&base(), &target).unwrap();
    assert_eq!(
        serde_json::to_value(&differences).unwrap(),
        json!([
            {
                "pointer": "#/info/version",
                "operation": "Update",
                "element_kind": "String",
                "source_value": "1.0.0",
                "target_value": "2.0.0"
            }
        ])
    );
}
