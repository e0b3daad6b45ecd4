use graphql_typemodel::TypeModelConfig;
use graphql_typemodel::TypeModelError;
use graphql_typemodel::assemble;
use pretty_assertions::assert_eq;

use crate::common::document;
use crate::common::entity;
use crate::common::index;
use crate::common::names;

#[test]
fn duplicate_root_names_keep_the_first_entity() {
    let index = index();
    let documents = vec![
        document("first", r#"query GetUser { user(id: "1") { id } }"#),
        document("second", r#"query GetUser { user(id: "1") { email } }"#),
    ];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(names(&model), vec!["GetUser", "GetUser_user"]);
    let keys: Vec<&str> = entity(&model, "GetUser_user")
        .scalar_fields
        .iter()
        .map(|field| field.response_key.as_str())
        .collect();
    assert_eq!(keys, vec!["id"]);

    assert_eq!(model.diagnostics.len(), 1);
    assert_eq!(model.diagnostics[0].document, "second");
    assert_eq!(
        model.diagnostics[0].error,
        TypeModelError::DuplicateRootName {
            name: "GetUser".to_string(),
            first_document: "first".to_string(),
            second_document: "second".to_string(),
        }
    );
}

#[test]
fn fragment_cycles_are_diagnosed_and_excluded() {
    let index = index();
    let documents = vec![document(
        "cyclic",
        r#"
        query Get { user(id: "1") { ...A } }
        fragment A on User { id ...B }
        fragment B on User { email ...A }
        "#,
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    // neither cycle member nor the operation spreading into it is emitted
    assert_eq!(model.entities.len(), 0);

    let cycle = model
        .diagnostics
        .iter()
        .find(|diagnostic| diagnostic.root.as_deref() == Some("A"))
        .unwrap();
    let TypeModelError::FragmentCycle { path } = &cycle.error else {
        panic!("expected a fragment cycle");
    };
    let members: Vec<&str> = path.iter().map(|name| name.as_str()).collect();
    assert_eq!(members, vec!["A", "B"]);

    let operation = model
        .diagnostics
        .iter()
        .find(|diagnostic| diagnostic.root.as_deref() == Some("Get"))
        .unwrap();
    assert!(matches!(
        operation.error,
        TypeModelError::FragmentCycle { .. }
    ));
    assert_eq!(operation.path, vec!["user".to_string()]);
}

#[test]
fn a_failing_document_does_not_block_later_documents() {
    let index = index();
    let documents = vec![
        document("bad", r#"query Bad { user(id: "1") { wings } }"#),
        document("good", "query Good { hero { id } }"),
    ];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(names(&model), vec!["Good", "Good_hero"]);

    assert_eq!(model.diagnostics.len(), 1);
    let diagnostic = &model.diagnostics[0];
    assert_eq!(diagnostic.document, "bad");
    assert_eq!(diagnostic.root.as_deref(), Some("Bad"));
    assert_eq!(diagnostic.path, vec!["user".to_string()]);
    assert!(matches!(
        diagnostic.error,
        TypeModelError::UnknownField { .. }
    ));
}

#[test]
fn duplicate_fragment_definitions_keep_the_first() {
    let index = index();
    let documents = vec![document(
        "q",
        r#"
        query Get { user(id: "1") { ...Bits } }
        fragment Bits on User { id }
        fragment Bits on User { email }
        "#,
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(names(&model), vec!["Get", "Get_user", "Bits"]);
    let keys: Vec<&str> = entity(&model, "Get_user")
        .scalar_fields
        .iter()
        .map(|field| field.response_key.as_str())
        .collect();
    assert_eq!(keys, vec!["id"]);

    assert_eq!(model.diagnostics.len(), 1);
    assert!(matches!(
        model.diagnostics[0].error,
        TypeModelError::DuplicateFragmentName { .. }
    ));
}

#[test]
fn duplicate_fragments_across_documents_report_both_locations() {
    let index = index();
    let documents = vec![
        document("first", "fragment Bits on User { id }"),
        document("second", "fragment Bits on User { email }"),
    ];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(names(&model), vec!["Bits"]);
    let keys: Vec<&str> = entity(&model, "Bits")
        .scalar_fields
        .iter()
        .map(|field| field.response_key.as_str())
        .collect();
    assert_eq!(keys, vec!["id"]);

    assert_eq!(model.diagnostics.len(), 1);
    assert_eq!(model.diagnostics[0].document, "second");
    assert_eq!(model.diagnostics[0].root.as_deref(), Some("Bits"));
    assert_eq!(
        model.diagnostics[0].error,
        TypeModelError::DuplicateFragmentName {
            name: apollo_compiler::name!("Bits"),
            first_document: "first".to_string(),
            second_document: "second".to_string(),
        }
    );
}

#[test]
fn unknown_fragment_spreads_fail_only_their_document() {
    let index = index();
    let documents = vec![
        document("broken", r#"query Broken { user(id: "1") { ...Missing } }"#),
        document("ok", "query Ok { hero { name } }"),
    ];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(names(&model), vec!["Ok", "Ok_hero"]);
    assert_eq!(model.diagnostics.len(), 1);
    assert_eq!(model.diagnostics[0].path, vec!["user".to_string()]);
    assert!(matches!(
        model.diagnostics[0].error,
        TypeModelError::UnknownFragment { .. }
    ));
}
