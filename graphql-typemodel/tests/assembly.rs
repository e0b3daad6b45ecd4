use std::sync::Arc;

use graphql_typemodel::NamingConvention;
use graphql_typemodel::TypeModelConfig;
use graphql_typemodel::assemble;
use pretty_assertions::assert_eq;

use crate::common::document;
use crate::common::entity;
use crate::common::index;
use crate::common::names;

#[test]
fn identical_inputs_produce_identical_output() {
    let index = index();
    let documents = vec![
        document(
            "queries",
            r#"
            query GetUser($id: ID!) {
                user(id: $id) {
                    id
                    ...Contact
                    profile { bio }
                }
            }
            fragment Contact on User { email }
            "#,
        ),
        document(
            "heroes",
            "query Heroes { hero { id ... on Human { height } ... on Droid { primaryFunction } } }",
        ),
    ];
    let config = TypeModelConfig::default();
    let first = assemble(&index, &documents, &config);
    let second = assemble(&index, &documents, &config);
    assert_eq!(first, second);
    assert_eq!(first.diagnostics.len(), 0);
}

#[test]
fn entities_are_emitted_in_preorder_with_path_names() {
    let index = index();
    let documents = vec![document(
        "q",
        r#"
        query GetUser {
            user(id: "1") {
                id
                profile {
                    bio
                    avatar { url }
                }
                friends { id }
            }
        }
        "#,
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(model.diagnostics.len(), 0);
    assert_eq!(
        names(&model),
        vec![
            "GetUser",
            "GetUser_user",
            "GetUser_user_profile",
            "GetUser_user_profile_avatar",
            "GetUser_user_friends",
        ]
    );

    let root = entity(&model, "GetUser");
    assert_eq!(root.object_fields.len(), 1);
    assert_eq!(root.object_fields[0].node_name, "GetUser_user");

    let user = entity(&model, "GetUser_user");
    let scalar_keys: Vec<&str> = user
        .scalar_fields
        .iter()
        .map(|field| field.response_key.as_str())
        .collect();
    assert_eq!(scalar_keys, vec!["id"]);
    let object_links: Vec<(&str, &str)> = user
        .object_fields
        .iter()
        .map(|field| (field.response_key.as_str(), field.node_name.as_str()))
        .collect();
    assert_eq!(
        object_links,
        vec![
            ("profile", "GetUser_user_profile"),
            ("friends", "GetUser_user_friends"),
        ]
    );
}

#[test]
fn branch_entities_follow_field_entities() {
    let index = index();
    let documents = vec![document(
        "q",
        "query Heroes { hero { id ... on Human { height } ... on Droid { primaryFunction } } }",
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(
        names(&model),
        vec!["Heroes", "Heroes_hero", "Heroes_hero_Human", "Heroes_hero_Droid"]
    );

    let hero = entity(&model, "Heroes_hero");
    assert_eq!(hero.schema_type.as_str(), "Character");
    let branch_links: Vec<(&str, &str)> = hero
        .branches
        .iter()
        .map(|branch| (branch.type_condition.as_str(), branch.node_name.as_str()))
        .collect();
    assert_eq!(
        branch_links,
        vec![("Human", "Heroes_hero_Human"), ("Droid", "Heroes_hero_Droid")]
    );

    let human = entity(&model, "Heroes_hero_Human");
    assert_eq!(human.schema_type.as_str(), "Human");
    let keys: Vec<&str> = human
        .scalar_fields
        .iter()
        .map(|field| field.response_key.as_str())
        .collect();
    assert_eq!(keys, vec!["__typename", "id", "height"]);
}

#[test]
fn identical_shapes_on_different_paths_get_distinct_names() {
    let index = index();
    let documents = vec![document(
        "q",
        r#"query Pair { first: user(id: "1") { id } second: user(id: "1") { id } }"#,
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(names(&model), vec!["Pair", "Pair_first", "Pair_second"]);
    assert_eq!(
        entity(&model, "Pair_first").scalar_fields,
        entity(&model, "Pair_second").scalar_fields
    );
}

#[test]
fn variables_appear_on_operation_roots_only() {
    let index = index();
    let documents = vec![document(
        "q",
        "query Get($id: ID!) { user(id: $id) { id profile { bio } } }",
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    let root = entity(&model, "Get");
    let variables: Vec<(String, String)> = root
        .variables
        .iter()
        .map(|variable| (variable.name.to_string(), variable.ty.to_string()))
        .collect();
    assert_eq!(variables, vec![("id".to_string(), "ID!".to_string())]);
    assert_eq!(entity(&model, "Get_user").variables.len(), 0);
    assert_eq!(entity(&model, "Get_user_profile").variables.len(), 0);
}

#[test]
fn mutations_resolve_against_the_mutation_root() {
    let index = index();
    let documents = vec![document(
        "m",
        r#"mutation Rename($id: ID!, $name: String!) { rename(id: $id, name: $name) { id } }"#,
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(model.diagnostics.len(), 0);
    assert_eq!(names(&model), vec!["Rename", "Rename_rename"]);
    assert_eq!(entity(&model, "Rename").schema_type.as_str(), "Mutation");
}

#[test]
fn naming_convention_applies_once_per_path() {
    let index = index();
    let documents = vec![document("q", r#"query GetUser { user(id: "1") { id } }"#)];
    let convention: NamingConvention = Arc::new(|name| format!("I{name}"));
    let config = TypeModelConfig {
        naming_convention: Some(convention),
        ..TypeModelConfig::default()
    };
    let model = assemble(&index, &documents, &config);
    assert_eq!(names(&model), vec!["IGetUser", "IGetUser_user"]);
}

#[test]
fn top_level_fragments_produce_entities() {
    let index = index();
    let documents = vec![document(
        "fragments",
        "fragment UserBits on User { id profile { bio } }",
    )];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    assert_eq!(names(&model), vec!["UserBits", "UserBits_profile"]);
    let root = entity(&model, "UserBits");
    assert_eq!(root.schema_type.as_str(), "User");
    assert_eq!(root.variables.len(), 0);
}

#[test]
fn unflattened_spreads_stay_references() {
    let index = index();
    let documents = vec![document(
        "q",
        r#"
        query Get { user(id: "1") { id ...UserBits } }
        fragment UserBits on User { email profile { bio } }
        "#,
    )];
    let config = TypeModelConfig {
        flatten_fragments: false,
        ..TypeModelConfig::default()
    };
    let model = assemble(&index, &documents, &config);
    assert_eq!(
        names(&model),
        vec!["Get", "Get_user", "UserBits", "UserBits_profile"]
    );
    let user = entity(&model, "Get_user");
    let scalar_keys: Vec<&str> = user
        .scalar_fields
        .iter()
        .map(|field| field.response_key.as_str())
        .collect();
    assert_eq!(scalar_keys, vec!["id"]);
    assert_eq!(user.object_fields.len(), 0);
    let refs: Vec<&str> = user
        .fragment_refs
        .iter()
        .map(|reference| reference.fragment_name.as_str())
        .collect();
    assert_eq!(refs, vec!["UserBits"]);
}

#[test]
fn entities_serialize_for_downstream_consumers() {
    let index = index();
    let documents = vec![document("q", r#"query Get { user(id: "1") { id } }"#)];
    let model = assemble(&index, &documents, &TypeModelConfig::default());
    let user = serde_json::to_value(entity(&model, "Get_user")).unwrap();
    assert_eq!(user["name"], "Get_user");
    assert_eq!(user["schema_type"], "User");
    assert_eq!(user["scalar_fields"][0]["response_key"], "id");
    assert_eq!(user["scalar_fields"][0]["ty"]["base"], "ID");
}
