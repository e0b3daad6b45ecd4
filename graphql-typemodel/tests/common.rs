use apollo_compiler::Schema;
use apollo_compiler::ast;
use graphql_typemodel::Document;
use graphql_typemodel::SchemaIndex;
use graphql_typemodel::TypeModel;
use graphql_typemodel::TypeModelNode;

const SCHEMA: &str = r#"
schema {
    query: Query
    mutation: Mutation
}

type Query {
    user(id: ID!): User
    hero: Character
    search: [SearchResult!]!
}

type Mutation {
    rename(id: ID!, name: String!): User
}

type User {
    id: ID!
    email: String!
    profile: Profile
    friends: [User!]
}

type Profile {
    bio: String
    avatar: Avatar
}

type Avatar {
    url: String!
}

interface Character {
    id: ID!
    name: String!
}

type Human implements Character {
    id: ID!
    name: String!
    height: Float
}

type Droid implements Character {
    id: ID!
    name: String!
    primaryFunction: String
}

union SearchResult = Human | Droid
"#;

pub fn index() -> SchemaIndex {
    let schema = Schema::parse_and_validate(SCHEMA, "schema.graphql").unwrap();
    SchemaIndex::new(&schema).unwrap()
}

pub fn document(name: &str, source: &str) -> Document {
    let ast = ast::Document::parse(source, format!("{name}.graphql")).unwrap();
    Document::from_ast(name, &ast)
}

pub fn names(model: &TypeModel) -> Vec<&str> {
    model
        .entities
        .iter()
        .map(|entity| entity.name.as_str())
        .collect()
}

pub fn entity<'m>(model: &'m TypeModel, name: &str) -> &'m TypeModelNode {
    model
        .entities
        .iter()
        .find(|entity| entity.name == name)
        .unwrap_or_else(|| panic!("no entity named {name}"))
}
