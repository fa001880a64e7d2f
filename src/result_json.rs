//! Purpose: JSON views of a `ParserResult` for the CLI.
//! Exports: `result_json`, `token_rows`, `TokenRow`.
//! Role: Keeps the `parse` and `tokens` output shapes in one place.
//! Invariants: Stable key names; locations are `[begin, end]` byte offsets.
//! Invariants: AST conversion is iterative, like node release.

use handoff::api::{Comment, Diagnostic, MagicComment, Node, NodeKind, ParserResult, Token};
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct TokenRow {
    pub token_type: u32,
    pub name: &'static str,
    pub value: String,
    pub loc: [u64; 2],
    pub lex_state_before: u32,
    pub lex_state_after: u32,
}

impl TokenRow {
    fn from_token(token: &Token) -> Self {
        Self {
            token_type: token.token_type(),
            name: token.token_name(),
            value: token.to_string_lossy(),
            loc: [token.loc().begin, token.loc().end],
            lex_state_before: token.lex_state_before(),
            lex_state_after: token.lex_state_after(),
        }
    }
}

pub(crate) fn token_rows(tokens: &[Token]) -> Vec<TokenRow> {
    tokens.iter().map(TokenRow::from_token).collect()
}

fn node_attributes(kind: &NodeKind, map: &mut Map<String, Value>) {
    match kind {
        NodeKind::Int { value } => {
            map.insert("value".to_string(), json!(value));
        }
        NodeKind::Str { value } => {
            map.insert("value".to_string(), json!(value.to_string_lossy()));
        }
        NodeKind::Lvar { name }
        | NodeKind::Lvasgn { name }
        | NodeKind::Arg { name }
        | NodeKind::Const { name } => {
            map.insert("name".to_string(), json!(name));
        }
        NodeKind::Send {
            method,
            has_receiver,
        } => {
            map.insert("method".to_string(), json!(method));
            map.insert("has_receiver".to_string(), json!(has_receiver));
        }
        NodeKind::Def { name } => {
            map.insert("name".to_string(), json!(name));
        }
        _ => {}
    }
}

pub(crate) fn node_json(root: &Node) -> Value {
    enum Step<'a> {
        Visit(&'a Node),
        Build(&'a Node),
    }

    let mut steps = vec![Step::Visit(root)];
    let mut built: Vec<Value> = Vec::new();
    while let Some(step) = steps.pop() {
        match step {
            Step::Visit(node) => {
                steps.push(Step::Build(node));
                for child in node.children().iter().rev() {
                    steps.push(Step::Visit(child));
                }
            }
            Step::Build(node) => {
                let children = built.split_off(built.len() - node.children().len());
                let mut map = Map::new();
                map.insert("type".to_string(), json!(node.str_type()));
                map.insert("loc".to_string(), json!([node.loc().begin, node.loc().end]));
                node_attributes(node.kind(), &mut map);
                if !children.is_empty() {
                    map.insert("children".to_string(), Value::Array(children));
                }
                built.push(Value::Object(map));
            }
        }
    }
    built.pop().unwrap_or(Value::Null)
}

fn diagnostic_json(diagnostic: &Diagnostic, result: &ParserResult) -> Value {
    let mut map = Map::new();
    map.insert("level".to_string(), json!(diagnostic.level().as_str()));
    map.insert("kind".to_string(), json!(diagnostic.message().name()));
    map.insert("message".to_string(), json!(diagnostic.message().render()));
    map.insert(
        "loc".to_string(),
        json!([diagnostic.loc().begin, diagnostic.loc().end]),
    );
    if let Some(rendered) = diagnostic.render(result.input()) {
        map.insert("rendered".to_string(), json!(rendered));
    }
    Value::Object(map)
}

fn comment_json(comment: &Comment) -> Value {
    json!({
        "kind": comment.kind.as_str(),
        "loc": [comment.location.begin, comment.location.end],
    })
}

fn magic_comment_json(magic: &MagicComment, result: &ParserResult) -> Value {
    json!({
        "kind": magic.kind.as_str(),
        "key": result.input().source(&magic.key_l),
        "value": result.input().source(&magic.value_l),
        "key_loc": [magic.key_l.begin, magic.key_l.end],
        "value_loc": [magic.value_l.begin, magic.value_l.end],
    })
}

pub(crate) fn result_json(result: &ParserResult) -> Value {
    let mut map = Map::new();
    map.insert(
        "input".to_string(),
        json!({
            "name": result.input().name.to_string_lossy(),
            "bytes": result.input().len(),
            "lines": result.input().lines.len(),
        }),
    );
    map.insert("ast".to_string(), node_json(result.ast()));
    map.insert("tokens".to_string(), json!(token_rows(result.tokens())));
    map.insert(
        "diagnostics".to_string(),
        Value::Array(
            result
                .diagnostics()
                .iter()
                .map(|diagnostic| diagnostic_json(diagnostic, result))
                .collect(),
        ),
    );
    map.insert(
        "comments".to_string(),
        Value::Array(result.comments().iter().map(comment_json).collect()),
    );
    map.insert(
        "magic_comments".to_string(),
        Value::Array(
            result
                .magic_comments()
                .iter()
                .map(|magic| magic_comment_json(magic, result))
                .collect(),
        ),
    );
    Value::Object(map)
}
