// ============================================================================
// Statement parser
// ============================================================================
//
// Recognizes the small Cypher subset the in-memory graph store evaluates:
//
//   MATCH (v:Label) [WHERE <expr> = <operand>] RETURN <items> [ORDER BY ..] [LIMIT n]
//   MATCH (v:Label) [WHERE <expr> = <operand>] [DETACH] DELETE v
//   CREATE (v:Label {key: <operand>, ...}) [RETURN <items>]
//   CREATE CONSTRAINT ON (v:Label) ASSERT v.key IS UNIQUE
//
// ============================================================================

pub mod ast;

use crate::core::{DbError, Result, Value};
use ast::*;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MATCH_RE: Regex = Regex::new(
        r"(?is)^\s*MATCH\s*\(\s*(?P<var>[A-Za-z_][A-Za-z0-9_]*)\s*:\s*(?P<label>[A-Za-z_][A-Za-z0-9_]*)\s*\)\s*(?:WHERE\s+(?P<where>.+?)\s+)?(?:(?:DETACH\s+)?DELETE\s+(?P<delete>[A-Za-z_][A-Za-z0-9_]*)|RETURN\s+(?P<returns>.+?)(?:\s+ORDER\s+BY\s+(?P<order>.+?))?(?:\s+LIMIT\s+(?P<limit>\d+))?)\s*;?\s*$"
    )
    .expect("MATCH pattern is valid");
    static ref CREATE_RE: Regex = Regex::new(
        r"(?is)^\s*CREATE\s*\(\s*(?P<var>[A-Za-z_][A-Za-z0-9_]*)\s*:\s*(?P<label>[A-Za-z_][A-Za-z0-9_]*)\s*(?:\{(?P<props>.*)\})?\s*\)(?:\s+RETURN\s+(?P<returns>.+?))?\s*;?\s*$"
    )
    .expect("CREATE pattern is valid");
    static ref CONSTRAINT_RE: Regex = Regex::new(
        r"(?is)^\s*CREATE\s+CONSTRAINT\s+ON\s*\(\s*(?P<var>[A-Za-z_][A-Za-z0-9_]*)\s*:\s*(?P<label>[A-Za-z_][A-Za-z0-9_]*)\s*\)\s*ASSERT\s+(?P<pvar>[A-Za-z_][A-Za-z0-9_]*)\.(?P<prop>[A-Za-z_][A-Za-z0-9_]*)\s+IS\s+UNIQUE\s*;?\s*$"
    )
    .expect("CONSTRAINT pattern is valid");
    static ref EXPR_RE: Regex = Regex::new(
        r"(?i)^(?:id\s*\(\s*(?P<id_var>[A-Za-z_][A-Za-z0-9_]*)\s*\)|(?P<prop_var>[A-Za-z_][A-Za-z0-9_]*)\.(?P<key>[A-Za-z_][A-Za-z0-9_]*)|(?P<var>[A-Za-z_][A-Za-z0-9_]*))$"
    )
    .expect("expression pattern is valid");
    static ref RETURN_ITEM_RE: Regex = Regex::new(
        r"(?is)^(?P<expr>.+?)(?:\s+AS\s+(?P<alias>[A-Za-z_][A-Za-z0-9_]*))?$"
    )
    .expect("return item pattern is valid");
    static ref ORDER_RE: Regex = Regex::new(r"(?is)^(?P<expr>.+?)(?:\s+(?P<dir>ASC|DESC))?$")
        .expect("order pattern is valid");
    static ref PROPERTY_RE: Regex = Regex::new(
        r"(?s)^\s*(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*:\s*(?P<value>.+?)\s*$"
    )
    .expect("property pattern is valid");
    static ref PREDICATE_RE: Regex = Regex::new(r"(?s)^(?P<lhs>.+?)\s*=\s*(?P<rhs>.+)$")
        .expect("predicate pattern is valid");
    static ref PARAM_RE: Regex = Regex::new(r"^\$(?P<name>[A-Za-z_][A-Za-z0-9_]*)$")
        .expect("parameter pattern is valid");
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StatementParser;

impl StatementParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Result<Statement> {
        if let Some(caps) = CONSTRAINT_RE.captures(text) {
            let var = &caps["var"];
            if &caps["pvar"] != var {
                return Err(unknown_variable(&caps["pvar"]));
            }
            return Ok(Statement::CreateConstraint(ConstraintStmt {
                label: caps["label"].to_string(),
                property: caps["prop"].to_string(),
            }));
        }

        if let Some(caps) = CREATE_RE.captures(text) {
            let pattern = node_pattern(&caps["var"], &caps["label"]);
            let properties = match caps.name("props") {
                Some(props) => parse_properties(props.as_str())?,
                None => Vec::new(),
            };
            let returns = match caps.name("returns") {
                Some(items) => parse_return_items(items.as_str(), &pattern.variable)?,
                None => Vec::new(),
            };
            return Ok(Statement::Create(CreateStmt {
                pattern,
                properties,
                returns,
            }));
        }

        if let Some(caps) = MATCH_RE.captures(text) {
            let pattern = node_pattern(&caps["var"], &caps["label"]);
            let predicate = caps
                .name("where")
                .map(|clause| parse_predicate(clause.as_str(), &pattern.variable))
                .transpose()?;

            if let Some(target) = caps.name("delete") {
                if target.as_str() != pattern.variable {
                    return Err(unknown_variable(target.as_str()));
                }
                return Ok(Statement::Delete(DeleteStmt { pattern, predicate }));
            }

            let returns = match caps.name("returns") {
                Some(items) => parse_return_items(items.as_str(), &pattern.variable)?,
                None => return Err(DbError::ParseError("MATCH requires RETURN or DELETE".into())),
            };
            let order_by = caps
                .name("order")
                .map(|order| parse_order_by(order.as_str(), &pattern.variable))
                .transpose()?;
            let limit = caps
                .name("limit")
                .map(|limit| {
                    limit
                        .as_str()
                        .parse::<usize>()
                        .map_err(|e| DbError::ParseError(format!("invalid LIMIT: {}", e)))
                })
                .transpose()?;

            return Ok(Statement::Match(MatchStmt {
                pattern,
                predicate,
                returns,
                order_by,
                limit,
            }));
        }

        Err(DbError::ParseError(format!(
            "unsupported statement: {}",
            text.trim()
        )))
    }
}

fn node_pattern(variable: &str, label: &str) -> NodePattern {
    NodePattern {
        variable: variable.to_string(),
        label: label.to_string(),
    }
}

fn unknown_variable(name: &str) -> DbError {
    DbError::ParseError(format!("variable `{}` not defined", name))
}

fn parse_expr(text: &str, variable: &str) -> Result<Expr> {
    let text = text.trim();
    let caps = EXPR_RE
        .captures(text)
        .ok_or_else(|| DbError::ParseError(format!("unsupported expression: {}", text)))?;

    let (used, expr) = if let Some(var) = caps.name("id_var") {
        (var.as_str(), Expr::Id)
    } else if let Some(var) = caps.name("prop_var") {
        (var.as_str(), Expr::Property(caps["key"].to_string()))
    } else {
        (&caps["var"], Expr::Node)
    };

    if used != variable {
        return Err(unknown_variable(used));
    }
    Ok(expr)
}

fn parse_return_items(text: &str, variable: &str) -> Result<Vec<ReturnItem>> {
    split_top_level(text)
        .into_iter()
        .map(|item| {
            let caps = RETURN_ITEM_RE
                .captures(item.trim())
                .ok_or_else(|| DbError::ParseError(format!("invalid RETURN item: {}", item)))?;
            let expr = parse_expr(&caps["expr"], variable)?;
            let alias = match caps.name("alias") {
                Some(alias) => alias.as_str().to_string(),
                None => expr.default_alias(variable),
            };
            Ok(ReturnItem { expr, alias })
        })
        .collect()
}

fn parse_order_by(text: &str, variable: &str) -> Result<OrderBy> {
    let caps = ORDER_RE
        .captures(text.trim())
        .ok_or_else(|| DbError::ParseError(format!("invalid ORDER BY: {}", text)))?;
    let descending = caps
        .name("dir")
        .is_some_and(|dir| dir.as_str().eq_ignore_ascii_case("DESC"));
    Ok(OrderBy {
        expr: parse_expr(&caps["expr"], variable)?,
        descending,
    })
}

fn parse_predicate(text: &str, variable: &str) -> Result<Predicate> {
    let caps = PREDICATE_RE
        .captures(text.trim())
        .ok_or_else(|| DbError::ParseError(format!("unsupported WHERE clause: {}", text)))?;
    Ok(Predicate {
        expr: parse_expr(&caps["lhs"], variable)?,
        operand: parse_operand(&caps["rhs"])?,
    })
}

fn parse_properties(text: &str) -> Result<Vec<(String, Operand)>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut properties: Vec<(String, Operand)> = Vec::new();
    for entry in split_top_level(text) {
        let caps = PROPERTY_RE
            .captures(entry)
            .ok_or_else(|| DbError::ParseError(format!("invalid property: {}", entry.trim())))?;
        let key = caps["key"].to_string();
        if properties.iter().any(|(existing, _)| *existing == key) {
            return Err(DbError::ParseError(format!("duplicate property `{}`", key)));
        }
        properties.push((key, parse_operand(&caps["value"])?));
    }
    Ok(properties)
}

fn parse_operand(text: &str) -> Result<Operand> {
    let text = text.trim();
    if let Some(caps) = PARAM_RE.captures(text) {
        return Ok(Operand::Parameter(caps["name"].to_string()));
    }
    parse_literal(text).map(Operand::Literal)
}

fn parse_literal(text: &str) -> Result<Value> {
    let quoted = |q: char| text.len() >= 2 && text.starts_with(q) && text.ends_with(q);
    if quoted('\'') || quoted('"') {
        return Ok(Value::Text(text[1..text.len() - 1].to_string()));
    }

    match text.to_ascii_lowercase().as_str() {
        "true" => return Ok(Value::Boolean(true)),
        "false" => return Ok(Value::Boolean(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }

    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Value::Float(f));
    }

    Err(DbError::ParseError(format!("invalid literal: {}", text)))
}

/// Split on commas that are not inside a quoted string
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ',') => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            (None, _) => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
