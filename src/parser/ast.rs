use crate::core::Value;

/// Root statement type
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Match(MatchStmt),
    Create(CreateStmt),
    CreateConstraint(ConstraintStmt),
    Delete(DeleteStmt),
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Match(_) => "MATCH",
            Statement::Create(_) => "CREATE",
            Statement::CreateConstraint(_) => "CREATE CONSTRAINT",
            Statement::Delete(_) => "DELETE",
        }
    }
}

/// `(variable:Label)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePattern {
    pub variable: String,
    pub label: String,
}

/// Expression over the matched node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `v`
    Node,
    /// `v.key`
    Property(String),
    /// `id(v)`
    Id,
}

impl Expr {
    /// Column name used when no alias is given, e.g. `f.name`
    pub fn default_alias(&self, variable: &str) -> String {
        match self {
            Expr::Node => variable.to_string(),
            Expr::Property(key) => format!("{}.{}", variable, key),
            Expr::Id => format!("id({})", variable),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Parameter(String),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnItem {
    pub expr: Expr,
    pub alias: String,
}

/// `WHERE expr = operand`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub expr: Expr,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub expr: Expr,
    pub descending: bool,
}

/// MATCH ... RETURN
#[derive(Debug, Clone, PartialEq)]
pub struct MatchStmt {
    pub pattern: NodePattern,
    pub predicate: Option<Predicate>,
    pub returns: Vec<ReturnItem>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

/// CREATE (v:Label {...}) [RETURN ...]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateStmt {
    pub pattern: NodePattern,
    pub properties: Vec<(String, Operand)>,
    pub returns: Vec<ReturnItem>,
}

/// CREATE CONSTRAINT ON (v:Label) ASSERT v.key IS UNIQUE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintStmt {
    pub label: String,
    pub property: String,
}

/// MATCH (v:Label) [WHERE ...] [DETACH] DELETE v
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub pattern: NodePattern,
    pub predicate: Option<Predicate>,
}
