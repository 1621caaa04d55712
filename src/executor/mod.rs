// ============================================================================
// Statement Executor
// ============================================================================
//
// Evaluates parsed statements against a GraphStore. Reads borrow the store
// immutably and refuse write statements; writes run inside a
// WriteTransaction so a failing statement leaves the store untouched.
//
// ============================================================================

use crate::core::{DbError, Node, Params, Result, Value};
use crate::parser::StatementParser;
use crate::parser::ast::*;
use crate::result::{Counters, QueryResult, Record};
use crate::storage::{GraphStore, UniqueConstraint};
use crate::transaction::WriteTransaction;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct Executor {
    parser: StatementParser,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            parser: StatementParser::new(),
        }
    }

    pub fn execute_read(&self, store: &GraphStore, text: &str, params: &Params) -> Result<QueryResult> {
        let statement = self.parser.parse(text)?;
        let Statement::Match(stmt) = &statement else {
            return Err(DbError::ReadOnly(statement.kind().to_string()));
        };

        let result = run_match(store, stmt, params)?;
        debug!(statement = "MATCH", rows = result.row_count(), "read executed");
        Ok(result)
    }

    /// Run one statement atomically: either every change sticks or none does
    pub fn execute_write(&self, store: &mut GraphStore, text: &str, params: &Params) -> Result<QueryResult> {
        let statement = self.parser.parse(text)?;
        let mut tx = WriteTransaction::begin(store);

        let result = match &statement {
            Statement::Match(stmt) => run_match(tx.store(), stmt, params)?,
            Statement::Create(stmt) => run_create(&mut tx, stmt, params)?,
            Statement::Delete(stmt) => run_delete(&mut tx, stmt, params)?,
            Statement::CreateConstraint(stmt) => run_constraint(&mut tx, stmt)?,
        };

        debug!(
            txn = %tx.id(),
            statement = statement.kind(),
            rows = result.row_count(),
            "write executed"
        );
        tx.commit();
        Ok(result)
    }
}

fn resolve(operand: &Operand, params: &Params) -> Result<Value> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Parameter(name) => params
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::MissingParameter(name.clone())),
    }
}

fn eval(expr: &Expr, node: &Node) -> Value {
    match expr {
        Expr::Node => Value::Node(node.clone()),
        Expr::Property(key) => node.get(key),
        Expr::Id => Value::Integer(node.id),
    }
}

fn select<'a>(
    store: &'a GraphStore,
    pattern: &'a NodePattern,
    predicate: Option<&Predicate>,
    params: &Params,
) -> Result<Vec<&'a Node>> {
    let expected = predicate
        .map(|predicate| resolve(&predicate.operand, params))
        .transpose()?;

    Ok(store
        .nodes_with_label(&pattern.label)
        .filter(|node| match (predicate, &expected) {
            (Some(predicate), Some(expected)) => {
                // `x = null` never matches
                !expected.is_null() && eval(&predicate.expr, node) == *expected
            }
            _ => true,
        })
        .collect())
}

fn keys_of(returns: &[ReturnItem]) -> Arc<[String]> {
    returns.iter().map(|item| item.alias.clone()).collect()
}

fn project(keys: &Arc<[String]>, returns: &[ReturnItem], node: &Node) -> Record {
    let values = returns.iter().map(|item| eval(&item.expr, node)).collect();
    Record::new(Arc::clone(keys), values)
}

fn run_match(store: &GraphStore, stmt: &MatchStmt, params: &Params) -> Result<QueryResult> {
    let mut nodes = select(store, &stmt.pattern, stmt.predicate.as_ref(), params)?;

    if let Some(order) = &stmt.order_by {
        let mut keyed: Vec<(Value, &Node)> = nodes
            .into_iter()
            .map(|node| (eval(&order.expr, node), node))
            .collect();

        let mut failure = None;
        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = a.compare(b).unwrap_or_else(|err| {
                failure.get_or_insert(err);
                Ordering::Equal
            });
            if order.descending { ordering.reverse() } else { ordering }
        });
        if let Some(err) = failure {
            return Err(err);
        }

        nodes = keyed.into_iter().map(|(_, node)| node).collect();
    }

    if let Some(limit) = stmt.limit {
        nodes.truncate(limit);
    }

    let keys = keys_of(&stmt.returns);
    let records = nodes
        .into_iter()
        .map(|node| project(&keys, &stmt.returns, node))
        .collect();

    Ok(QueryResult::new(keys, records, Counters::default()))
}

fn run_create(tx: &mut WriteTransaction<'_>, stmt: &CreateStmt, params: &Params) -> Result<QueryResult> {
    let mut node = Node::new(0, stmt.pattern.label.clone());
    for (key, operand) in &stmt.properties {
        let value = resolve(operand, params)?;
        // null properties are simply not stored
        if !value.is_null() {
            node.properties.insert(key.clone(), value);
        }
    }

    let created = tx.create_node(node)?;

    let keys = keys_of(&stmt.returns);
    let records = if stmt.returns.is_empty() {
        Vec::new()
    } else {
        vec![project(&keys, &stmt.returns, &created)]
    };

    Ok(QueryResult::new(
        keys,
        records,
        Counters {
            nodes_created: 1,
            ..Counters::default()
        },
    ))
}

fn run_delete(tx: &mut WriteTransaction<'_>, stmt: &DeleteStmt, params: &Params) -> Result<QueryResult> {
    let ids: Vec<_> = select(tx.store(), &stmt.pattern, stmt.predicate.as_ref(), params)?
        .into_iter()
        .map(|node| node.id)
        .collect();

    let nodes_deleted = ids
        .into_iter()
        .filter_map(|id| tx.delete_node(id))
        .count();

    let mut result = QueryResult::empty();
    result.counters.nodes_deleted = nodes_deleted;
    Ok(result)
}

fn run_constraint(tx: &mut WriteTransaction<'_>, stmt: &ConstraintStmt) -> Result<QueryResult> {
    let added = tx.create_constraint(UniqueConstraint::new(
        stmt.label.clone(),
        stmt.property.clone(),
    ))?;

    let mut result = QueryResult::empty();
    result.counters.constraints_added = usize::from(added);
    Ok(result)
}
