//! Parsing of the `condition` expression of a detection and its resolution
//! against the detection's selections into a [`ConditionNode`] tree.

use lazy_static::lazy_static;

use pest::iterators::Pairs;
use pest::pratt_parser::PrattParser;
use pest::Parser;

use crate::ast::ConditionNode;
use crate::error::{Result, SigmaError};

/// The parser for Sigma conditions.
#[derive(pest_derive::Parser)]
#[grammar = "detection/condition.pest"]
pub struct ConditionParser;

lazy_static! {
    static ref PRATT_PARSER: PrattParser<Rule> = {
        use pest::pratt_parser::{Assoc::*, Op};
        use Rule::*;

        // Precedence is defined lowest to highest
        PrattParser::new()
            .op(Op::infix(or, Left))
            .op(Op::infix(and, Left))
            .op(Op::prefix(not))
            .op(Op::prefix(xof))
    };
}

/// A node of the parsed condition expression.
#[derive(Debug, PartialEq, Clone)]
enum ConditionExpr {
    Identifier(String),
    Not(Box<ConditionExpr>),
    XOf(XOfType, Box<ConditionExpr>),
    BoolOp {
        lhs: Box<ConditionExpr>,
        op: BoolOp,
        rhs: Box<ConditionExpr>,
    },
}

/// Represents a boolean operator in a condition.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BoolOp {
    Or,
    And,
}

/// Represents the quantifier of an `x of` condition.
#[derive(Debug, PartialEq, Clone)]
pub enum XOfType {
    NOf(i64),
    AllOf(),
}

impl ConditionExpr {
    fn from_str(input: &str) -> Result<ConditionExpr> {
        let mut pairs = ConditionParser::parse(Rule::condition, input)
            .map_err(|e| SigmaError::Condition(e.to_string()))?;
        let expr = pairs
            .next()
            .ok_or_else(|| SigmaError::Condition(format!("empty condition {:?}", input)))?;
        ConditionExpr::parse(expr.into_inner())
    }

    fn parse(pairs: Pairs<Rule>) -> Result<ConditionExpr> {
        PRATT_PARSER
            .map_primary(|primary| match primary.as_rule() {
                Rule::identifier => Ok(ConditionExpr::Identifier(primary.as_str().to_string())),
                Rule::expr => ConditionExpr::parse(primary.into_inner()),
                _ => Err(SigmaError::Condition(format!(
                    "expected expr or identifier, found rule {:?}",
                    primary
                ))),
            })
            .map_prefix(|op, rhs| {
                let rhs = rhs?;
                match op.as_rule() {
                    Rule::not => Ok(ConditionExpr::Not(Box::new(rhs))),
                    Rule::xof => {
                        let quantifier = op.into_inner().next().ok_or_else(|| {
                            SigmaError::Condition("x of without quantifier".to_string())
                        })?;
                        let count = match quantifier.as_rule() {
                            Rule::count => XOfType::NOf(
                                quantifier
                                    .as_str()
                                    .parse()
                                    .map_err(|e| SigmaError::Condition(format!("{}", e)))?,
                            ),
                            Rule::any => XOfType::NOf(1),
                            _ => XOfType::AllOf(),
                        };
                        Ok(ConditionExpr::XOf(count, Box::new(rhs)))
                    }
                    _ => Err(SigmaError::Condition(format!(
                        "expected prefix, found rule {:?}",
                        op
                    ))),
                }
            })
            .map_infix(|lhs, op, rhs| {
                let lhs = lhs?;
                let rhs = rhs?;
                let op = match op.as_rule() {
                    Rule::and => Ok(BoolOp::And),
                    Rule::or => Ok(BoolOp::Or),
                    _ => Err(SigmaError::Condition(format!(
                        "expected infix, found op {:?}",
                        op
                    ))),
                }?;
                Ok(ConditionExpr::BoolOp {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                })
            })
            .parse(pairs)
    }
}

/// Builds a group of `op`, collapsing a single child into itself.
pub(crate) fn group(op: BoolOp, mut children: Vec<ConditionNode>) -> Result<ConditionNode> {
    if children.len() == 1 {
        if let Some(child) = children.pop() {
            return Ok(child);
        }
    }
    match op {
        BoolOp::And => ConditionNode::and(children),
        BoolOp::Or => ConditionNode::or(children),
    }
}

/// Collects the operands of a chain of the same boolean operator.
fn flatten<'a>(expr: &'a ConditionExpr, op: BoolOp, operands: &mut Vec<&'a ConditionExpr>) {
    match expr {
        ConditionExpr::BoolOp { lhs, op: inner, rhs } if *inner == op => {
            flatten(lhs, op, operands);
            flatten(rhs, op, operands);
        }
        other => operands.push(other),
    }
}

/// Selections named by an `x of` target: `them`, a name, or a glob pattern.
fn matching<'a>(
    target: &str,
    selections: &'a [(String, ConditionNode)],
) -> Result<Vec<&'a ConditionNode>> {
    if target == "them" {
        return Ok(selections
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(_, node)| node)
            .collect());
    }
    let pattern = glob::Pattern::new(target)?;
    Ok(selections
        .iter()
        .filter(|(name, _)| pattern.matches(name))
        .map(|(_, node)| node)
        .collect())
}

fn resolve(expr: &ConditionExpr, selections: &[(String, ConditionNode)]) -> Result<ConditionNode> {
    match expr {
        ConditionExpr::Identifier(id) => selections
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, node)| node.clone())
            .ok_or_else(|| SigmaError::Condition(format!("unknown selection {:?}", id))),
        ConditionExpr::Not(inner) => Ok(ConditionNode::not(resolve(inner, selections)?)),
        ConditionExpr::XOf(xoftype, inner) => {
            let ConditionExpr::Identifier(target) = inner.as_ref() else {
                return Err(SigmaError::Condition(
                    "x of expects a selection name or pattern".to_string(),
                ));
            };
            let matched = matching(target, selections)?
                .into_iter()
                .cloned()
                .collect::<Vec<_>>();
            if matched.is_empty() {
                return Err(SigmaError::Condition(format!(
                    "no selection matches {:?}",
                    target
                )));
            }
            match xoftype {
                XOfType::NOf(1) => group(BoolOp::Or, matched),
                XOfType::AllOf() => group(BoolOp::And, matched),
                XOfType::NOf(n) => Err(SigmaError::Unsupported(format!("{} of {}", n, target))),
            }
        }
        ConditionExpr::BoolOp { op, .. } => {
            let mut operands = Vec::new();
            flatten(expr, *op, &mut operands);
            let children = operands
                .into_iter()
                .map(|operand| resolve(operand, selections))
                .collect::<Result<Vec<_>>>()?;
            group(*op, children)
        }
    }
}

/// Represents a condition in a Sigma rule.
#[derive(Debug)]
pub struct Condition {
    ast: ConditionExpr,
}

impl Condition {
    /// Creates a new `Condition` from a string input.
    pub fn new(input: &str) -> Result<Condition> {
        let parsed = ConditionExpr::from_str(input)?;
        Ok(Condition { ast: parsed })
    }

    /// Replaces selection names by their condition trees.
    pub fn resolve(&self, selections: &[(String, ConditionNode)]) -> Result<ConditionNode> {
        resolve(&self.ast, selections)
    }
}
