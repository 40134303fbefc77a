use serde_json::Number;
use serde_yaml::{Mapping, Value as YamlValue};
use std::str::FromStr;

use super::condition::{group, BoolOp};
use crate::ast::{CompareOp, ConditionNode, Leaf, SigmaString, Value};
use crate::error::{Result, SigmaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    All,
    StartsWith,
    EndsWith,
    Contains,
    Exists,
    Cased,
    Re,
    /// `i`, `m` and `s` after `re`
    ReFlag,
    Base64,
    Base64Offset,
    Wide,
    WindAsh,
    Lt,
    Lte,
    Gt,
    Gte,
    Cidr,
    Expand,
    FieldRef,
}

impl Modifier {
    fn compare_op(&self) -> Option<CompareOp> {
        match self {
            Modifier::Lt => Some(CompareOp::Lt),
            Modifier::Lte => Some(CompareOp::Lte),
            Modifier::Gt => Some(CompareOp::Gt),
            Modifier::Gte => Some(CompareOp::Gte),
            _ => None,
        }
    }

    fn is_supported(&self) -> bool {
        !matches!(
            self,
            Modifier::Base64
                | Modifier::Base64Offset
                | Modifier::Wide
                | Modifier::WindAsh
                | Modifier::Cidr
                | Modifier::Expand
        )
    }
}

impl FromStr for Modifier {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(Modifier::All),
            "startswith" => Ok(Modifier::StartsWith),
            "endswith" => Ok(Modifier::EndsWith),
            "contains" => Ok(Modifier::Contains),
            "exists" => Ok(Modifier::Exists),
            "cased" => Ok(Modifier::Cased),
            "re" => Ok(Modifier::Re),
            "i" | "m" | "s" => Ok(Modifier::ReFlag),
            "base64" => Ok(Modifier::Base64),
            "base64offset" => Ok(Modifier::Base64Offset),
            "wide" | "utf16le" | "utf16be" | "utf16" => Ok(Modifier::Wide),
            "windash" => Ok(Modifier::WindAsh),
            "lt" => Ok(Modifier::Lt),
            "lte" => Ok(Modifier::Lte),
            "gt" => Ok(Modifier::Gt),
            "gte" => Ok(Modifier::Gte),
            "cidr" => Ok(Modifier::Cidr),
            "expand" => Ok(Modifier::Expand),
            "fieldref" => Ok(Modifier::FieldRef),
            _ => Err(()),
        }
    }
}

/// One `Field|modifier: value(s)` item of a selection.
#[derive(Debug, Clone)]
struct Field {
    key: Option<String>,
    modifiers: Vec<Modifier>,
}

impl Field {
    fn new(key: &str) -> Result<Self> {
        let mut key_modifiers = key.split('|');
        let key = key_modifiers
            .next()
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let modifiers = key_modifiers
            .map(|m| Modifier::from_str(m).map_err(|_| SigmaError::InvalidModifier(m.to_string())))
            .collect::<Result<Vec<_>>>()?;

        if let Some(m) = modifiers.iter().find(|m| !m.is_supported()) {
            return Err(SigmaError::Unsupported(format!(
                "{:?} modifier",
                m
            )));
        }
        if modifiers.contains(&Modifier::ReFlag) && !modifiers.contains(&Modifier::Re) {
            return Err(SigmaError::InvalidModifier(
                "regex flag without re".to_string(),
            ));
        }

        Ok(Field { key, modifiers })
    }

    fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    fn field(&self) -> Result<String> {
        self.key.clone().ok_or_else(|| {
            SigmaError::InvalidDetection(format!(
                "modifiers {:?} require a field name",
                self.modifiers
            ))
        })
    }

    /// All values of the item, OR-ed unless `all` is given.
    fn condition(&self, value: &YamlValue) -> Result<ConditionNode> {
        let values = match value {
            YamlValue::Sequence(seq) => seq.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        if values.is_empty() {
            return Err(SigmaError::InvalidDetection(format!(
                "empty value list for {:?}",
                self.key
            )));
        }

        let leaves = values
            .into_iter()
            .map(|v| self.leaf(v))
            .collect::<Result<Vec<_>>>()?;

        let op = if self.has(Modifier::All) {
            BoolOp::And
        } else {
            BoolOp::Or
        };
        group(op, leaves)
    }

    fn leaf(&self, value: &YamlValue) -> Result<ConditionNode> {
        if self.has(Modifier::Exists) {
            let exists = value.as_bool().ok_or_else(|| {
                SigmaError::InvalidValue(format!("exists expects a boolean, found {:?}", value))
            })?;
            return Ok(ConditionNode::exists(self.field()?, exists));
        }

        if let Some(op) = self.modifiers.iter().find_map(|m| m.compare_op()) {
            let number = match value {
                YamlValue::Number(n) => number(n)?,
                other => {
                    return Err(SigmaError::InvalidValue(format!(
                        "numeric comparison expects a number, found {:?}",
                        other
                    )))
                }
            };
            return Ok(ConditionNode::compare(self.field()?, op, number));
        }

        if self.has(Modifier::FieldRef) {
            let other = string(value)?;
            return Ok(ConditionNode::field_equals(self.field()?, Value::FieldRef(other)));
        }

        if self.has(Modifier::Re) {
            let pattern = string(value)?;
            return Ok(self.field_equals(Value::Regex(pattern)));
        }

        let value = match value {
            YamlValue::Null => return Ok(ConditionNode::null(self.field()?)),
            YamlValue::Bool(b) if !self.is_string_match() => Value::Bool(*b),
            YamlValue::Number(n) if !self.is_string_match() => Value::Number(number(n)?),
            other => Value::Str(SigmaString::new(self.wildcarded(&string(other)?))),
        };
        Ok(self.field_equals(value))
    }

    fn field_equals(&self, value: Value) -> ConditionNode {
        ConditionNode::Leaf(Leaf::FieldEquals {
            field: self.key.clone(),
            value,
        })
    }

    fn is_string_match(&self) -> bool {
        self.has(Modifier::Contains) || self.has(Modifier::StartsWith) || self.has(Modifier::EndsWith)
    }

    fn wildcarded(&self, s: &str) -> String {
        if self.has(Modifier::Contains) {
            format!("*{}*", s)
        } else if self.has(Modifier::StartsWith) {
            format!("{}*", s)
        } else if self.has(Modifier::EndsWith) {
            format!("*{}", s)
        } else {
            s.to_string()
        }
    }
}

fn number(n: &serde_yaml::Number) -> Result<Number> {
    if let Some(i) = n.as_i64() {
        Ok(i.into())
    } else if let Some(u) = n.as_u64() {
        Ok(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .ok_or_else(|| SigmaError::InvalidValue(format!("invalid numeric value: {}", n)))
    }
}

fn string(value: &YamlValue) -> Result<String> {
    match value {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        other => Err(SigmaError::InvalidValue(format!(
            "expected a scalar, found {:?}",
            other
        ))),
    }
}

/// A mapping of field items, all of which must match.
fn field_group(mapping: &Mapping) -> Result<ConditionNode> {
    let items = mapping
        .iter()
        .map(|(k, v)| {
            let key = k
                .as_str()
                .ok_or_else(|| SigmaError::InvalidDetection(format!("invalid key {:?}", k)))?;
            Field::new(key)?.condition(v)
        })
        .collect::<Result<Vec<_>>>()?;
    group(BoolOp::And, items)
}

/// Converts one named selection of a detection into a condition tree.
///
/// A mapping is an AND of its field items, a list is an OR of its entries
/// (mappings or keywords), a plain scalar is a keyword.
pub fn selection(value: &YamlValue) -> Result<ConditionNode> {
    match value {
        YamlValue::Mapping(m) => field_group(m),
        YamlValue::Sequence(items) => {
            let children = items
                .iter()
                .map(|item| match item {
                    YamlValue::Mapping(m) => field_group(m),
                    YamlValue::String(s) => Ok(ConditionNode::keyword(s.as_str())),
                    YamlValue::Number(n) => Ok(ConditionNode::keyword(Value::Number(number(n)?))),
                    _ => Err(SigmaError::InvalidDetection(format!(
                        "invalid selection item {:?}",
                        item
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            group(BoolOp::Or, children)
        }
        YamlValue::String(s) => Ok(ConditionNode::keyword(s.as_str())),
        _ => Err(SigmaError::InvalidDetection(format!(
            "invalid selection {:?}",
            value
        ))),
    }
}
