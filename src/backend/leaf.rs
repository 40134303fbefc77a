use log::trace;

use super::config::FIELD_NAME_PATTERN;
use super::{template, MongoDbBackend};
use crate::ast::{Leaf, SigmaString, Value, WildcardShape};
use crate::error::{Result, SigmaError};

impl MongoDbBackend {
    /// Converts a single leaf condition into a query fragment.
    pub fn translate_leaf(&self, leaf: &Leaf) -> Result<String> {
        trace!("translating leaf {:?}", leaf);
        match leaf {
            Leaf::FieldEquals { field: None, value } => {
                Ok(template::keyword(&self.format_value(value)))
            }
            Leaf::FieldEquals {
                field: Some(field),
                value,
            } => self.translate_field_value(field, value),
            Leaf::Compare { field, op, value } => Ok(template::compare(
                &self.convert_field_name(field)?,
                self.dialect.compare_token(*op),
                &value.to_string(),
            )),
            Leaf::Null { field } => Ok(template::null(&self.convert_field_name(field)?)),
            Leaf::Exists { field, exists } => Ok(template::exists(
                &self.convert_field_name(field)?,
                self.dialect.bool_token(*exists),
            )),
        }
    }

    fn translate_field_value(&self, field: &str, value: &Value) -> Result<String> {
        let field = self.convert_field_name(field)?;
        match value {
            Value::Str(s) => Ok(self.translate_string(&field, s)),
            // the pattern is matched literally
            Value::Regex(pattern) => Ok(template::contains(
                &field,
                self.dialect.regex_token,
                &self.escape(pattern, true),
            )),
            Value::List(values) => Ok(self.in_expression(&field, values)),
            Value::Expansion(alternatives) => {
                let head = expansion_head(alternatives)?;
                Ok(self.translate_string(&field, head))
            }
            Value::FieldRef(other) => Ok(template::field_ref(
                &field,
                &self.convert_field_name(other)?,
            )),
            Value::Bool(_) | Value::Number(_) => {
                Ok(template::field_eq(&field, &self.format_value(value)))
            }
        }
    }

    fn translate_string(&self, field: &str, s: &SigmaString) -> String {
        let token = self.dialect.regex_token;
        match s.shape() {
            WildcardShape::Contains => {
                template::contains(field, token, &self.escape(s.unwrapped(), true))
            }
            WildcardShape::EndsWith => {
                template::ends_with(field, token, &self.escape(s.unwrapped(), true))
            }
            WildcardShape::StartsWith => {
                template::starts_with(field, token, &self.escape(s.unwrapped(), true))
            }
            WildcardShape::Equals => template::string_eq(field, &self.escape(s.unwrapped(), false)),
        }
    }

    fn in_expression(&self, field: &str, values: &[Value]) -> String {
        let values = values
            .iter()
            .map(|v| self.format_value(v))
            .collect::<Vec<_>>();
        template::in_list(
            field,
            self.dialect.in_token,
            &values,
            self.dialect.list_separator,
        )
    }

    /// Matches `field` against `regex` as given, without any escaping.
    pub fn translate_regex(&self, field: &str, regex: &str) -> Result<String> {
        Ok(template::regex(
            &self.convert_field_name(field)?,
            self.dialect.regex_token,
            regex,
        ))
    }

    /// List membership of `field` in `values`.
    pub fn translate_in(&self, field: &str, values: &[Value]) -> Result<String> {
        Ok(self.in_expression(&self.convert_field_name(field)?, values))
    }

    /// Field names are passed through; names outside `^[\w.]+$` get the
    /// dialect's field quote. Names that would break out of the literal are
    /// rejected.
    pub fn convert_field_name(&self, field: &str) -> Result<String> {
        if field.is_empty()
            || field.contains(self.dialect.str_quote)
            || field.contains(self.dialect.escape_char)
        {
            return Err(SigmaError::InvalidFieldName(field.to_string()));
        }
        if FIELD_NAME_PATTERN.is_match(field) {
            Ok(field.to_string())
        } else {
            let quote = self.dialect.field_quote;
            Ok(format!("{}{}{}", quote, field, quote))
        }
    }
}

/// The first alternative of an expansion, after checking that every
/// alternative is a string of the same wildcard shape.
fn expansion_head(alternatives: &[Value]) -> Result<&SigmaString> {
    let mut strings = alternatives.iter().map(|alternative| match alternative {
        Value::Str(s) => Ok(s),
        other => Err(SigmaError::InvalidExpansion(format!(
            "alternative {:?} is not a string",
            other
        ))),
    });

    let head = strings
        .next()
        .ok_or_else(|| SigmaError::InvalidExpansion("no alternatives".to_string()))??;

    for alternative in strings {
        let alternative = alternative?;
        if alternative.shape() != head.shape() {
            return Err(SigmaError::InvalidExpansion(format!(
                "alternatives {:?} and {:?} differ in wildcard shape",
                head.as_str(),
                alternative.as_str()
            )));
        }
    }
    Ok(head)
}
