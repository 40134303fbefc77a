use super::MongoDbBackend;
use crate::ast::Value;

impl MongoDbBackend {
    /// Renders a value as a literal of the target syntax.
    ///
    /// Strings already enclosed in the string quote are trusted as
    /// pre-quoted and emitted verbatim.
    pub fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Str(s) => self.format_str(s.as_str()),
            Value::Bool(b) => self.dialect.bool_token(*b).to_string(),
            Value::Number(n) => n.to_string(),
            Value::Regex(pattern) => pattern.clone(),
            Value::FieldRef(field) => field.clone(),
            Value::List(values) | Value::Expansion(values) => {
                let values = values
                    .iter()
                    .map(|v| self.format_value(v))
                    .collect::<Vec<_>>();
                format!("[ {} ]", values.join(self.dialect.list_separator))
            }
        }
    }

    fn format_str(&self, s: &str) -> String {
        let quote = self.dialect.str_quote;
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s.to_string();
        }
        let mut formatted = String::with_capacity(s.len() + 2);
        formatted.push(quote);
        for c in s.chars() {
            if c == quote {
                formatted.push(self.dialect.escape_char);
            }
            formatted.push(c);
        }
        formatted.push(quote);
        formatted
    }
}
