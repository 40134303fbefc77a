use super::MongoDbBackend;

impl MongoDbBackend {
    /// Escapes literal text for a JSON string, or for a regular expression
    /// inside a JSON string when `for_regex` is set.
    ///
    /// An input backslash becomes `\\` (plain) or `\\\\` (regex); regex
    /// metacharacters gain an escaping backslash, itself emitted as `\\`.
    /// The string quote is always emitted as `\"`.
    pub fn escape(&self, text: &str, for_regex: bool) -> String {
        let esc = self.dialect.escape_char;
        let mut escaped = String::with_capacity(text.len() * 2);

        for c in text.chars() {
            if c == esc {
                let n = if for_regex { 4 } else { 2 };
                escaped.extend(std::iter::repeat(esc).take(n));
            } else if c == self.dialect.str_quote {
                escaped.push(esc);
                escaped.push(c);
            } else if for_regex && self.dialect.re_special.contains(c) {
                escaped.push(esc);
                escaped.push(esc);
                escaped.push(c);
            } else {
                escaped.push(c);
            }
        }
        escaped
    }
}
