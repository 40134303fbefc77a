//! Output templates.
//!
//! Every function takes already escaped and formatted parts and only fills
//! them into the literal shape downstream consumers expect, byte for byte.

/// `{ "<op>": [ a, b ] }`
pub fn group(op: &str, children: &[String], separator: &str) -> String {
    format!("{{ \"{}\": [ {} ] }}", op, children.join(separator))
}

/// `{ "field": "value" }`
pub fn string_eq(field: &str, value: &str) -> String {
    format!("{{ \"{}\": \"{}\" }}", field, value)
}

/// `{ "field": value }`
pub fn field_eq(field: &str, value: &str) -> String {
    format!("{{ \"{}\": {} }}", field, value)
}

/// `{ "field": { "$regex": "pattern" } }`
pub fn regex(field: &str, regex_token: &str, pattern: &str) -> String {
    format!(
        "{{ \"{}\": {{ \"{}\": \"{}\" }} }}",
        field, regex_token, pattern
    )
}

pub fn contains(field: &str, regex_token: &str, value: &str) -> String {
    regex(field, regex_token, value)
}

pub fn starts_with(field: &str, regex_token: &str, value: &str) -> String {
    regex(field, regex_token, &format!("^{}", value))
}

pub fn ends_with(field: &str, regex_token: &str, value: &str) -> String {
    regex(field, regex_token, &format!("{}$", value))
}

/// `{ "$text": { "$search": value } }`
pub fn keyword(value: &str) -> String {
    format!("{{ \"$text\": {{ \"$search\": {} }} }}", value)
}

/// `{ "field": { "$in": [ a, b ] } }`
pub fn in_list(field: &str, in_token: &str, values: &[String], separator: &str) -> String {
    format!(
        "{{ \"{}\": {{ \"{}\": [ {} ] }} }}",
        field,
        in_token,
        values.join(separator)
    )
}

/// `{ "field": { $op: value } }`
pub fn compare(field: &str, op: &str, value: &str) -> String {
    format!("{{ \"{}\": {{ {}: {} }} }}", field, op, value)
}

/// `{ field: { "$exists": false } }`
pub fn null(field: &str) -> String {
    exists(field, "false")
}

/// `{ field: { "$exists": <flag> } }`
pub fn exists(field: &str, flag: &str) -> String {
    format!("{{ {}: {{ \"$exists\": {} }} }}", field, flag)
}

/// `{ "$expr": { "$eq": ["$a", "$b"] } }`
pub fn field_ref(field: &str, other: &str) -> String {
    format!(
        "{{ \"$expr\": {{ \"$eq\": [\"${}\", \"${}\"] }} }}",
        field, other
    )
}

// correlation stages

/// `[ { q1 }, { q2 } ]`
pub fn multi_rule_search(queries: &[String]) -> String {
    let queries = queries
        .iter()
        .map(|query| format!("{{ {} }}", query))
        .collect::<Vec<_>>();
    format!("[ {} ]", queries.join(", "))
}

/// `{ "case": query, "then": "ruleid" }`
pub fn typing_branch(query: &str, rule_id: &str) -> String {
    format!("{{ \"case\": {}, \"then\": \"{}\" }}", query, rule_id)
}

pub fn typing(branches: &[String]) -> String {
    format!(
        "{{ \"$addFields\": {{ \"event_type\": {{ \"$switch\": {{ \"branches\": [{}] }} }} }} }}",
        branches.join(", ")
    )
}

/// Grouping stage keyed on the truncated `@timestamp`, `measure` being the
/// `"name": { ... }` accumulator and `groupby` the rendered suffix.
///
/// The suffix is placed after the closing brace of the stage, not inside
/// `_id`, to keep the pipeline layout existing consumers parse.
pub fn group_stage(unit: &str, measure: &str, groupby: &str) -> String {
    format!(
        "{{ \"$group\": {{ \"_id\": {{ \"$dateTrunc\": {{ \"date\": \"$@timestamp\", \"unit\": \"{}\" }} }}, {} }} }}{}",
        unit, measure, groupby
    )
}

/// `, host, user`, or nothing without fields.
pub fn groupby(fields: Option<&[String]>) -> String {
    fields
        .unwrap_or_default()
        .iter()
        .map(|field| format!(", {}", field))
        .collect()
}

/// `{ "$match": { "measure": { $op: count } } }`
pub fn match_stage(measure: &str, op: &str, count: u64) -> String {
    format!(
        "{{ \"$match\": {{ \"{}\": {{ {}: {} }} }} }}",
        measure, op, count
    )
}

/// `[ s1, s2, ... ]`
pub fn pipeline(stages: &[String]) -> String {
    format!("[ {} ]", stages.join(", "))
}
