use crate::ast::{CompareOp, ConditionNode, Value};
use crate::detection::detection::Detection;
use crate::error::SigmaError;

fn detection(yaml: &str) -> crate::error::Result<Detection> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    Detection::new(&value)
}

fn condition(yaml: &str) -> ConditionNode {
    let detection = detection(yaml).unwrap();
    assert_eq!(detection.conditions().len(), 1);
    detection.conditions()[0].clone()
}

fn eq(field: &str, value: &str) -> ConditionNode {
    ConditionNode::field_equals(field, value)
}

fn and(children: Vec<ConditionNode>) -> ConditionNode {
    ConditionNode::And(children)
}

fn or(children: Vec<ConditionNode>) -> ConditionNode {
    ConditionNode::Or(children)
}

#[test]
fn test_selection_mapping() {
    let node = condition(
        r#"
selection:
    Image|endswith: '\iexplore.exe'
    ImageLoaded|endswith: '\iertutil.dll'
condition: selection
"#,
    );

    assert_eq!(
        node,
        and(vec![
            eq("Image", r"*\iexplore.exe"),
            eq("ImageLoaded", r"*\iertutil.dll"),
        ])
    );
}

#[test]
fn test_single_item_collapses() {
    let node = condition(
        r#"
selection:
    EventID: 4625
condition: selection
"#,
    );

    assert_eq!(node, ConditionNode::field_equals("EventID", 4625i64));
}

#[test]
fn test_value_list() {
    let node = condition(
        r#"
selection:
    Image|startswith:
        - 'C:\Windows\'
        - 'C:\Temp\'
condition: selection
"#,
    );

    assert_eq!(
        node,
        or(vec![eq("Image", r"C:\Windows\*"), eq("Image", r"C:\Temp\*")])
    );
}

#[test]
fn test_all_modifier() {
    let node = condition(
        r#"
selection:
    CommandLine|contains|all:
        - '-enc'
        - 'hidden'
condition: selection
"#,
    );

    assert_eq!(
        node,
        and(vec![
            eq("CommandLine", "*-enc*"),
            eq("CommandLine", "*hidden*"),
        ])
    );
}

#[test]
fn test_list_of_mappings() {
    let node = condition(
        r#"
selection:
    - Image|endswith: '\cmd.exe'
    - OriginalFileName: 'Cmd.Exe'
condition: selection
"#,
    );

    assert_eq!(
        node,
        or(vec![
            eq("Image", r"*\cmd.exe"),
            eq("OriginalFileName", "Cmd.Exe"),
        ])
    );
}

#[test]
fn test_keywords() {
    let node = condition(
        r#"
keywords:
    - 'mimikatz'
    - 'sekurlsa'
condition: keywords
"#,
    );

    assert_eq!(
        node,
        or(vec![
            ConditionNode::keyword("mimikatz"),
            ConditionNode::keyword("sekurlsa"),
        ])
    );
}

#[test]
fn test_not() {
    let node = condition(
        r#"
selection:
    Image: 'a'
filter:
    User: 'SYSTEM'
condition: selection and not filter
"#,
    );

    assert_eq!(
        node,
        and(vec![eq("Image", "a"), ConditionNode::not(eq("User", "SYSTEM"))])
    );
}

#[test]
fn test_precedence_and_flattening() {
    let yaml = |condition: &str| {
        format!(
            r#"
a:
    f: '1'
b:
    f: '2'
c:
    f: '3'
condition: {}
"#,
            condition
        )
    };
    let (a, b, c) = (eq("f", "1"), eq("f", "2"), eq("f", "3"));

    assert_eq!(
        condition(&yaml("a or b or c")),
        or(vec![a.clone(), b.clone(), c.clone()])
    );
    assert_eq!(
        condition(&yaml("a or b and c")),
        or(vec![a.clone(), and(vec![b.clone(), c.clone()])])
    );
    assert_eq!(
        condition(&yaml("(a or b) and c")),
        and(vec![or(vec![a.clone(), b.clone()]), c.clone()])
    );
    assert_eq!(
        condition(&yaml("a and (b and c)")),
        and(vec![a.clone(), b.clone(), c.clone()])
    );
    assert_eq!(
        condition(&yaml("not (a or b)")),
        ConditionNode::not(or(vec![a, b]))
    );
}

#[test]
fn test_x_of() {
    let yaml = |condition: &str| {
        format!(
            r#"
selection_img:
    Image: 'a'
selection_cli:
    CommandLine: 'b'
_helper:
    User: 'c'
condition: {}
"#,
            condition
        )
    };
    let img = eq("Image", "a");
    let cli = eq("CommandLine", "b");
    let helper = eq("User", "c");

    assert_eq!(
        condition(&yaml("1 of selection_*")),
        or(vec![img.clone(), cli.clone()])
    );
    assert_eq!(
        condition(&yaml("any of selection_*")),
        or(vec![img.clone(), cli.clone()])
    );
    assert_eq!(
        condition(&yaml("all of them")),
        and(vec![img.clone(), cli.clone()])
    );
    assert_eq!(
        condition(&yaml("1 of selection_* and not _helper")),
        and(vec![or(vec![img, cli]), ConditionNode::not(helper)])
    );
}

#[test]
fn test_keyword_like_identifiers() {
    let node = condition(
        r#"
notepad:
    Image: 'notepad.exe'
order:
    Image: 'order.exe'
android:
    Image: 'android'
condition: notepad or order and not android
"#,
    );

    assert_eq!(
        node,
        or(vec![
            eq("Image", "notepad.exe"),
            and(vec![
                eq("Image", "order.exe"),
                ConditionNode::not(eq("Image", "android")),
            ]),
        ])
    );
}

#[test]
fn test_typed_modifiers() {
    let node = condition(
        r#"
selection:
    Image|re: '.*\\cmd\.exe'
    Count|gte: 5
    Parent|exists: true
    CommandLine: null
    SourceUser|fieldref: TargetUser
    Elevated: true
    Port|contains: 44
condition: selection
"#,
    );

    assert_eq!(
        node,
        and(vec![
            ConditionNode::field_equals("Image", Value::Regex(r".*\\cmd\.exe".to_string())),
            ConditionNode::compare("Count", CompareOp::Gte, 5),
            ConditionNode::exists("Parent", true),
            ConditionNode::null("CommandLine"),
            ConditionNode::field_equals("SourceUser", Value::FieldRef("TargetUser".to_string())),
            ConditionNode::field_equals("Elevated", true),
            eq("Port", "*44*"),
        ])
    );
}

#[test]
fn test_condition_list() {
    let detection = detection(
        r#"
a:
    f: '1'
b:
    f: '2'
timeframe: 5m
condition:
    - a
    - b
"#,
    )
    .unwrap();

    assert_eq!(detection.conditions(), &[eq("f", "1"), eq("f", "2")]);
}

#[test]
fn test_invalid_detections() {
    let unknown = detection(
        r#"
selection:
    f: '1'
condition: selection and filter
"#,
    );
    assert!(matches!(unknown, Err(SigmaError::Condition(_))));

    let missing = detection(
        r#"
selection:
    f: '1'
"#,
    );
    assert!(matches!(missing, Err(SigmaError::InvalidDetection(_))));

    let syntax = detection(
        r#"
selection:
    f: '1'
condition: selection and
"#,
    );
    assert!(matches!(syntax, Err(SigmaError::Condition(_))));

    let no_match = detection(
        r#"
selection:
    f: '1'
condition: 1 of filter_*
"#,
    );
    assert!(matches!(no_match, Err(SigmaError::Condition(_))));
}

#[test]
fn test_unsupported_constructs() {
    let two_of = detection(
        r#"
a:
    f: '1'
b:
    f: '2'
condition: 2 of them
"#,
    );
    assert!(matches!(two_of, Err(SigmaError::Unsupported(_))));

    let base64 = detection(
        r#"
selection:
    CommandLine|base64: 'whoami'
condition: selection
"#,
    );
    assert!(matches!(base64, Err(SigmaError::Unsupported(_))));

    let unknown = detection(
        r#"
selection:
    CommandLine|sometimes: 'whoami'
condition: selection
"#,
    );
    assert!(matches!(unknown, Err(SigmaError::InvalidModifier(_))));

    let flag = detection(
        r#"
selection:
    CommandLine|i: 'whoami'
condition: selection
"#,
    );
    assert!(matches!(flag, Err(SigmaError::InvalidModifier(_))));
}
