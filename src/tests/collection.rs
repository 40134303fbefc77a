use crate::backend::MongoDbBackend;
use crate::collection::SigmaCollection;
use crate::error::SigmaError;
use crate::rule::{RuleType, SigmaRule, Status};

const IEXPLORE_RULE: &str = r#"
title: Suspicious iertutil.dll load by Internet Explorer
id: 16a9f2c4-7e6f-4a1b-9a53-1b5e8e0f1c21
status: test
logsource:
    category: image_load
    product: windows
detection:
    selection:
        data.Event.EventData.Image|endswith: '\iexplore.exe'
        data.Event.EventData.ImageLoaded|endswith: '\iertutil.dll'
    condition: selection
level: high
"#;

const LOGIN_RULES: &str = r#"
title: Failed logon
name: failed_login
logsource:
    product: windows
    service: security
detection:
    selection:
        EventID: 4625
    condition: selection
---
title: Successful logon
name: successful_login
logsource:
    product: windows
    service: security
detection:
    selection:
        EventID: 4624
    condition: selection
"#;

#[test]
fn test_parse_rule() {
    let collection: SigmaCollection = IEXPLORE_RULE.parse().unwrap();
    assert_eq!(collection.len(), 1);

    let rule = &collection.rules()[0];
    assert_eq!(rule.title, "Suspicious iertutil.dll load by Internet Explorer");
    assert_eq!(rule.status, Some(Status::Test));
    assert_eq!(rule.level.as_deref(), Some("high"));
    assert_eq!(rule.identifier(), Some("16a9f2c4-7e6f-4a1b-9a53-1b5e8e0f1c21"));

    let RuleType::Detection(detection) = &rule.rule else {
        panic!("expected a detection rule");
    };
    assert_eq!(detection.logsource.category.as_deref(), Some("image_load"));
    assert_eq!(detection.conditions().len(), 1);
}

#[test]
fn test_convert_detection() {
    let collection: SigmaCollection = IEXPLORE_RULE.parse().unwrap();
    let queries = MongoDbBackend::new().convert(&collection).unwrap();

    assert_eq!(
        queries,
        vec![
            r#"{ "$and": [ { "data.Event.EventData.Image": { "$regex": "\\\\iexplore\\.exe$" } }, { "data.Event.EventData.ImageLoaded": { "$regex": "\\\\iertutil\\.dll$" } } ] }"#
        ]
    );
}

#[test]
fn test_event_count_correlation() {
    let collection: SigmaCollection = format!(
        r#"{}
---
title: Many failed logons
correlation:
    type: event_count
    rules:
        - failed_login
    group-by:
        - User
    timespan: 10m
    condition:
        gte: 5
"#,
        LOGIN_RULES
    )
    .parse()
    .unwrap();
    assert_eq!(collection.len(), 3);

    let queries = MongoDbBackend::new().convert(&collection).unwrap();
    assert_eq!(
        queries,
        vec![
            r#"{ "EventID": 4624 }"#,
            r#"[ { "EventID": 4625 }, { "$group": { "_id": { "$dateTrunc": { "date": "$@timestamp", "unit": "minute" } }, "event_count": { "$sum": 1 } } }, User, { "$match": { "event_count": { $gte: 5 } } } ]"#,
        ]
    );
}

#[test]
fn test_generate_keeps_referenced_rules() {
    let collection: SigmaCollection = format!(
        r#"{}
---
title: Many failed logons
correlation:
    type: event_count
    rules:
        - failed_login
    timespan: 1h
    generate: true
    condition:
        gt: 10
"#,
        LOGIN_RULES
    )
    .parse()
    .unwrap();

    let queries = MongoDbBackend::new().convert(&collection).unwrap();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[0], r#"{ "EventID": 4625 }"#);
    assert_eq!(queries[1], r#"{ "EventID": 4624 }"#);
    assert!(queries[2].ends_with(r#"{ "$match": { "event_count": { $gt: 10 } } } ]"#));
}

#[test]
fn test_temporal_correlation() {
    let collection: SigmaCollection = format!(
        r#"{}
---
title: Failed then successful logon
correlation:
    type: temporal
    rules:
        - failed_login
        - successful_login
    group-by:
        - TargetUserName
    timespan: 30s
"#,
        LOGIN_RULES
    )
    .parse()
    .unwrap();

    let queries = MongoDbBackend::new().convert(&collection).unwrap();
    assert_eq!(
        queries,
        vec![concat!(
            r#"[ [ { { "EventID": 4625 } }, { { "EventID": 4624 } } ], "#,
            r#"{ "$addFields": { "event_type": { "$switch": { "branches": [{ "case": { "EventID": 4625 }, "then": "failed_login" }, { "case": { "EventID": 4624 }, "then": "successful_login" }] } } } }, "#,
            r#"{ "$group": { "_id": { "$dateTrunc": { "date": "$@timestamp", "unit": "second" } }, "event_type_count": { "$addToSet": "$event_type" } } }, TargetUserName, "#,
            r#"{ "$match": { "event_type_count": { $gte: 2 } } } ]"#,
        )]
    );
}

#[test]
fn test_unsupported_correlations() {
    let ordered: SigmaCollection = format!(
        r#"{}
---
title: Ordered logons
correlation:
    type: temporal_ordered
    rules:
        - failed_login
        - successful_login
    timespan: 1m
"#,
        LOGIN_RULES
    )
    .parse()
    .unwrap();
    assert!(matches!(
        MongoDbBackend::new().convert(&ordered),
        Err(SigmaError::Unsupported(_))
    ));

    let unknown: SigmaCollection = r#"
title: Dangling
correlation:
    type: event_count
    rules:
        - does_not_exist
    timespan: 1m
    condition:
        gte: 1
"#
    .parse()
    .unwrap();
    assert!(matches!(
        MongoDbBackend::new().convert(&unknown),
        Err(SigmaError::UnknownRuleRef(_))
    ));

    let no_field: SigmaCollection = format!(
        r#"{}
---
title: Distinct users
correlation:
    type: value_count
    rules:
        - failed_login
    timespan: 1m
    condition:
        gte: 3
"#,
        LOGIN_RULES
    )
    .parse()
    .unwrap();
    assert!(matches!(
        MongoDbBackend::new().convert(&no_field),
        Err(SigmaError::InvalidCorrelation(_))
    ));
}

#[test]
fn test_invalid_rules() {
    let no_logsource = r#"
title: No logsource
detection:
    selection:
        f: 1
    condition: selection
"#
    .parse::<SigmaCollection>();
    assert!(matches!(no_logsource, Err(SigmaError::Yaml(_))));

    let neither = r#"
title: Empty
logsource:
    product: windows
"#
    .parse::<SigmaCollection>();
    assert!(neither.is_err());

    let bad_condition = r#"
title: Bad condition
logsource:
    product: windows
detection:
    selection:
        f: 1
    condition: selection or
"#
    .parse::<SigmaCollection>();
    assert!(bad_condition.is_err());
}

#[test]
fn test_add_rules() {
    let mut collection = SigmaCollection::default();
    assert!(collection.is_empty());

    for document in LOGIN_RULES.split("---") {
        collection.add(serde_yaml::from_str::<SigmaRule>(document).unwrap());
    }
    assert_eq!(collection.len(), 2);
    assert_eq!(
        MongoDbBackend::new().convert(&collection).unwrap(),
        vec![r#"{ "EventID": 4625 }"#, r#"{ "EventID": 4624 }"#]
    );
}

#[test]
fn test_get_by_id_or_name() {
    let mut collection: SigmaCollection = LOGIN_RULES.parse().unwrap();
    collection.extend(IEXPLORE_RULE.parse().unwrap());

    assert_eq!(collection.len(), 3);
    assert_eq!(
        collection.get("successful_login").map(|r| r.title.as_str()),
        Some("Successful logon")
    );
    assert!(collection.get("16a9f2c4-7e6f-4a1b-9a53-1b5e8e0f1c21").is_some());
    assert!(collection.get("missing").is_none());
}
