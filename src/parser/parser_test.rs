use std::collections::HashMap;

use serde::Deserialize;

use super::*;

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Limits {
    connection_limit: u64,
    qps_limit: u64,
}

fn parser() -> Box<dyn ConfigParser> {
    Box::new(DefaultParser)
}

#[test]
fn json_payload_decodes_into_struct() {
    let mut limits = Limits::default();

    parser()
        .decode(ValueFormat::Json, r#"{"connection_limit": 100, "qps_limit": 50}"#, &mut limits)
        .unwrap();

    assert_eq!(
        limits,
        Limits {
            connection_limit: 100,
            qps_limit: 50
        }
    );
}

#[test]
fn yaml_payload_decodes_into_map() {
    let mut map: HashMap<String, Limits> = HashMap::new();
    let data = "Echo:\n  connection_limit: 1\n  qps_limit: 2\n";

    parser().decode(ValueFormat::Yaml, data, &mut map).unwrap();

    assert_eq!(map.len(), 1);
    assert_eq!(map["Echo"].qps_limit, 2);
}

#[test]
fn hcl_is_a_no_op() {
    let mut limits = Limits {
        connection_limit: 7,
        qps_limit: 8,
    };

    parser().decode(ValueFormat::Hcl, "connection_limit = 1", &mut limits).unwrap();

    assert_eq!(limits.connection_limit, 7);
    assert_eq!(limits.qps_limit, 8);
}

#[test]
fn malformed_payload_leaves_target_untouched() {
    let mut limits = Limits {
        connection_limit: 7,
        qps_limit: 8,
    };

    let result = parser().decode(ValueFormat::Json, r#"{"connection_limit": "#, &mut limits);

    assert!(matches!(result, Err(ParseError::Json(_))));
    assert_eq!(limits.connection_limit, 7);
}

#[test]
fn shape_mismatch_leaves_target_untouched() {
    let mut limits = Limits {
        connection_limit: 7,
        qps_limit: 8,
    };

    let result = parser().decode(ValueFormat::Json, r#"["not", "an", "object"]"#, &mut limits);

    assert!(result.is_err());
    assert_eq!(limits.qps_limit, 8);
}

#[test]
fn unsupported_format_name_is_rejected() {
    let mut limits = Limits::default();

    let result = decode_named(parser().as_ref(), "toml", "a = 1", &mut limits);

    assert!(matches!(result, Err(ParseError::UnsupportedFormat(ref f)) if f == "toml"));
}
