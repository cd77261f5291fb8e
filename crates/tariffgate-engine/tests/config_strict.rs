#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tariffgate_engine::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
control:
  listen: "127.0.0.1:8081"
policy:
  rulez: [] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.control.listen, "127.0.0.1:8081");
    assert!(cfg.policy.rules.is_empty());
    assert!(cfg.geo.prefixes.is_empty());
}

#[test]
fn wrong_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn full_config_parses() {
    let ok = r#"
version: 1
control:
  listen: "0.0.0.0:9000"
policy:
  rules_file: "/tmp/tariffs.json"
  autosave: true
  rules:
    - { country_code: "cn", rate: 1.0, dropped: false }
    - { country_code: "YY", dropped: true }
geo:
  prefixes:
    - { prefix: "203.0.113.0/24", country: "XX" }
    - { prefix: "2001:db8::/32", country: "YY" }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.control.listen_addr().unwrap().port(), 9000);
    assert_eq!(cfg.policy.rules[0].country_code.as_str(), "CN");
    assert!(cfg.policy.rules[1].dropped);
    assert_eq!(cfg.geo.prefixes.len(), 2);
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        "version: 1\ncontrol:\n  listen: \"not-an-addr\"\n",
        "version: 1\npolicy:\n  autosave: true\n",
        "version: 1\npolicy:\n  rules:\n    - { country_code: \"XX\", rate: -1 }\n",
        "version: 1\npolicy:\n  rules:\n    - { country_code: \"XXX\", rate: 1 }\n",
        "version: 1\ngeo:\n  prefixes:\n    - { prefix: \"10.0.0.0/40\", country: \"XX\" }\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err("must fail");
        assert_eq!(err.code().as_str(), "BAD_REQUEST", "case={c}");
    }
}
