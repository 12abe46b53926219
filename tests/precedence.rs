//! Value source precedence: CLI, external defaults, environment, declared
//! default.

use std::collections::HashMap;
use std::rc::Rc;

use declargs::convert::to_screaming_snake_case;
use declargs::env::MapEnv;
use declargs::{Argument, Parser};

fn parser_with_env(env: MapEnv) -> Parser {
    let mut parser = Parser::new();
    parser.set_env_name_converter(Some(Rc::new(|name| to_screaming_snake_case(name))));
    parser.set_env_resolver(env);
    parser.add_flag("region", Argument::single().default_value("declared")).unwrap();
    parser
}

fn external() -> HashMap<String, String> {
    HashMap::from([("region".to_string(), "external".to_string())])
}

#[test]
fn test_cli_beats_everything() {
    let mut parser = parser_with_env(MapEnv::new().set("REGION", "env"));
    assert!(parser.parse_with_defaults(&external(), ["--region", "cli"]));
    assert_eq!(parser.get("region"), Some("cli"));
}

#[test]
fn test_external_beats_env_and_default() {
    let mut parser = parser_with_env(MapEnv::new().set("REGION", "env"));
    assert!(parser.parse_with_defaults(&external(), Vec::<String>::new()));
    assert_eq!(parser.get("region"), Some("external"));
}

#[test]
fn test_env_beats_declared_default() {
    let mut parser = parser_with_env(MapEnv::new().set("REGION", "env"));
    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.get("region"), Some("env"));
}

#[test]
fn test_declared_default_is_last() {
    let mut parser = parser_with_env(MapEnv::new());
    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.get("region"), Some("declared"));
}

#[test]
fn test_env_disabled_without_converter() {
    let mut parser = Parser::new();
    parser.set_env_resolver(MapEnv::new().set("REGION", "env"));
    parser.add_flag("region", Argument::single().default_value("declared")).unwrap();
    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.get("region"), Some("declared"));
}

#[test]
fn test_standalone_env_accepts_truthy_strings() {
    let mut parser = Parser::new();
    parser.set_env_name_converter(Some(Rc::new(|name| to_screaming_snake_case(name))));
    parser.set_env_resolver(MapEnv::new().set("VERBOSE", "yes").set("QUIET", "0"));
    parser.add_flag("verbose", Argument::standalone()).unwrap();
    parser.add_flag("quiet", Argument::standalone()).unwrap();
    assert!(parser.parse(Vec::<String>::new()));
    assert!(parser.get_bool("verbose"));
    assert!(!parser.get_bool("quiet"));
}

#[test]
fn test_env_values_run_through_validators() {
    let mut parser = Parser::new();
    parser.set_env_name_converter(Some(Rc::new(|name| to_screaming_snake_case(name))));
    parser.set_env_resolver(MapEnv::new().set("PORT", "70000"));
    parser
        .add_flag("port", Argument::single().validator(declargs::validate::port()))
        .unwrap();
    assert!(!parser.parse(Vec::<String>::new()));
    assert!(parser.errors()[0].has_key(declargs::error::keys::VALUE_BETWEEN));
}

#[test]
#[serial_test::serial]
fn test_process_env_resolver_reads_real_environment() {
    std::env::set_var("DECLARGS_TEST_REGION", "from-process");
    let mut parser = Parser::new();
    parser.set_env_name_converter(Some(Rc::new(|name| {
        format!("DECLARGS_TEST_{}", to_screaming_snake_case(name))
    })));
    parser.add_flag("region", Argument::single()).unwrap();
    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.get("region"), Some("from-process"));
    std::env::remove_var("DECLARGS_TEST_REGION");
}
