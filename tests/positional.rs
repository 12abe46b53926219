//! Positional-slot assignment, gap defaults, and required positionals.

use declargs::error::keys;
use declargs::{Argument, Parser};

fn copy_parser() -> Parser {
    let mut parser = Parser::new();
    parser.add_flag("source", Argument::single().position(0).required(true)).unwrap();
    parser.add_flag("dest", Argument::single().position(1)).unwrap();
    parser
        .add_flag("optional", Argument::single().position(2).default_value("default_value"))
        .unwrap();
    parser
}

#[test]
fn test_slots_fill_in_position_order_with_gap_defaults() {
    // spec scenario: ["src", "dest"] with three declared slots
    let mut parser = copy_parser();
    assert!(parser.parse(["src", "dest"]));
    assert_eq!(parser.get("source"), Some("src"));
    assert_eq!(parser.get("dest"), Some("dest"));
    assert_eq!(parser.get("optional"), Some("default_value"));

    let positions: Vec<usize> = parser.positional_args().iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(
        parser.positional_args()[2].flag.as_deref(),
        Some("optional")
    );
    assert_eq!(parser.positional_args()[2].value, "default_value");
}

#[test]
fn test_missing_required_positional() {
    let mut parser = copy_parser();
    assert!(!parser.parse(Vec::<String>::new()));
    let err = &parser.errors()[0];
    assert!(err.has_key(keys::REQUIRED_POSITIONAL_FLAG));
    assert!(err.to_string().contains("source"));
}

#[test]
fn test_flags_interleave_with_positionals() {
    let mut parser = copy_parser();
    parser.add_flag("verbose", Argument::standalone()).unwrap();
    assert!(parser.parse(["src", "--verbose", "dest"]));
    assert_eq!(parser.get("source"), Some("src"));
    assert_eq!(parser.get("dest"), Some("dest"));
    assert!(parser.get_bool("verbose"));
}

#[test]
fn test_surplus_tokens_stay_positional() {
    let mut parser = copy_parser();
    assert!(parser.parse(["a", "b", "c", "extra"]));
    let args = parser.positional_args();
    assert_eq!(args.len(), 4);
    assert_eq!(args[3].value, "extra");
    assert_eq!(args[3].flag, None);
    assert_eq!(args[3].position, 3);
}

#[test]
fn test_positional_values_run_through_validators() {
    let mut parser = Parser::new();
    parser
        .add_flag(
            "count",
            Argument::single().position(0).validator(declargs::validate::integer()),
        )
        .unwrap();
    assert!(!parser.parse(["notanumber"]));
    assert!(parser.errors()[0].has_key(keys::INVALID_INTEGER));
}

#[test]
fn test_positionals_coexist_with_commands() {
    use declargs::Command;
    let mut parser = Parser::new();
    parser.add_flag("target", Argument::single().position(0)).unwrap();
    parser.add_command(Command::new("build").callback(|_, _| Ok(()))).unwrap();
    // the declared slot takes the first bare token; the command still parses
    assert!(parser.parse(["thing", "build"]));
    assert_eq!(parser.get("target"), Some("thing"));
    assert_eq!(parser.scheduled_commands(), vec!["build".to_string()]);
}
