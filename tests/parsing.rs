//! Flag parsing: long/short forms, `=` values, standalone semantics, POSIX
//! compact groups, and error recovery.

use declargs::error::keys;
use declargs::{Argument, Command, Parser};

fn server_registry() -> Parser {
    let mut parser = Parser::new();
    parser.add_flag("verbose", Argument::standalone().short("v")).unwrap();
    parser
        .add_command(Command::new("server").subcommand(Command::new("start").callback(|_, _| Ok(()))))
        .unwrap();
    parser
        .add_flag_to(
            "port",
            Argument::single().validator(declargs::validate::range(1.0, 65535.0)),
            &["server start"],
        )
        .unwrap();
    parser
}

#[test]
fn test_scoped_flag_with_command_line() {
    // spec scenario: --verbose server start --port 8080
    let mut parser = server_registry();
    assert!(parser.parse(["--verbose", "server", "start", "--port", "8080"]));
    assert!(parser.get_bool("verbose"));
    assert_eq!(parser.get_at("port", "server start"), Some("8080"));
    assert_eq!(parser.scheduled_commands(), vec!["server start".to_string()]);
}

#[test]
fn test_equals_form_and_next_token_form() {
    let mut parser = Parser::new();
    parser.add_flag("output", Argument::single()).unwrap();
    assert!(parser.parse(["--output=file.txt"]));
    assert_eq!(parser.get("output"), Some("file.txt"));

    let mut parser = Parser::new();
    parser.add_flag("output", Argument::single()).unwrap();
    assert!(parser.parse(["--output", "file.txt"]));
    assert_eq!(parser.get("output"), Some("file.txt"));
}

#[test]
fn test_equals_form_preserves_whitespace_until_prefilter() {
    let mut parser = Parser::new();
    parser
        .add_flag("msg", Argument::single().pre_filter(|v| v.trim().to_string()))
        .unwrap();
    assert!(parser.parse(["--msg=  hello  "]));
    assert_eq!(parser.get("msg"), Some("hello"));

    // without the filter the padding survives
    let mut parser = Parser::new();
    parser.add_flag("msg", Argument::single()).unwrap();
    assert!(parser.parse(["--msg=  hello  "]));
    assert_eq!(parser.get("msg"), Some("  hello  "));
}

#[test]
fn test_short_form_lookup() {
    let mut parser = Parser::new();
    parser.add_flag("verbose", Argument::standalone().short("v")).unwrap();
    assert!(parser.parse(["-v"]));
    assert!(parser.get_bool("verbose"));
}

#[test]
fn test_standalone_consumes_boolean_literal_only() {
    let mut parser = Parser::new();
    parser.add_flag("debug", Argument::standalone()).unwrap();
    parser.add_flag("name", Argument::single().position(0)).unwrap();
    assert!(parser.parse(["--debug", "false", "positional"]));
    assert!(!parser.get_bool("debug"));
    assert_eq!(parser.get("name"), Some("positional"));
}

#[test]
fn test_standalone_invalid_inline_value_demotes_to_positional() {
    let mut parser = Parser::new();
    parser.add_flag("debug", Argument::standalone()).unwrap();
    parser.add_flag("target", Argument::single().position(0)).unwrap();
    assert!(parser.parse(["--debug=banana"]));
    // the flag stays unset and the value became a positional
    assert!(!parser.get_bool("debug"));
    assert_eq!(parser.get("target"), Some("banana"));
}

#[test]
fn test_missing_value_is_an_error() {
    let mut parser = Parser::new();
    parser.add_flag("output", Argument::single()).unwrap();
    assert!(!parser.parse(["--output"]));
    assert!(parser.errors()[0].has_key(keys::MISSING_VALUE));
}

#[test]
fn test_missing_value_with_default_applies_default() {
    let mut parser = Parser::new();
    parser.add_flag("output", Argument::single().default_value("out.txt")).unwrap();
    parser.add_flag("verbose", Argument::standalone()).unwrap();
    assert!(parser.parse(["--output", "--verbose"]));
    assert_eq!(parser.get("output"), Some("out.txt"));
    assert!(parser.get_bool("verbose"));
}

#[test]
fn test_repeated_single_flag_last_wins() {
    let mut parser = Parser::new();
    parser.add_flag("level", Argument::single()).unwrap();
    assert!(parser.parse(["--level", "1", "--level", "2"]));
    assert_eq!(parser.get("level"), Some("2"));
}

#[test]
fn test_unknown_flag_produces_exactly_one_error() {
    let mut parser = Parser::new();
    parser.add_flag("verbose", Argument::standalone()).unwrap();
    assert!(!parser.parse(["--nonsense"]));
    assert_eq!(parser.errors().len(), 1);
    assert!(parser.errors()[0].has_key(keys::UNKNOWN_FLAG));
}

#[test]
fn test_unknown_flag_close_to_declared_gets_suggestions() {
    let mut parser = Parser::new();
    parser.add_flag("verbose", Argument::standalone()).unwrap();
    assert!(!parser.parse(["--verbos"]));
    assert_eq!(parser.errors().len(), 1);
    let err = &parser.errors()[0];
    assert!(err.has_key(keys::UNKNOWN_FLAG_WITH_SUGGESTIONS));
    assert!(err.to_string().contains("--verbose"));
}

#[test]
fn test_posix_compact_group() {
    let mut parser = Parser::new();
    parser.set_posix(true);
    parser.add_flag("all", Argument::standalone().short("a")).unwrap();
    parser.add_flag("brief", Argument::standalone().short("b")).unwrap();
    parser.add_flag("count", Argument::single().short("c")).unwrap();
    assert!(parser.parse(["-abc23"]));
    assert!(parser.get_bool("all"));
    assert!(parser.get_bool("brief"));
    assert_eq!(parser.get("count"), Some("23"));
}

#[test]
fn test_posix_compact_value_from_next_token() {
    let mut parser = Parser::new();
    parser.set_posix(true);
    parser.add_flag("all", Argument::standalone().short("a")).unwrap();
    parser.add_flag("count", Argument::single().short("c")).unwrap();
    assert!(parser.parse(["-ac", "7"]));
    assert!(parser.get_bool("all"));
    assert_eq!(parser.get("count"), Some("7"));
}

#[test]
fn test_posix_rejects_multi_grapheme_short_form() {
    let mut parser = Parser::new();
    parser.set_posix(true);
    let err = parser.add_flag("verbose", Argument::standalone().short("vv")).unwrap_err();
    assert!(err.has_key(keys::POSIX_SHORT_FORM));
}

#[test]
fn test_duplicate_flag_rejected_at_declaration() {
    let mut parser = Parser::new();
    parser.add_flag("verbose", Argument::standalone()).unwrap();
    let err = parser.add_flag("verbose", Argument::standalone()).unwrap_err();
    assert!(err.has_key(keys::DUPLICATE_FLAG));
}

#[test]
fn test_validator_rejects_but_parse_continues() {
    let mut parser = server_registry();
    parser.add_flag("tag", Argument::single()).unwrap();
    // port out of range is recorded, the later flag still parses
    assert!(!parser.parse(["server", "start", "--port", "70000", "--tag", "x"]));
    assert!(parser.errors()[0].has_key(keys::VALUE_BETWEEN));
    assert_eq!(parser.get("tag"), Some("x"));
    assert_eq!(parser.get_at("port", "server start"), None);
}

#[test]
fn test_scoped_required_flag_only_enforced_when_command_appears() {
    let mut parser = Parser::new();
    parser
        .add_flag_to("token", Argument::single().required(true), &["deploy"])
        .unwrap();
    assert!(parser.parse(Vec::<String>::new()));

    let mut parser = Parser::new();
    parser
        .add_flag_to("token", Argument::single().required(true), &["deploy"])
        .unwrap();
    assert!(!parser.parse(["deploy"]));
    assert!(parser.errors()[0].has_key(keys::REQUIRED_FLAG));
}

#[test]
fn test_naming_convention_warning() {
    let mut parser = Parser::new();
    parser.add_flag("Output_File", Argument::single()).unwrap();
    assert!(parser.parse(Vec::<String>::new()));
    assert!(parser.warnings().iter().any(|w| w.contains("Output_File")));
}

#[test]
fn test_rename_flag_keeps_declaration() {
    let mut parser = Parser::new();
    parser.add_flag("color", Argument::single().default_value("auto")).unwrap();
    parser.rename_flag("color", "", "colour").unwrap();
    assert!(parser.parse(["--colour", "red"]));
    assert_eq!(parser.get("colour"), Some("red"));
    assert!(parser.get("color").is_none());
}

#[test]
fn test_set_argument_updates_declaration() {
    let mut parser = Parser::new();
    parser.add_flag("level", Argument::single()).unwrap();
    parser
        .set_argument("level", "", |arg| {
            let updated = std::mem::take(arg).default_value("info");
            *arg = updated;
        })
        .unwrap();
    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.get("level"), Some("info"));
}

#[test]
fn test_typed_getters() {
    let mut parser = Parser::new();
    parser.add_flag("port", Argument::single()).unwrap();
    parser.add_flag("ratio", Argument::single()).unwrap();
    assert!(parser.parse(["--port", "8080", "--ratio", "0.5"]));
    assert_eq!(parser.get_as::<u16>("port").unwrap(), Some(8080));
    assert_eq!(parser.get_as::<f64>("ratio").unwrap(), Some(0.5));
    assert_eq!(parser.get_as::<u16>("missing").unwrap(), None);
    let err = parser.get_as::<u16>("ratio").unwrap_err();
    assert!(err.has_key(keys::INVALID_INTEGER));
}

#[test]
fn test_custom_prefixes() {
    let mut parser = Parser::new();
    parser.settings_mut().prefixes = vec!["/".to_string()];
    parser.add_flag("verbose", Argument::standalone()).unwrap();
    assert!(parser.parse(["/verbose"]));
    assert!(parser.get_bool("verbose"));
}
