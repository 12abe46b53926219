//! Accepted patterns, validator ordering, filters, file-typed flags, and
//! secure prompts.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use declargs::error::keys;
use declargs::input::FixedTerminal;
use declargs::{Argument, Parser};

#[test]
fn test_ticket_regex_acceptance() {
    // spec scenario: regex(^[A-Z]{2,4}-[0-9]{3,5}$)
    for (input, ok) in [("AB-123", true), ("ABCD-12345", true), ("A-123", false), ("ab-123", false)]
    {
        let mut parser = Parser::new();
        parser
            .add_flag(
                "ticket",
                Argument::single()
                    .validators(declargs::validate::parse_validators(
                        "regex(^[A-Z]{2,4}-[0-9]{3,5}$)",
                    )
                    .unwrap()),
            )
            .unwrap();
        assert_eq!(parser.parse(["--ticket", input]), ok, "input {input}");
    }
}

#[test]
fn test_pipeline_order_pre_accepted_validators_post() {
    // P7: pre-filter -> accepted patterns -> validators -> post-filter
    let trace = Rc::new(RefCell::new(Vec::new()));
    let t1 = trace.clone();
    let t2 = trace.clone();
    let t3 = trace.clone();

    let mut parser = Parser::new();
    parser
        .add_flag(
            "name",
            Argument::single()
                .pre_filter(move |v| {
                    t1.borrow_mut().push("pre");
                    v.trim().to_string()
                })
                .accepted("^[a-z]+$", "lowercase letters")
                .validator(declargs::validate::custom(move |_| {
                    t2.borrow_mut().push("validate");
                    Ok(())
                }))
                .post_filter(move |v| {
                    t3.borrow_mut().push("post");
                    v.to_uppercase()
                }),
        )
        .unwrap();

    assert!(parser.parse(["--name=  hello  "]));
    // the accepted pattern saw the pre-filtered value, and the stored value
    // is post-filtered
    assert_eq!(parser.get("name"), Some("HELLO"));
    assert_eq!(*trace.borrow(), vec!["pre", "validate", "post"]);
}

#[test]
fn test_accepted_pattern_failure_skips_validators() {
    let ran = Rc::new(RefCell::new(false));
    let ran_in_validator = ran.clone();
    let mut parser = Parser::new();
    parser
        .add_flag(
            "code",
            Argument::single()
                .accepted("^[0-9]+$", "digits only")
                .validator(declargs::validate::custom(move |_| {
                    *ran_in_validator.borrow_mut() = true;
                    Ok(())
                })),
        )
        .unwrap();
    assert!(!parser.parse(["--code", "abc"]));
    let err = &parser.errors()[0];
    assert!(err.has_key(keys::PATTERN_MATCH));
    assert!(err.to_string().contains("digits only"));
    assert!(!*ran.borrow());
}

#[test]
fn test_any_of_multiple_accepted_patterns() {
    let mut parser = Parser::new();
    parser
        .add_flag(
            "id",
            Argument::single()
                .accepted("^[0-9]+$", "numeric id")
                .accepted("^[A-Z]{3}$", "three-letter code"),
        )
        .unwrap();
    assert!(parser.parse(["--id", "ABC"]));
    assert_eq!(parser.get("id"), Some("ABC"));
}

#[test]
fn test_add_flag_validators_after_declaration() {
    let mut parser = Parser::new();
    parser.add_flag("port", Argument::single()).unwrap();
    parser
        .add_flag_validators("port", "", vec![declargs::validate::port()])
        .unwrap();
    assert!(!parser.parse(["--port", "0"]));
    assert!(parser.errors()[0].has_key(keys::VALUE_BETWEEN));
}

#[test]
fn test_file_flag_reads_contents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "contents-from-disk").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let mut parser = Parser::new();
    parser.add_flag("config", Argument::file()).unwrap();
    assert!(parser.parse(["--config", &path]));
    assert_eq!(parser.get("config"), Some("contents-from-disk"));
}

#[test]
fn test_file_flag_contents_run_through_validators() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not-a-number").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let mut parser = Parser::new();
    parser
        .add_flag("count", Argument::file().validator(declargs::validate::integer()))
        .unwrap();
    assert!(!parser.parse(["--count", &path]));
    assert!(parser.errors()[0].has_key(keys::INVALID_INTEGER));
}

#[test]
fn test_missing_file_is_an_error() {
    let mut parser = Parser::new();
    parser.add_flag("config", Argument::file()).unwrap();
    assert!(!parser.parse(["--config", "/definitely/not/here.txt"]));
    assert!(parser.errors()[0].has_key(keys::PROCESSING_FIELD));
}

#[test]
fn test_secure_flag_reads_from_terminal() {
    let mut parser = Parser::new();
    parser.set_terminal_reader(FixedTerminal::new("hunter2"));
    parser
        .add_flag("password", Argument::single().secure(Some("Password: ".to_string())))
        .unwrap();
    assert!(parser.parse(["--password"]));
    assert_eq!(parser.get("password"), Some("hunter2"));
}

#[test]
fn test_secure_flag_ignores_inline_value() {
    let mut parser = Parser::new();
    parser.set_terminal_reader(FixedTerminal::new("real-secret"));
    parser.add_flag("password", Argument::single().secure(None)).unwrap();
    assert!(parser.parse(["--password=typed-on-line"]));
    assert_eq!(parser.get("password"), Some("real-secret"));
    assert!(!parser.warnings().is_empty());
}

#[test]
fn test_secure_value_runs_through_validators() {
    let mut parser = Parser::new();
    parser.set_terminal_reader(FixedTerminal::new("short"));
    parser
        .add_flag(
            "password",
            Argument::single().secure(None).validator(declargs::validate::min_length(8)),
        )
        .unwrap();
    assert!(!parser.parse(["--password"]));
    assert!(parser.errors()[0].has_key(keys::MIN_LENGTH));
}

#[test]
fn test_required_if_predicate() {
    let mut parser = Parser::new();
    parser.add_flag("format", Argument::single()).unwrap();
    parser
        .add_flag(
            "output",
            Argument::single().required_if(|p| p.get("format") == Some("json")),
        )
        .unwrap();

    assert!(!parser.parse(["--format", "json"]));
    assert!(parser.errors()[0].has_key(keys::REQUIRED_FLAG));

    let mut parser = Parser::new();
    parser.add_flag("format", Argument::single()).unwrap();
    parser
        .add_flag(
            "output",
            Argument::single().required_if(|p| p.get("format") == Some("json")),
        )
        .unwrap();
    assert!(parser.parse(["--format", "text"]));
}

#[test]
fn test_dependency_mismatch_is_a_warning_not_error() {
    let mut parser = Parser::new();
    parser.add_flag("format", Argument::single()).unwrap();
    parser
        .add_flag(
            "compress",
            Argument::standalone().depends_on("format", vec!["json", "binary"]),
        )
        .unwrap();

    assert!(parser.parse(["--compress", "--format", "text"]));
    assert!(parser.errors().is_empty());
    assert_eq!(parser.warnings().len(), 1);
    assert!(parser.warnings()[0].contains("format"));
}

#[test]
fn test_dependency_any_value_satisfied() {
    let mut parser = Parser::new();
    parser.add_flag("format", Argument::single()).unwrap();
    parser
        .add_flag("compress", Argument::standalone().depends_on::<String>("format", vec![]))
        .unwrap();
    assert!(parser.parse(["--compress", "--format", "anything"]));
    assert!(parser.warnings().is_empty());
}

#[test]
fn test_circular_dependency_detected() {
    let mut parser = Parser::new();
    parser
        .add_flag("a", Argument::standalone().depends_on::<String>("b", vec![]))
        .unwrap();
    parser
        .add_flag("b", Argument::standalone().depends_on::<String>("a", vec![]))
        .unwrap();
    assert!(!parser.parse(["--a"]));
    assert!(parser.errors().iter().any(|e| e.has_key(keys::CIRCULAR_DEPENDENCY)));
}
