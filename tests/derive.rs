//! `#[derive(CommandLine)]`: declaration, nesting, command fields, slices,
//! and assignment back into the struct.

use std::time::Duration;

use declargs::error::keys;
use declargs::{CommandLine, Parser};

#[derive(Debug, Default, CommandLine)]
struct Basic {
    #[cli(short = "v", desc = "enable verbose output")]
    verbose: bool,
    #[cli(default = "8080", validators = "port()")]
    port: u16,
    #[cli(name = "output-file")]
    output: String,
    tags: Vec<String>,
    timeout: Duration,
}

#[test]
fn test_scalar_fields_bind_after_parse() {
    let mut config = Basic::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(
        &mut config,
        ["--verbose", "--output-file", "out.txt", "--tags", "a,b", "--tags", "c", "--timeout", "90s"],
    ));
    assert!(config.verbose);
    assert_eq!(config.port, 8080, "declared default applies");
    assert_eq!(config.output, "out.txt");
    assert_eq!(config.tags, vec!["a", "b", "c"]);
    assert_eq!(config.timeout, Duration::from_secs(90));
}

#[test]
fn test_field_names_convert_to_kebab_case() {
    #[derive(Debug, Default, CommandLine)]
    struct Names {
        max_retries: u32,
    }

    let mut config = Names::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["--max-retries", "5"]));
    assert_eq!(config.max_retries, 5);
}

#[test]
fn test_short_form_via_derive() {
    let mut config = Basic::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["-v"]));
    assert!(config.verbose);
}

#[test]
fn test_validator_attribute_rejects_bad_values() {
    let mut config = Basic::default();
    let mut parser = Parser::new();
    assert!(!parser.parse_into(&mut config, ["--port", "70000"]));
    assert!(parser.errors().iter().any(|e| e.has_key(keys::VALUE_BETWEEN)));
    // the rejected value never reaches the field; the default survives
    assert_eq!(config.port, 8080);
}

#[derive(Debug, Default, CommandLine)]
struct Address {
    city: String,
    #[cli(name = "zip")]
    zip_code: String,
}

#[derive(Debug, Default, CommandLine)]
struct WithNested {
    name: String,
    #[cli(nested)]
    address: Address,
    #[cli(nested)]
    fallback: Option<Address>,
    #[cli(nested, capacity = 2)]
    addresses: Vec<Address>,
}

#[test]
fn test_nested_struct_fields_use_dotted_names() {
    let mut config = WithNested::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(
        &mut config,
        ["--name", "ada", "--address.city", "london", "--address.zip", "nw1"],
    ));
    assert_eq!(config.address.city, "london");
    assert_eq!(config.address.zip_code, "nw1");
    assert!(config.fallback.is_none());
}

#[test]
fn test_optional_nested_materializes_when_set() {
    let mut config = WithNested::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["--fallback.city", "paris"]));
    let fallback = config.fallback.expect("set nested field materializes");
    assert_eq!(fallback.city, "paris");
}

#[test]
fn test_slice_of_structs_with_capacity() {
    let mut config = WithNested::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(
        &mut config,
        ["--addresses.0.city", "oslo", "--addresses.1.city", "bergen", "--addresses.1.zip", "5003"],
    ));
    assert_eq!(config.addresses.len(), 2);
    assert_eq!(config.addresses[0].city, "oslo");
    assert_eq!(config.addresses[1].city, "bergen");
    assert_eq!(config.addresses[1].zip_code, "5003");
}

#[test]
fn test_index_beyond_capacity_is_unknown_flag() {
    let mut config = WithNested::default();
    let mut parser = Parser::new();
    assert!(!parser.parse_into(&mut config, ["--addresses.2.city", "nowhere"]));
    let err = &parser.errors()[0];
    assert!(
        err.has_key(keys::UNKNOWN_FLAG) || err.has_key(keys::UNKNOWN_FLAG_WITH_SUGGESTIONS)
    );
}

#[derive(Debug, Default, CommandLine)]
struct StartCmd {
    #[cli(validators = "port()", default = "8080")]
    port: u16,
}

#[derive(Debug, Default, CommandLine)]
struct ServerCmd {
    #[cli(command, desc = "start the server")]
    start: StartCmd,
}

#[derive(Debug, Default, CommandLine)]
struct App {
    verbose: bool,
    #[cli(command, desc = "manage the server")]
    server: ServerCmd,
}

#[test]
fn test_command_fields_build_the_tree() {
    let mut config = App::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["--verbose", "server", "start", "--port", "9090"]));
    assert!(config.verbose);
    assert_eq!(config.server.start.port, 9090);
    assert_eq!(parser.scheduled_commands(), vec!["server start".to_string()]);
}

#[test]
fn test_command_field_callback_attaches_by_path() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let ran = Rc::new(RefCell::new(false));
    let ran_in_cb = ran.clone();

    let mut config = App::default();
    let mut parser = Parser::new();
    parser.declare_struct::<App>().unwrap();
    parser
        .set_command_callback("server start", move |_, _| {
            *ran_in_cb.borrow_mut() = true;
            Ok(())
        })
        .unwrap();
    assert!(parser.parse_into(&mut config, ["server", "start"]));
    assert_eq!(parser.execute_commands(), 0);
    assert!(*ran.borrow());
}

#[derive(Debug, Default, CommandLine)]
struct Copy {
    #[cli(pos = 0, required)]
    source: String,
    #[cli(pos = 1)]
    dest: String,
    #[cli(pos = 2, default = "default_value")]
    extra: String,
}

#[test]
fn test_positional_fields() {
    let mut config = Copy::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["src", "dst"]));
    assert_eq!(config.source, "src");
    assert_eq!(config.dest, "dst");
    assert_eq!(config.extra, "default_value");
}

#[derive(Debug, Default, CommandLine)]
struct Scoped {
    #[cli(path = "push,pull")]
    remote: String,
}

#[test]
fn test_explicit_path_attribute_scopes_flag() {
    let mut config = Scoped::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["push", "--remote", "origin"]));
    assert_eq!(config.remote, "origin");
    assert_eq!(parser.get_at("remote", "push"), Some("origin"));
    assert_eq!(parser.get_at("remote", "pull"), None);
}

#[derive(Debug, Default, CommandLine)]
struct WithIgnored {
    kept: String,
    #[cli(ignore)]
    runtime_only: String,
}

#[test]
fn test_ignored_fields_are_not_declared() {
    let mut config = WithIgnored::default();
    let mut parser = Parser::new();
    assert!(!parser.parse_into(&mut config, ["--runtime-only", "x"]));
    assert!(parser.errors()[0].has_key(keys::UNKNOWN_FLAG));
    assert!(config.runtime_only.is_empty());
}

#[derive(Debug, Default, CommandLine)]
struct Optionals {
    limit: Option<u32>,
}

#[test]
fn test_option_scalar_stays_none_when_unset() {
    let mut config = Optionals::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, Vec::<String>::new()));
    assert_eq!(config.limit, None);

    let mut config = Optionals::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["--limit", "10"]));
    assert_eq!(config.limit, Some(10));
}

#[test]
fn test_accepted_attribute() {
    #[derive(Debug, Default, CommandLine)]
    struct Ticketed {
        #[cli(accepted(pattern = "^[A-Z]+-[0-9]+$", desc = "a ticket id"))]
        ticket: String,
    }

    let mut config = Ticketed::default();
    let mut parser = Parser::new();
    assert!(parser.parse_into(&mut config, ["--ticket", "AB-12"]));
    assert_eq!(config.ticket, "AB-12");

    let mut config = Ticketed::default();
    let mut parser = Parser::new();
    assert!(!parser.parse_into(&mut config, ["--ticket", "nope"]));
    assert!(parser.errors()[0].has_key(keys::PATTERN_MATCH));
}
