//! Command resolution, terminal scheduling order, repeated commands,
//! exec-on-parse, and declaration merging.

use std::cell::RefCell;
use std::rc::Rc;

use declargs::error::keys;
use declargs::{Argument, Command, Parser};

fn recording_command(name: &str, log: Rc<RefCell<Vec<String>>>) -> Command {
    let path_log = log;
    Command::new(name).callback(move |_, cmd| {
        path_log.borrow_mut().push(cmd.path().to_string());
        Ok(())
    })
}

#[test]
fn test_unknown_subcommand_reports_path_and_suggestion() {
    // spec scenario: ["server", "strt"]
    let mut parser = Parser::new();
    parser
        .add_command(Command::new("server").subcommand(Command::new("start").callback(|_, _| Ok(()))))
        .unwrap();
    assert!(!parser.parse(["server", "strt"]));
    assert_eq!(parser.errors().len(), 1);
    let err = &parser.errors()[0];
    assert!(err.has_key(keys::UNKNOWN_COMMAND));
    let text = err.to_string();
    assert!(text.contains("server strt"));
    assert!(text.contains("start"));
}

#[test]
fn test_terminal_scheduling_is_fifo_across_the_line() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut parser = Parser::new();
    parser
        .add_command(
            Command::new("service")
                .subcommand(recording_command("start", log.clone()))
                .subcommand(recording_command("stop", log.clone())),
        )
        .unwrap();

    assert!(parser.parse(["service", "start", "service", "stop", "service", "start"]));
    assert_eq!(parser.scheduled_commands(), vec![
        "service start".to_string(),
        "service stop".to_string(),
        "service start".to_string(),
    ]);
    assert_eq!(parser.execute_commands(), 0);
    assert_eq!(*log.borrow(), vec![
        "service start".to_string(),
        "service stop".to_string(),
        "service start".to_string(),
    ]);
}

#[test]
fn test_repeated_command_sees_latest_option_values() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in_cb = seen.clone();
    let mut parser = Parser::new();
    parser.settings_mut().exec_on_parse = true;
    parser
        .add_command(Command::new("echo").callback(move |p, _| {
            seen_in_cb.borrow_mut().push(p.get_at("msg", "echo").unwrap_or("").to_string());
            Ok(())
        }))
        .unwrap();
    parser.add_flag_to("msg", Argument::single(), &["echo"]).unwrap();

    assert!(parser.parse(["echo", "--msg", "first", "echo", "--msg", "second"]));
    assert_eq!(*seen.borrow(), vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn test_exec_on_parse_runs_during_parse() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut parser = Parser::new();
    parser.set_exec_on_parse(true);
    parser
        .add_command(Command::new("service").subcommand(recording_command("start", log.clone())))
        .unwrap();
    assert!(parser.parse(["service", "start"]));
    assert_eq!(*log.borrow(), vec!["service start".to_string()]);
    // nothing left to execute
    assert!(parser.scheduled_commands().is_empty());
}

#[test]
fn test_exec_on_parse_failure_halts_and_wraps() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_in_cb = log.clone();
    let mut parser = Parser::new();
    parser.set_exec_on_parse(true);
    parser
        .add_command(
            Command::new("boom").callback(|_, _| Err(anyhow::anyhow!("exploded"))),
        )
        .unwrap();
    parser
        .add_command(Command::new("after").callback(move |_, cmd| {
            log_in_cb.borrow_mut().push(cmd.path().to_string());
            Ok(())
        }))
        .unwrap();

    assert!(!parser.parse(["boom", "after"]));
    assert!(parser.errors()[0].has_key(keys::PROCESSING_COMMAND));
    assert!(parser.errors()[0].to_string().contains("exploded"));
    // parsing halted: the later command never ran
    assert!(log.borrow().is_empty());
}

#[test]
fn test_per_command_exec_on_parse_flag() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_in_cb = log.clone();
    let mut parser = Parser::new();
    parser
        .add_command(
            Command::new("now")
                .exec_on_parse(true)
                .callback(move |_, cmd| {
                    log_in_cb.borrow_mut().push(cmd.path().to_string());
                    Ok(())
                }),
        )
        .unwrap();
    assert!(parser.parse(["now"]));
    assert_eq!(*log.borrow(), vec!["now".to_string()]);
}

#[test]
fn test_bare_parent_with_subcommands_schedules_but_cannot_execute() {
    let mut parser = Parser::new();
    parser
        .add_command(Command::new("server").subcommand(Command::new("start").callback(|_, _| Ok(()))))
        .unwrap();
    assert!(parser.parse(["server"]));
    assert_eq!(parser.scheduled_commands(), vec!["server".to_string()]);
    assert_eq!(parser.execute_commands(), 1);
    let err = parser.command_execution_error("server").unwrap();
    assert!(err.has_key(keys::COMMAND_NOT_FOUND));
}

#[test]
fn test_redeclaring_path_preserves_existing_metadata() {
    // regression: attaching a deeper child must not wipe callback or
    // description of the existing node
    let ran = Rc::new(RefCell::new(false));
    let ran_in_cb = ran.clone();
    let mut parser = Parser::new();
    parser
        .add_command(Command::new("server").description("run the server").callback(move |_, _| {
            *ran_in_cb.borrow_mut() = true;
            Ok(())
        }))
        .unwrap();
    // a later scoped flag declaration rebuilds the chain
    parser.add_flag_to("port", Argument::single(), &["server status"]).unwrap();

    assert!(parser.parse(["server"]));
    assert_eq!(parser.execute_commands(), 0);
    assert!(*ran.borrow());
}

#[test]
fn test_ambiguous_command_is_reported() {
    use declargs::MessageBundle;

    let mut parser = Parser::new();
    parser
        .add_command(Command::new("status").name_key("cmd.status").callback(|_, _| Ok(())))
        .unwrap();
    parser.add_command(Command::new("info").callback(|_, _| Ok(()))).unwrap();
    // the status command's translated name collides with the info command
    let mut bundle = MessageBundle::new();
    bundle.add_message("en", "cmd.status", "info");
    parser.set_user_bundle(bundle);

    assert!(!parser.parse(["info"]));
    assert!(parser.errors()[0].has_key(keys::AMBIGUOUS_COMMAND));
}
