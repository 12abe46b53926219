//! Builder-based CLI: commands, scoped flags, validators, and execution.
//!
//! Try:
//!   cargo run --example server_cli -- --verbose server start --port 8080
//!   cargo run --example server_cli -- server strt
//!   cargo run --example server_cli -- --help

use declargs::{Argument, Command, Parser};

fn main() {
    let mut parser = Parser::new();

    parser
        .add_flag("verbose", Argument::standalone().short("v").description("enable verbose output"))
        .expect("declare verbose");

    parser
        .add_command(
            Command::new("server")
                .description("manage the server")
                .subcommand(Command::new("start").description("start listening").callback(
                    |p, cmd| {
                        let port = p.get_at("port", cmd.path()).unwrap_or("80");
                        println!("starting server on port {port}");
                        Ok(())
                    },
                ))
                .subcommand(Command::new("stop").description("stop the server").callback(
                    |_, _| {
                        println!("stopping server");
                        Ok(())
                    },
                )),
        )
        .expect("declare server");

    parser
        .add_flag_to(
            "port",
            Argument::single()
                .short("p")
                .description("listen port")
                .default_value("80")
                .validator(declargs::validate::port()),
            &["server start"],
        )
        .expect("declare port");

    let ok = parser.parse(std::env::args().skip(1));
    for warning in parser.warnings() {
        eprintln!("warning: {warning}");
    }
    if !ok {
        for error in parser.localized_errors() {
            eprintln!("error: {error}");
        }
        std::process::exit(2);
    }

    if parser.get_bool("verbose") {
        println!("verbose mode on");
    }
    let failures = parser.execute_commands();
    if failures > 0 {
        for (path, error) in parser.command_execution_errors() {
            eprintln!("{path}: {error}");
        }
        std::process::exit(1);
    }
}
