//! Derive-based CLI: one annotated struct drives the whole declaration.
//!
//! Try:
//!   cargo run --example derive_config -- --name svc --tags a,b --tags c
//!   cargo run --example derive_config -- --database.host db.local --database.port 5433
//!   cargo run --example derive_config -- --port 70000

use declargs::{CommandLine, Parser};

#[derive(Debug, Default, CommandLine)]
struct Database {
    #[cli(default = "localhost", desc = "database host")]
    host: String,
    #[cli(default = "5432", validators = "port()", desc = "database port")]
    port: u16,
}

#[derive(Debug, Default, CommandLine)]
struct Config {
    #[cli(short = "v", desc = "enable verbose output")]
    verbose: bool,
    #[cli(required, desc = "service name", validators = "identifier()")]
    name: String,
    #[cli(default = "8080", validators = "port()", desc = "listen port")]
    port: u16,
    #[cli(desc = "tags applied to the service")]
    tags: Vec<String>,
    #[cli(nested)]
    database: Database,
}

fn main() {
    let mut config = Config::default();
    let mut parser = Parser::new();

    if !parser.parse_into(&mut config, std::env::args().skip(1)) {
        for error in parser.localized_errors() {
            eprintln!("error: {error}");
        }
        std::process::exit(2);
    }

    println!("{config:#?}");
}
