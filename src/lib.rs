//! # declargs - declarative command-line parsing and dispatch
//!
//! One declaration drives everything: parsing, validation, help, shell
//! completion, and i18n. Flags and commands are declared either through the
//! builder API or by deriving [`CommandLine`] on a configuration struct;
//! the parser then consumes an argument vector, populates the struct,
//! validates constraints, and schedules command callbacks in the order
//! their terminal occurrences appeared on the line.
//!
//! ## Quick start
//!
//! ```rust
//! use declargs::{Argument, Command, Parser};
//!
//! let mut parser = Parser::new();
//! parser.add_flag("verbose", Argument::standalone().short("v")).unwrap();
//! parser
//!     .add_command(
//!         Command::new("server").subcommand(Command::new("start").callback(|p, _| {
//!             println!("starting on port {}", p.get_at("port", "server start").unwrap_or("80"));
//!             Ok(())
//!         })),
//!     )
//!     .unwrap();
//! parser
//!     .add_flag_to("port", Argument::single().default_value("80"), &["server start"])
//!     .unwrap();
//!
//! assert!(parser.parse(["--verbose", "server", "start", "--port", "8080"]));
//! assert!(parser.get_bool("verbose"));
//! assert_eq!(parser.execute_commands(), 0);
//! ```
//!
//! ## Derived declarations
//!
//! ```rust,ignore
//! use declargs::{CommandLine, Parser};
//!
//! #[derive(Default, CommandLine)]
//! struct Config {
//!     #[cli(short = "v", desc = "enable verbose output")]
//!     verbose: bool,
//!     #[cli(default = "8080", validators = "port()")]
//!     port: u16,
//! }
//!
//! let mut config = Config::default();
//! let mut parser = Parser::new();
//! parser.parse_into(&mut config, std::env::args().skip(1));
//! ```
//!
//! ## Module organization
//!
//! - [`arg`] / [`command`] - the declaration data models
//! - [`registry`] - path-scoped declaration storage with cascade lookup
//! - [`parser`] - the token-walk state machine and execution engine
//! - [`validate`] - composable validators and the spec-string parser
//! - [`i18n`] - layered message catalogs and translated names
//! - [`suggest`] - edit-distance "did you mean" engine
//! - [`help`] / [`completion`] - rendering from the registries
//! - [`hooks`] - global and per-command pre/post hooks
//! - [`env`] / [`input`] - environment, terminal, and file seams

pub mod arg;
pub mod binding;
pub mod command;
pub mod completion;
pub mod convert;
pub mod env;
pub mod error;
pub mod help;
pub mod hooks;
pub mod i18n;
pub mod input;
pub mod parser;
pub mod registry;
pub mod settings;
pub mod suggest;
pub mod tokens;
pub mod validate;

pub use arg::{ArgType, Argument};
pub use binding::{CommandLine, DeclContext, FromArgValue};
pub use command::Command;
pub use completion::Shell;
pub use error::{ParseError, Result};
pub use help::HelpStyle;
pub use hooks::HookOrder;
pub use i18n::{Lang, LayeredBundle, MessageBundle};
pub use parser::{Parser, PositionalArg};
pub use settings::ParserSettings;
pub use validate::Validator;

/// Derive macro generating [`CommandLine`] from `#[cli(...)]` field
/// attributes.
pub use declargs_macros::CommandLine;

/// Commonly used items.
pub mod prelude {
    pub use crate::arg::{ArgType, Argument};
    pub use crate::binding::FromArgValue;
    pub use crate::command::Command;
    pub use crate::CommandLine;
    pub use crate::error::{ParseError, Result};
    pub use crate::parser::Parser;
    pub use crate::validate;
}
