//! CLI domain: parse, route, help, output, and presentation only.
//! No domain logic; a single route table dispatches to the orchestrator.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{parse_span, Cli, Commands, KindArg, LineSpan};
pub use route::RunContext;
