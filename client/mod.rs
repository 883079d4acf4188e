pub mod cli_args;
pub mod formatter;

pub use cli_args::{CliArgs, Command, FilterArgs, OutputFormat};
pub use formatter::OutputFormatter;
