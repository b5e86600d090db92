mod args;
pub mod commands;
mod shell;

pub use args::{Cli, Commands, Line, LineCommand, TrackArgs};
pub use shell::Shell;
