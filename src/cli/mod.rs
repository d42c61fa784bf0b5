pub mod args;
pub mod commands;
pub mod logging;

pub use args::{Cli, Commands, InputFormat};
pub use commands::run;
