//! Shared runtime utilities for the brewery prototype.
//!
//! Holds the debug command surface used by the console binary, kept free of the Bevy
//! runtime in `brew_sim` so other front ends can reuse it.

mod command_text;
mod commands;

pub use command_text::{parse_command_line, CommandParseError};
pub use commands::{CommandPayload, ResourceToken, SleepDirective};
