//! Command handler modules for the Twentyone CLI.
//!
//! Each subcommand lives in its own file and follows the same pattern:
//!
//! - Public handler function: `pub fn handle_COMMAND_command(...) -> Result<(), CliError>`
//! - Output streams (`&mut dyn Write`) are passed in, never opened here
//! - Errors propagate via the `CliError` enum

pub mod cfg;
pub mod deal;
pub mod sim;

pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use sim::{SimOptions, handle_sim_command};
