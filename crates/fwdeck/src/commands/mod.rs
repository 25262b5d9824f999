//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod counters;
pub mod interfaces;
pub mod nat;
pub mod rules;
pub mod settings;
pub mod util;
pub mod workflow;
pub mod zones;

use fwdeck_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a control-plane-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Rules(args) => rules::handle(controller, args, global).await,
        Command::Nat(args) => nat::handle(controller, args, global).await,
        Command::Zones(args) => zones::handle(controller, args, global).await,
        Command::Interfaces(args) => interfaces::handle(controller, args, global).await,
        Command::Settings(args) => settings::handle(controller, args, global).await,
        Command::Counters => counters::handle(controller, global).await,
        Command::Apply => workflow::apply(controller, global).await,
        Command::Rollback => workflow::rollback(controller, global).await,
        Command::Health => workflow::health(controller, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
