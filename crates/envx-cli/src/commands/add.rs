//! `envx add`: add variables that are not in the file yet.

use super::set::{assign, AssignArgs, Existing};
use crate::GlobalArgs;

/// Run the add command. Fails before prompting if any key already exists.
pub fn run(global: &GlobalArgs, args: AssignArgs) -> anyhow::Result<()> {
    assign(global, args, Existing::Refuse)
}
