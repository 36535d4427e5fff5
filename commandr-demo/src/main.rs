mod greetings;

use commandr::{logging, Dispatcher, RunOptions};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    logging::init();

    let registry = greetings::registry()?;
    tracing::debug!("Registered {} command(s)", registry.len());

    // Every command taking `name` must get it capitalized unless it says otherwise
    let options = RunOptions::new()
        .hyphenate(true)
        .validate("name", greetings::name_validator());

    Dispatcher::new(registry, options).run()
}
