// Integration tests for ffbatch
// This file serves as the main entry point for integration tests

mod common;

// Include all integration test modules
#[path = "integration/container_legality.rs"]
mod container_legality;

#[path = "integration/command_assembly.rs"]
mod command_assembly;

#[path = "integration/batch_progress.rs"]
mod batch_progress;

#[path = "integration/dry_run.rs"]
mod dry_run;

#[path = "integration/config_state.rs"]
mod config_state;
