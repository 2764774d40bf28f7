//! Scenario-based tests for shipyard

mod helpers;

mod confirm_and_hooks;
#[cfg(unix)]
mod deploy_flow;
mod incremental_rerun;
mod pipeline_upgrade;
mod retry_behavior;
