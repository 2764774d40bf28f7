//! Test: The built-in deploy flow against a stand-in terraform binary

use crate::helpers::*;
use shipyard::core::{EngineConfig, ExecutionStatus};
use shipyard::execution::ExecutionEngine;
use shipyard::flows::{run_flow, FlowKind};
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

const FAKE_TERRAFORM: &str = "#!/bin/sh
case \"$1\" in
  init)
    mkdir -p .terraform/providers
    echo 'provider \"null\" {}' > .terraform.lock.hcl
    ;;
  apply)
    echo '{\"serial\": 1}' > terraform.tfstate
    cp terraform.tfstate terraform.tfstate.backup
    ;;
esac
";

/// Put a terraform stand-in first on PATH; it writes the files the real
/// binary leaves in its working directory
fn install_fake_terraform() -> TempDir {
    let bin = TempDir::new().unwrap();
    let path = bin.path().join("terraform");
    std::fs::write(&path, FAKE_TERRAFORM).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut paths = vec![bin.path().to_path_buf()];
    paths.extend(std::env::split_paths(&current));
    std::env::set_var("PATH", std::env::join_paths(paths).unwrap());
    bin
}

/// Terraform's own working files do not make a second deploy re-run
#[tokio::test]
async fn test_deploy_is_idempotent() {
    let _bin = install_fake_terraform();
    let app = TempDir::new().unwrap();
    write_file(app.path(), "terraform/main.tf", "resource \"null_resource\" \"x\" {}");
    let engine = ExecutionEngine::new(EngineConfig::default());

    let first = run_flow(FlowKind::Deploy, app.path(), &engine).await.unwrap();
    assert_eq!(first.status, ExecutionStatus::Completed);
    assert_eq!(first.executed, 2);
    assert_eq!(first.skipped, 2);
    assert!(app.path().join("terraform/.terraform").is_dir());
    assert!(app.path().join("terraform/terraform.tfstate").exists());

    let second = run_flow(FlowKind::Deploy, app.path(), &engine).await.unwrap();
    assert_eq!(second.executed, 0);
    assert_eq!(second.unchanged, 2);

    write_file(app.path(), "terraform/variables.tf", "variable \"region\" {}");
    let third = run_flow(FlowKind::Deploy, app.path(), &engine).await.unwrap();
    assert_eq!(third.executed, 2);
}
