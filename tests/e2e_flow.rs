//! End-to-end smoke test: wires `replay_si::run` against a fixture dapp
//! directory and an empty substate store, exercising CLI validation,
//! context bootstrap, the JSON substate provider, and the full dispatcher
//! without requiring a real EVM kernel stand-in to see any substates.

use replay_si::cli::ReplaySiArgs;
use tempfile::tempdir;

fn args(dapp_dir: std::path::PathBuf, substate_dir: std::path::PathBuf) -> ReplaySiArgs {
    ReplaySiArgs {
        block_first: 1,
        block_last: 3,
        workers: 2,
        skip_env: false,
        skip_tod: false,
        skip_mani: false,
        skip_hook: false,
        rich_info: false,
        substate_dir,
        dapp_dir,
        log_level: "error".to_string(),
    }
}

#[test]
fn run_completes_over_a_block_range_with_no_substates() {
    let dapp_dir = tempdir().unwrap();
    std::fs::write(
        dapp_dir.path().join("address.txt"),
        "0x3333333333333333333333333333333333333333\n",
    )
    .unwrap();
    std::fs::create_dir_all(dapp_dir.path().join("abi")).unwrap();
    let substate_dir = tempdir().unwrap();

    let result = replay_si::run(args(dapp_dir.path().to_path_buf(), substate_dir.path().to_path_buf()));
    assert!(result.is_ok(), "expected a clean run, got {result:?}");

    assert!(!dapp_dir.path().join("SIbugLog.txt").exists());
    assert!(!dapp_dir.path().join("errorLog.txt").exists());
}

#[test]
fn run_rejects_an_inverted_block_range() {
    let dapp_dir = tempdir().unwrap();
    let substate_dir = tempdir().unwrap();
    let mut a = args(dapp_dir.path().to_path_buf(), substate_dir.path().to_path_buf());
    a.block_first = 10;
    a.block_last = 1;

    let result = replay_si::run(a);
    assert!(result.is_err());
}

#[test]
fn run_rejects_a_missing_dapp_dir() {
    let dapp_dir = tempdir().unwrap();
    let missing = dapp_dir.path().join("does-not-exist");
    let substate_dir = tempdir().unwrap();

    let result = replay_si::run(args(missing, substate_dir.path().to_path_buf()));
    assert!(result.is_err());
}
