use serde_json::Value;
use std::process::{Command, Output};

const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

fn run(args: &[&str]) -> Output {
    let binary_path = assert_cmd::cargo::cargo_bin!("xcm-transfer");
    Command::new(binary_path)
        .args(args)
        .output()
        .expect("cli run succeeds")
}

fn stdout_of(output: &Output) -> String {
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);
    String::from_utf8(output.stdout.clone()).expect("stdout is utf8")
}

#[test]
fn cli_lists_builtin_chains() {
    let stdout = stdout_of(&run(&["chains"]));
    assert!(stdout.contains("polkadot-asset-hub"));
    assert!(stdout.contains("hydration"));

    let json: Value = serde_json::from_str(&stdout_of(&run(&["chains", "--json"]))).expect("chains json");
    let chains = json.as_array().expect("chains array");
    assert!(chains.iter().any(|c| c["id"] == "kusama" && c["type"] == "relay"));
}

#[test]
fn cli_classifies_directions() {
    let stdout = stdout_of(&run(&["direction", "--from", "polkadot", "--to", "polkadot-asset-hub"]));
    assert_eq!(stdout.trim(), "RelayToSystem");

    let stdout = stdout_of(&run(&["direction", "--from", "polkadot-asset-hub", "--to", "kusama-asset-hub"]));
    assert_eq!(stdout.trim(), "SystemToBridge");
}

#[test]
fn cli_builds_teleport_call() {
    let stdout = stdout_of(&run(&[
        "build",
        "--from",
        "polkadot",
        "--to",
        "polkadot-asset-hub",
        "--token",
        "DOT",
        "--recipient",
        ALICE,
        "--amount",
        "10000000000",
    ]));

    let call: Value = serde_json::from_str(&stdout).expect("call json");
    assert_eq!(call["direction"], "RelayToSystem");
    assert_eq!(call["pallet"], "XcmPallet");
    assert_eq!(call["call"], "limited_teleport_assets");
    assert_eq!(call["args"]["dest"]["value"]["interior"]["value"]["value"], 1000);
    assert_eq!(call["args"]["fee_asset_item"], 0);
}

#[test]
fn cli_prints_token_location() {
    let stdout = stdout_of(&run(&["location", "--chain", "hydration", "--token", "USDT"]));
    let location: Value = serde_json::from_str(&stdout).expect("location json");
    assert_eq!(location["parents"], 1);
    assert_eq!(location["interior"]["type"], "X3");
}

#[test]
fn cli_rejects_bad_input() {
    let same_chain = run(&[
        "build", "--from", "polkadot", "--to", "polkadot", "--token", "DOT", "--recipient", ALICE, "--amount", "1",
    ]);
    assert!(!same_chain.status.success());

    let unknown = run(&["direction", "--from", "polkadot", "--to", "atlantis"]);
    assert!(!unknown.status.success());
    let stderr = String::from_utf8_lossy(&unknown.stderr);
    assert!(stderr.contains("atlantis"), "stderr names the chain: {}", stderr);

    let bad_recipient = run(&[
        "build", "--from", "polkadot", "--to", "polkadot-asset-hub", "--token", "DOT", "--recipient", "nobody",
        "--amount", "1",
    ]);
    assert!(!bad_recipient.status.success());
}
