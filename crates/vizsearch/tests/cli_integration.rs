use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

const TABLE: &str = "block\ttargetName\ttargetPic\tdistractorName\tdistractorPic\textra\n\
    L\tT\tT_1\tL\tL_1\tx\n\
    L\tT\tT_2\tL\tL_2\tx\n\
    R\tT\tT_1\tO\tO_1\tx\n";

fn vizsearch_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vizsearch"))
}

fn run_vizsearch(dir: &Path, args: &[&str]) -> Output {
    Command::new(vizsearch_bin())
        .current_dir(dir)
        .args(args)
        .env_remove("VIZSEARCH_LOG")
        .output()
        .expect("run vizsearch binary")
}

fn workspace() -> tempfile::TempDir {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("trialList_e.txt"), TABLE).expect("write condition table");
    temp
}

fn generate_args<'a>(subject: &'a str, seed: &'a str, order: &'a str) -> Vec<&'a str> {
    vec![
        "generate",
        "--subject",
        subject,
        "--seed",
        seed,
        "--lang",
        "e",
        "--block-order",
        order,
    ]
}

#[test]
fn generate_writes_trial_file_and_meta() {
    let temp = workspace();
    let output = run_vizsearch(temp.path(), &generate_args("s1", "20", "LR"));
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let text = fs::read_to_string(temp.path().join("trials/s1_trials.txt")).expect("trial file");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some(
            "subjCode\tseed\tlang\tblockOrder\tblock\ttargetName\ttargetPic\tdistractorName\t\
             distractorPic\ttargetLocation\tisPresent\tnumItems\tdistractorLocations"
        )
    );
    // L crosses two target pictures with two distractor pictures.
    assert_eq!(lines.count(), 5 * 72);

    let meta: Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("trials/s1_trials.meta.json")).expect("meta"),
    )
    .expect("meta json");
    assert_eq!(meta["status"], "ok");
    assert_eq!(meta["trial_count"], 360);
    assert_eq!(meta["blocks"][0]["label"], "L");
    assert_eq!(meta["blocks"][0]["trials"], 288);
}

#[test]
fn identical_seeds_produce_identical_files() {
    let first = workspace();
    let second = workspace();
    for dir in [first.path(), second.path()] {
        let output = run_vizsearch(dir, &generate_args("s1", "20", "RL"));
        assert!(output.status.success());
    }
    let a = fs::read(first.path().join("trials/s1_trials.txt")).expect("first");
    let b = fs::read(second.path().join("trials/s1_trials.txt")).expect("second");
    assert_eq!(a, b);

    let other = workspace();
    assert!(run_vizsearch(other.path(), &generate_args("s1", "21", "RL")).status.success());
    let c = fs::read(other.path().join("trials/s1_trials.txt")).expect("third");
    assert_ne!(a, c);
}

#[test]
fn malformed_seed_exits_with_config_code_and_writes_nothing() {
    let temp = workspace();
    let output = run_vizsearch(temp.path(), &generate_args("s1", "20 ", "LR"));
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("20 "));
    assert!(!temp.path().join("trials/s1_trials.txt").exists());
}

#[test]
fn block_mismatch_and_unanswered_fields_are_configuration_errors() {
    let temp = workspace();
    let mismatch = run_vizsearch(temp.path(), &generate_args("s1", "20", "LX"));
    assert_eq!(mismatch.status.code(), Some(2));

    let unanswered = run_vizsearch(temp.path(), &generate_args("s1", "20", "Choose"));
    assert_eq!(unanswered.status.code(), Some(2));

    assert!(!temp.path().join("trials").exists());
}

#[test]
fn rerun_requires_force() {
    let temp = workspace();
    assert!(run_vizsearch(temp.path(), &generate_args("s1", "20", "LR")).status.success());

    let again = run_vizsearch(temp.path(), &generate_args("s1", "20", "LR"));
    assert_eq!(again.status.code(), Some(2));

    let mut forced = generate_args("s1", "20", "LR");
    forced.push("--force");
    assert!(run_vizsearch(temp.path(), &forced).status.success());
}

#[test]
fn scattered_profile_generates_clean_file_that_inspect_accepts() {
    let temp = workspace();
    let mut args = generate_args("s2", "5", "LR");
    args.extend(["--profile", "scattered-search"]);
    let output = run_vizsearch(temp.path(), &args);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let inspect = run_vizsearch(temp.path(), &["inspect", "trials/s2_trials.txt", "--json"]);
    assert!(inspect.status.success());
    let report: Value = serde_json::from_slice(&inspect.stdout).expect("inspect json");
    assert_eq!(report["trials"], 50);
    assert_eq!(report["violations"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["profile"], "scattered-search");

    let text = fs::read_to_string(temp.path().join("trials/s2_trials.txt")).expect("trial file");
    for row in text.lines().skip(1) {
        let target = row.split('\t').nth(9).expect("targetLocation cell");
        let orientation = target
            .trim_end_matches(']')
            .rsplit(", ")
            .next()
            .expect("orientation");
        assert!(
            ["left", "up", "right", "down"].contains(&orientation),
            "target cell {target}"
        );
    }
}

#[test]
fn inspect_flags_scattered_items_crowding_fixation() {
    let temp = workspace();
    let mut args = generate_args("s2", "5", "LR");
    args.extend(["--profile", "scattered-search"]);
    assert!(run_vizsearch(temp.path(), &args).status.success());

    let path = temp.path().join("trials/s2_trials.txt");
    let mut text = fs::read_to_string(&path).expect("trial file");
    text.push_str(
        "s2\t5\te\tLR\tR\tT\tT_1\tO\tO_1\t[0.100, 0.000, up]\tpresent\t2\t\
         [[0.200, 0.000, left]]\n",
    );
    fs::write(&path, text).expect("rewrite");

    let inspect = run_vizsearch(temp.path(), &["inspect", "trials/s2_trials.txt", "--json"]);
    assert_eq!(inspect.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&inspect.stdout).expect("inspect json");
    let violations = report["violations"].as_array().expect("violations");
    assert!(
        violations
            .iter()
            .any(|v| v.as_str().is_some_and(|v| v.contains("from fixation")))
    );
}

#[test]
fn inspect_flags_a_tampered_file() {
    let temp = workspace();
    assert!(run_vizsearch(temp.path(), &generate_args("s1", "20", "LR")).status.success());

    let path = temp.path().join("trials/s1_trials.txt");
    let text = fs::read_to_string(&path).expect("trial file");
    let tampered = text.replacen("\tpresent\t4\t[", "\tpresent\t5\t[", 1);
    assert_ne!(text, tampered);
    fs::write(&path, tampered).expect("rewrite");

    let inspect = run_vizsearch(temp.path(), &["inspect", "trials/s1_trials.txt", "--json"]);
    assert_eq!(inspect.status.code(), Some(1));
}

#[test]
fn sample_prints_json_and_times_out_when_infeasible() {
    let temp = tempdir().expect("tempdir");
    let ok = run_vizsearch(
        temp.path(),
        &[
            "sample",
            "--count",
            "6",
            "--half-width",
            "6",
            "--min-distance",
            "2",
            "--seed",
            "20",
        ],
    );
    assert!(ok.status.success());
    let report: Value = serde_json::from_slice(&ok.stdout).expect("sample json");
    assert_eq!(report["locations"].as_array().map(Vec::len), Some(6));

    let stuck = run_vizsearch(
        temp.path(),
        &[
            "sample",
            "--count",
            "5",
            "--half-width",
            "6",
            "--min-distance",
            "2",
            "--max-per-quad",
            "1",
            "--seed",
            "20",
        ],
    );
    assert_eq!(stuck.status.code(), Some(3));
}

#[test]
fn list_profiles_prints_builtins() {
    let temp = tempdir().expect("tempdir");
    let output = run_vizsearch(temp.path(), &["list-profiles"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec!["blocked-search", "scattered-search"]
    );
}
