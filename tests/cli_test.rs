//! End-to-end tests of the ppfmt binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const UNFORMATTED: &str = "int f(){\nreturn g(1,2);   \n}\n";
const FORMATTED: &str = "int f() {\n\treturn g( 1, 2 );\n}\n";

fn ppfmt() -> Command {
    let mut cmd = Command::cargo_bin("ppfmt").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_formats_file_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.c");
    fs::write(&path, UNFORMATTED).unwrap();

    ppfmt()
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 changed"));
    assert_eq!(fs::read_to_string(&path).unwrap(), FORMATTED);
}

#[test]
fn test_check_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.c");
    fs::write(&path, UNFORMATTED).unwrap();

    ppfmt()
        .arg("--check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("would reformat"));
    assert_eq!(fs::read_to_string(&path).unwrap(), UNFORMATTED);

    fs::write(&path, FORMATTED).unwrap();
    ppfmt().arg("--check").arg(&path).assert().success();
}

#[test]
fn test_stdout_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.c");
    fs::write(&path, UNFORMATTED).unwrap();

    ppfmt()
        .arg("--stdout")
        .arg(&path)
        .assert()
        .success()
        .stdout(FORMATTED);
    assert_eq!(fs::read_to_string(&path).unwrap(), UNFORMATTED);
}

#[test]
fn test_stdout_echoes_excluded_file() {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("Migrations");
    fs::create_dir_all(&migrations).unwrap();
    let generated = migrations.join("Init.cs");
    fs::write(&generated, UNFORMATTED).unwrap();

    ppfmt()
        .arg("--stdout")
        .arg(&generated)
        .assert()
        .success()
        .stdout(UNFORMATTED);
    assert_eq!(fs::read_to_string(&generated).unwrap(), UNFORMATTED);
}

#[test]
fn test_recursive_skips_migrations_and_unknown_files() {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("Data").join("Migrations");
    fs::create_dir_all(&migrations).unwrap();
    let generated = migrations.join("Init.cs");
    let model = dir.path().join("Data").join("Model.cs");
    let notes = dir.path().join("notes.txt");
    fs::write(&generated, UNFORMATTED).unwrap();
    fs::write(&model, UNFORMATTED).unwrap();
    fs::write(&notes, UNFORMATTED).unwrap();

    ppfmt()
        .arg("-r")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 excluded"));

    assert_eq!(fs::read_to_string(&generated).unwrap(), UNFORMATTED);
    assert_eq!(fs::read_to_string(&model).unwrap(), FORMATTED);
    assert_eq!(fs::read_to_string(&notes).unwrap(), UNFORMATTED);
}

#[test]
fn test_exclude_pattern() {
    let dir = TempDir::new().unwrap();
    let skipped = dir.path().join("View.g.cs");
    let kept = dir.path().join("View.cs");
    fs::write(&skipped, UNFORMATTED).unwrap();
    fs::write(&kept, UNFORMATTED).unwrap();

    ppfmt()
        .args(["-e", "*.g.cs"])
        .arg(dir.path())
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&skipped).unwrap(), UNFORMATTED);
    assert_eq!(fs::read_to_string(&kept).unwrap(), FORMATTED);
}

#[test]
fn test_reads_stdin_with_language_from_filename() {
    ppfmt()
        .args(["--stdin-filename", "Module1.vb", "-"])
        .write_stdin("Module M\nSub Main()\nx = F(1,2)\nEnd Sub\nEnd Module\n")
        .assert()
        .success()
        .stdout("Module M\n\tSub Main()\n\t\tx = F(1, 2)\n\tEnd Sub\nEnd Module\n");
}

#[test]
fn test_inactive_branch_reported_under_configuration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("f.c");
    let source = "void F() {\n#if FAST\n  skip(1);\n#endif\n}\n";
    fs::write(&path, source).unwrap();

    ppfmt()
        .args(["-p", "FAST"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("f.c:3: unformatted-region"));
    assert_eq!(fs::read_to_string(&path).unwrap(), source);

    ppfmt()
        .args(["-p", "FAST", "--check"])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn test_apply_policy_from_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ppfmt.toml"),
        "preprocessor_configurations = [[\"FAST\"]]\npolicy = \"apply\"\n",
    )
    .unwrap();
    let path = dir.path().join("f.c");
    fs::write(&path, "void F() {\n#if FAST\n  skip(1);\n#endif\n}\n").unwrap();

    ppfmt().arg(&path).assert().success();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "void F() {\n#if FAST\n\tskip( 1 );\n#endif\n}\n"
    );
}

#[test]
fn test_invalid_configuration_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.c");
    fs::write(&path, UNFORMATTED).unwrap();

    ppfmt()
        .args(["--indent-size", "0"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("indent_size"));
    assert_eq!(fs::read_to_string(&path).unwrap(), UNFORMATTED);
}
