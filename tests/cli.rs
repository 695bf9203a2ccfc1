use assert_cmd::cargo;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

/// Run the binary with a config path that does not exist, so only defaults apply.
fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(cargo::cargo_bin!("localfs"))
        .env("LOCALFS_CONFIG", dir.join("no-config.xml"))
        .env_remove("LOCALFS_NATIVES")
        .args(args)
        .output()
        .expect("spawn binary")
}

fn stdout_json(out: &Output) -> serde_json::Value {
    let text = String::from_utf8_lossy(&out.stdout);
    let line = text.lines().last().unwrap_or_default();
    serde_json::from_str(line).unwrap_or_else(|e| panic!("bad json {line:?}: {e}"))
}

fn s(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn print_config_succeeds() {
    let td = tempdir().unwrap();
    let out = run(td.path(), &["--print-config"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("no-config.xml"));
}

#[test]
fn caps_reports_a_provider() {
    let td = tempdir().unwrap();
    let out = run(td.path(), &["--json", "caps"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v = stdout_json(&out);
    assert!(v["provider"].is_string());
    assert!(v["attributes"].as_array().unwrap().iter().any(|a| a == "read_only"));
}

#[test]
fn info_and_ls_as_json() {
    let td = tempdir().unwrap();
    fs::write(td.path().join("a.txt"), b"hello").unwrap();
    fs::create_dir(td.path().join("sub")).unwrap();

    let out = run(td.path(), &["--json", "info", s(&td.path().join("a.txt"))]);
    assert!(out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["name"], "a.txt");
    assert_eq!(v["exists"], true);
    assert_eq!(v["length"], 5);

    let out = run(td.path(), &["--json", "ls", s(td.path())]);
    assert!(out.status.success());
    let names: Vec<String> = stdout_json(&out)
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["a.txt", "sub"]);
}

#[test]
fn info_on_missing_path_reports_absent() {
    let td = tempdir().unwrap();
    let out = run(td.path(), &["--json", "info", s(&td.path().join("ghost"))]);
    assert!(out.status.success());
    assert_eq!(stdout_json(&out)["exists"], false);
}

#[test]
fn mkdir_needs_parents_flag_for_deep_paths() {
    let td = tempdir().unwrap();
    let deep = td.path().join("x/y/z");

    let out = run(td.path(), &["mkdir", s(&deep)]);
    assert!(!out.status.success());
    assert!(!deep.exists());

    let out = run(td.path(), &["--json", "mkdir", "--parents", s(&deep)]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout_json(&out)["op"], "mkdir");
    assert!(deep.is_dir());
}

#[test]
fn cp_mv_rm_round() {
    let td = tempdir().unwrap();
    let src = td.path().join("tree");
    fs::create_dir_all(src.join("inner")).unwrap();
    fs::write(src.join("inner/f.txt"), b"data").unwrap();
    let copy = td.path().join("copy");
    let moved = td.path().join("moved");

    assert!(run(td.path(), &["cp", s(&src), s(&copy)]).status.success());
    assert_eq!(fs::read(copy.join("inner/f.txt")).unwrap(), b"data");

    assert!(run(td.path(), &["mv", s(&copy), s(&moved)]).status.success());
    assert!(!copy.exists());
    assert_eq!(fs::read(moved.join("inner/f.txt")).unwrap(), b"data");

    assert!(run(td.path(), &["rm", s(&moved)]).status.success());
    assert!(!moved.exists());
    assert!(src.join("inner/f.txt").exists());
}

#[test]
fn cp_onto_existing_file_needs_overwrite() {
    let td = tempdir().unwrap();
    let a = td.path().join("a");
    let b = td.path().join("b");
    fs::write(&a, b"new").unwrap();
    fs::write(&b, b"old").unwrap();

    let out = run(td.path(), &["cp", s(&a), s(&b)]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("exists"));
    assert_eq!(fs::read(&b).unwrap(), b"old");

    assert!(run(td.path(), &["cp", "--overwrite", s(&a), s(&b)]).status.success());
    assert_eq!(fs::read(&b).unwrap(), b"new");
}

#[test]
fn set_attr_read_only_and_mtime() {
    let td = tempdir().unwrap();
    let f = td.path().join("f.txt");
    fs::write(&f, b"x").unwrap();

    let out = run(
        td.path(),
        &["--json", "set-attr", s(&f), "--read-only", "true", "--last-modified", "1500000000000"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v = stdout_json(&out);
    assert_eq!(v["last_modified"], 1_500_000_000_000i64);
    assert!(v["attributes"].as_array().unwrap().iter().any(|a| a == "read_only"));

    assert!(run(td.path(), &["set-attr", s(&f), "--read-only", "false"]).status.success());
    assert!(!fs::metadata(&f).unwrap().permissions().readonly());
}

#[test]
fn set_attr_on_missing_path_fails() {
    let td = tempdir().unwrap();
    let out = run(td.path(), &["set-attr", s(&td.path().join("ghost")), "--hidden", "true"]);
    assert!(!out.status.success());
}

#[test]
fn missing_command_is_an_error() {
    let td = tempdir().unwrap();
    let out = run(td.path(), &[]);
    assert!(!out.status.success());
}
