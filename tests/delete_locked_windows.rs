#![cfg(windows)]

use assert_fs::TempDir;
use assert_fs::prelude::*;
use localfs::LocalFileStore;
use std::fs::OpenOptions;
use std::os::windows::fs::OpenOptionsExt;

#[test]
fn locked_file_is_the_only_failure() {
    let td = TempDir::new().unwrap();
    let root = td.child("root");
    for i in 0..6 {
        root.child(format!("f{i}.txt")).write_str("x").unwrap();
    }
    let locked = root.child("locked.txt");
    locked.write_str("busy").unwrap();

    // No sharing at all: delete fails with a sharing violation while this is open.
    let handle = OpenOptions::new().read(true).share_mode(0).open(locked.path()).unwrap();

    let store = LocalFileStore::new(root.path());
    let err = store.delete().expect_err("locked file blocks the tree");
    let leaves = err.leaves();
    assert_eq!(leaves.len(), 1, "{err}");
    assert_eq!(leaves[0].path(), Some(locked.path()));
    for i in 0..6 {
        assert!(!root.child(format!("f{i}.txt")).path().exists());
    }

    drop(handle);
    store.delete().expect("second delete succeeds once unlocked");
    assert!(!root.path().exists());
}
