use std::fs;
use std::path::Path;

use sdg_slicer::{canonicalize_or_current, infer_project_name, relative_to_root, sha256_file};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_absolute() {
    let result = canonicalize_or_current("does-not-exist-yet").expect("path");
    assert!(result.is_absolute());
    assert!(result.ends_with("does-not-exist-yet"));
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("/tmp/slicing-demo")), "slicing-demo");
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn sha256_file_matches_known_hash() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("abc.txt");
    fs::write(&path, b"abc").expect("write");
    assert_eq!(
        sha256_file(&path).expect("hash"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert!(sha256_file(&tmp.path().join("missing")).is_err());
}

#[test]
fn relative_to_root_strips_project_prefix() {
    let tmp = tempdir().expect("tempdir");
    let nested = tmp.path().join("programs");
    fs::create_dir_all(&nested).expect("mkdir");
    let file = nested.join("demo.yaml");
    fs::write(&file, "methods: []").expect("write");

    assert_eq!(relative_to_root(tmp.path(), &file), Path::new("programs/demo.yaml"));
    let outside = Path::new("/definitely/elsewhere.json");
    assert_eq!(relative_to_root(tmp.path(), outside), outside);
}
