use quickdupe::duplicates::DuplicateFinder;
use quickdupe::manifest::{ManifestError, RemovalManifest, MANIFEST_VERSION};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

#[test]
fn test_scan_then_save_and_load() {
    let scan_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let content = patterned(700, 1);
    fs::write(scan_dir.path().join("b.bin"), &content).unwrap();
    fs::write(scan_dir.path().join("c.bin"), &content).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(scan_dir.path())
        .unwrap();
    let manifest = RemovalManifest::from_groups(scan_dir.path().to_path_buf(), &groups);
    let path = out_dir.path().join("duplicates-to-remove.json");
    manifest.save(&path).unwrap();

    let loaded = RemovalManifest::load(&path).unwrap();
    assert_eq!(loaded.version, MANIFEST_VERSION);
    assert_eq!(loaded.paths, vec![scan_dir.path().join("c.bin")]);
    assert_eq!(loaded.root.as_deref(), Some(scan_dir.path()));
    assert!(loaded.created_at.is_some());
}

#[test]
fn test_empty_manifest_is_still_written() {
    let scan_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    fs::write(scan_dir.path().join("only.bin"), patterned(300, 2)).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(scan_dir.path())
        .unwrap();
    let manifest = RemovalManifest::from_groups(scan_dir.path().to_path_buf(), &groups);
    let path = out_dir.path().join("m.json");
    manifest.save(&path).unwrap();

    assert!(path.exists());
    assert!(RemovalManifest::load(&path).unwrap().is_empty());
}

#[test]
fn test_save_overwrites_previous_manifest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");

    RemovalManifest::new(PathBuf::from("/a"), vec![PathBuf::from("/a/old.bin")])
        .save(&path)
        .unwrap();
    RemovalManifest::new(PathBuf::from("/b"), vec![PathBuf::from("/b/new.bin")])
        .save(&path)
        .unwrap();

    let loaded = RemovalManifest::load(&path).unwrap();
    assert_eq!(loaded.paths, vec![PathBuf::from("/b/new.bin")]);
}

#[test]
fn test_save_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");
    RemovalManifest::new(PathBuf::from("/r"), vec![PathBuf::from("/r/x")])
        .save(&path)
        .unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("m.json")]);
}

#[test]
fn test_load_legacy_array() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    fs::write(&path, r#"["/photos/IMG_1 copy.jpg", "/photos/IMG_2.jpg"]"#).unwrap();

    let loaded = RemovalManifest::load(&path).unwrap();
    assert_eq!(
        loaded.paths,
        vec![
            PathBuf::from("/photos/IMG_1 copy.jpg"),
            PathBuf::from("/photos/IMG_2.jpg")
        ]
    );
    assert!(loaded.root.is_none());
}

#[test]
fn test_load_missing_manifest() {
    let dir = tempdir().unwrap();
    let result = RemovalManifest::load(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(ManifestError::NotFound(_))));
}

#[test]
fn test_load_corrupt_manifest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();

    let err = RemovalManifest::load(&path).unwrap_err();
    assert!(err.is_corrupt());
}

#[test]
fn test_load_wrong_shape_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shape.json");
    fs::write(&path, r#"{"paths": 5}"#).unwrap();

    assert!(RemovalManifest::load(&path).unwrap_err().is_corrupt());
}

#[test]
fn test_load_tampered_manifest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");
    RemovalManifest::new(PathBuf::from("/r"), vec![PathBuf::from("/r/dup.bin")])
        .save(&path)
        .unwrap();

    let tampered = fs::read_to_string(&path)
        .unwrap()
        .replace("/r/dup.bin", "/r/keep.bin");
    fs::write(&path, tampered).unwrap();

    assert!(matches!(
        RemovalManifest::load(&path),
        Err(ManifestError::ChecksumMismatch(_))
    ));
}
