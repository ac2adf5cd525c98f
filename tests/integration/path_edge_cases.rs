use quickdupe::actions::quarantine::{quarantine_batch, BatchQuarantineResult, MoveResult, QuarantineConfig, QuarantineProgressCallback};
use quickdupe::duplicates::{removal_list, DuplicateFinder};
use quickdupe::manifest::RemovalManifest;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

const CONTENT: &[u8] = b"The quick brown fox jumps over the lazy dog. \
The quick brown fox jumps over the lazy dog. The quick brown fox jumps.";

struct Silent;

impl QuarantineProgressCallback for Silent {
    fn on_before_move(&self, _: &Path, _: &Path, _: usize, _: usize) {}
    fn on_move_success(&self, _: &MoveResult) {}
    fn on_move_failure(&self, _: &Path, _: &str) {}
    fn on_complete(&self, _: &BatchQuarantineResult) {}
}

fn create(dir: &Path, name: &str) {
    File::create(dir.join(name))
        .expect("Failed to create file")
        .write_all(CONTENT)
        .unwrap();
}

#[test]
fn test_content_is_above_threshold() {
    assert!(CONTENT.len() as u64 >= quickdupe::scanner::MIN_SIGNATURE_SIZE);
}

#[test]
fn test_paths_with_quotes() {
    let dir = tempdir().unwrap();

    // Windows does not allow double quotes in filenames.
    if cfg!(not(windows)) {
        create(dir.path(), "a_original.txt");
        create(dir.path(), "file_with_\"quote\".txt");

        let finder = DuplicateFinder::with_defaults();
        let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(groups.len(), 1);
        assert!(removal_list(&groups)[0]
            .to_string_lossy()
            .contains('"'));
    }
}

#[test]
fn test_paths_with_spaces_survive_manifest() {
    let dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    create(dir.path(), "holiday photo.jpg");
    create(dir.path(), "holiday photo copy.jpg");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let manifest_path = out.path().join("m.json");
    RemovalManifest::from_groups(dir.path().to_path_buf(), &groups)
        .save(&manifest_path)
        .unwrap();

    // Sorted order puts "holiday photo copy.jpg" first, so it is kept.
    let loaded = RemovalManifest::load(&manifest_path).unwrap();
    assert_eq!(loaded.paths, vec![dir.path().join("holiday photo.jpg")]);
}

#[test]
fn test_unicode_paths_through_quarantine() {
    let dir = tempdir().unwrap();
    let dest = tempdir().unwrap();
    create(dir.path(), "Ünïcödé.txt");
    create(dir.path(), "日本語.txt");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let paths = removal_list(&groups);
    assert_eq!(paths.len(), 1);

    let result = quarantine_batch(
        &paths,
        dest.path(),
        &QuarantineConfig::default(),
        None::<&Silent>,
    )
    .unwrap();

    assert_eq!(result.moved_count(), 1);
    let moved_name = paths[0].file_name().unwrap();
    assert!(dest.path().join(moved_name).exists());
}

#[test]
fn test_deeply_nested_path() {
    let dir = tempdir().unwrap();
    let mut deep = dir.path().to_path_buf();
    for i in 0..20 {
        deep = deep.join(format!("level_{}", i));
    }
    fs::create_dir_all(&deep).unwrap();
    create(&deep, "deep.txt");
    create(dir.path(), "shallow.txt");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.file_count, 2);
    assert_eq!(groups.len(), 1);
    assert!(groups[0].is_confirmed());
}

#[cfg(unix)]
#[test]
fn test_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    create(dir.path(), "real.txt");
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
        .unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.file_count, 1);
}
