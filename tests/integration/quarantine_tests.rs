use quickdupe::actions::quarantine::{
    quarantine_batch, quarantine_file, BatchQuarantineResult, MoveResult, QuarantineConfig,
    QuarantineError, QuarantineProgressCallback, COLLISION_SUFFIX,
};
use quickdupe::duplicates::{removal_list, DuplicateFinder};
use quickdupe::manifest::RemovalManifest;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

struct Silent;

impl QuarantineProgressCallback for Silent {
    fn on_before_move(&self, _: &Path, _: &Path, _: usize, _: usize) {}
    fn on_move_success(&self, _: &MoveResult) {}
    fn on_move_failure(&self, _: &Path, _: &str) {}
    fn on_complete(&self, _: &BatchQuarantineResult) {}
}

#[derive(Default)]
struct Recorder {
    planned: Mutex<Vec<(PathBuf, PathBuf)>>,
    completed: Mutex<usize>,
}

impl QuarantineProgressCallback for Recorder {
    fn on_before_move(&self, source: &Path, destination: &Path, _: usize, _: usize) {
        self.planned
            .lock()
            .unwrap()
            .push((source.to_path_buf(), destination.to_path_buf()));
    }
    fn on_move_success(&self, _: &MoveResult) {}
    fn on_move_failure(&self, _: &Path, _: &str) {}
    fn on_complete(&self, _: &BatchQuarantineResult) {
        *self.completed.lock().unwrap() += 1;
    }
}

#[test]
fn test_name_clash_gets_copy_suffix() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let source = src.path().join("photo.jpg");
    fs::write(&source, b"new bytes").unwrap();
    fs::write(dest.path().join("photo.jpg"), b"already here").unwrap();

    let moved = quarantine_file(&source, dest.path()).unwrap();

    assert_eq!(moved.destination, dest.path().join("photo.jpg copy"));
    assert!(!source.exists());
    assert_eq!(fs::read(dest.path().join("photo.jpg")).unwrap(), b"already here");
    assert_eq!(fs::read(dest.path().join("photo.jpg copy")).unwrap(), b"new bytes");
}

#[test]
fn test_repeated_clash_appends_suffix_again() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    fs::write(dest.path().join("photo.jpg"), b"1").unwrap();
    fs::write(dest.path().join(format!("photo.jpg{}", COLLISION_SUFFIX)), b"2").unwrap();
    let source = src.path().join("photo.jpg");
    fs::write(&source, b"3").unwrap();

    let moved = quarantine_file(&source, dest.path()).unwrap();

    assert_eq!(moved.destination, dest.path().join("photo.jpg copy copy"));
}

#[test]
fn test_batch_same_name_from_different_dirs() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    fs::create_dir_all(src.path().join("a")).unwrap();
    fs::create_dir_all(src.path().join("b")).unwrap();
    let first = src.path().join("a/photo.jpg");
    let second = src.path().join("b/photo.jpg");
    fs::write(&first, b"first").unwrap();
    fs::write(&second, b"second").unwrap();

    let result = quarantine_batch(
        &[first, second],
        dest.path(),
        &QuarantineConfig::default(),
        Some(&Silent),
    )
    .unwrap();

    assert_eq!(result.moved_count(), 2);
    assert_eq!(fs::read(dest.path().join("photo.jpg")).unwrap(), b"first");
    assert_eq!(fs::read(dest.path().join("photo.jpg copy")).unwrap(), b"second");
}

#[test]
fn test_batch_creates_destination() {
    let src = tempdir().unwrap();
    let root = tempdir().unwrap();
    let dest = root.path().join("nested/quarantine");
    let source = src.path().join("x.bin");
    fs::write(&source, b"x").unwrap();

    let result = quarantine_batch(
        &[source],
        &dest,
        &QuarantineConfig::default(),
        None::<&Silent>,
    )
    .unwrap();

    assert!(dest.is_dir());
    assert_eq!(result.moved_count(), 1);
    assert_eq!(result.bytes_moved, 1);
}

#[test]
fn test_rerun_skips_already_moved() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let source = src.path().join("dup.bin");
    fs::write(&source, b"dup").unwrap();
    let paths = vec![source];

    let first = quarantine_batch(
        &paths,
        dest.path(),
        &QuarantineConfig::default(),
        None::<&Silent>,
    )
    .unwrap();
    let second = quarantine_batch(
        &paths,
        dest.path(),
        &QuarantineConfig::default(),
        None::<&Silent>,
    )
    .unwrap();

    assert_eq!(first.moved_count(), 1);
    assert_eq!(second.moved_count(), 0);
    assert_eq!(second.skipped_missing, paths);
    assert!(second.all_succeeded());
    assert!(!dest.path().join("dup.bin copy").exists());
}

#[test]
fn test_dry_run_plans_without_moving() {
    let src = tempdir().unwrap();
    let root = tempdir().unwrap();
    let dest = root.path().join("q");
    let a = src.path().join("a/same.bin");
    let b = src.path().join("b/same.bin");
    fs::create_dir_all(a.parent().unwrap()).unwrap();
    fs::create_dir_all(b.parent().unwrap()).unwrap();
    fs::write(&a, b"a").unwrap();
    fs::write(&b, b"b").unwrap();

    let recorder = Recorder::default();
    let result = quarantine_batch(
        &[a.clone(), b.clone()],
        &dest,
        &QuarantineConfig::default().with_dry_run(true),
        Some(&recorder),
    )
    .unwrap();

    assert!(a.exists());
    assert!(b.exists());
    assert!(!dest.exists());
    assert_eq!(result.moved_count(), 2);
    let planned = recorder.planned.lock().unwrap();
    assert_eq!(planned[0].1, dest.join("same.bin"));
    assert_eq!(planned[1].1, dest.join("same.bin copy"));
    assert_eq!(*recorder.completed.lock().unwrap(), 1);
}

#[test]
fn test_destination_is_a_file() {
    let src = tempdir().unwrap();
    let dest = src.path().join("not-a-dir");
    fs::write(&dest, b"file").unwrap();
    let source = src.path().join("x.bin");
    fs::write(&source, b"x").unwrap();

    let result = quarantine_batch(
        &[source],
        &dest,
        &QuarantineConfig::default(),
        None::<&Silent>,
    );

    assert!(matches!(
        result,
        Err(QuarantineError::DestinationNotADirectory(_))
    ));
}

#[test]
fn test_directory_entry_is_a_failure_not_fatal() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let directory = src.path().join("folder");
    fs::create_dir(&directory).unwrap();
    let file = src.path().join("file.bin");
    fs::write(&file, b"f").unwrap();

    let result = quarantine_batch(
        &[directory.clone(), file],
        dest.path(),
        &QuarantineConfig::default(),
        None::<&Silent>,
    )
    .unwrap();

    assert_eq!(result.moved_count(), 1);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.failures[0].0, directory);
    assert!(directory.is_dir());
}

#[test]
fn test_scan_manifest_quarantine_end_to_end() {
    let scan = tempdir().unwrap();
    let work = tempdir().unwrap();
    let content: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
    fs::write(scan.path().join("b.bin"), &content).unwrap();
    fs::write(scan.path().join("c.bin"), &content).unwrap();
    fs::write(scan.path().join("a.bin"), [1u8; 20]).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(scan.path())
        .unwrap();
    assert_eq!(removal_list(&groups).len(), 1);

    let manifest_path = work.path().join("duplicates-to-remove.json");
    RemovalManifest::from_groups(scan.path().to_path_buf(), &groups)
        .save(&manifest_path)
        .unwrap();

    let manifest = RemovalManifest::load(&manifest_path).unwrap();
    let dest = work.path().join("quarantine");
    let result = quarantine_batch(
        &manifest.paths,
        &dest,
        &QuarantineConfig::default(),
        None::<&Silent>,
    )
    .unwrap();

    assert!(result.all_succeeded());
    assert!(scan.path().join("a.bin").exists());
    assert!(scan.path().join("b.bin").exists());
    assert!(!scan.path().join("c.bin").exists());
    assert_eq!(fs::read(dest.join("c.bin")).unwrap(), content);
}
