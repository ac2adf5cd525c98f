use quickdupe::duplicates::{removal_list, DuplicateFinder, FinderConfig, FinderError, Verification};
use quickdupe::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

/// Deterministic bytes that differ from one seed to the next in every window.
fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(17).wrapping_add(seed))
        .collect()
}

fn write(dir: &Path, name: &str, content: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.file_count, 0);
    assert_eq!(summary.removable_count, 0);
}

#[test]
fn test_scan_small_file_and_identical_pair() {
    let dir = tempdir().unwrap();
    let content = patterned(1000, 1);
    write(dir.path(), "a.bin", &[9u8; 50]);
    write(dir.path(), "b.bin", &content);
    write(dir.path(), "c.bin", &content);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(removal_list(&groups), vec![dir.path().join("c.bin")]);
    assert_eq!(groups[0].kept(), Some(&dir.path().join("b.bin")));
    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.unique_signatures, 1);
    assert_eq!(summary.duplicate_count, 1);
    assert_eq!(summary.removable_count, 1);
    assert_eq!(summary.remaining_count(), 1);
    assert_eq!(summary.skipped_too_small, 1);
}

#[test]
fn test_scan_collision_in_unsampled_region() {
    let dir = tempdir().unwrap();
    let first = patterned(1000, 2);
    let mut second = first.clone();
    // Windows cover [0,32), [500,532) and [968,1000).
    second[250] = second[250].wrapping_add(1);
    write(dir.path(), "d.bin", &first);
    write(dir.path(), "e.bin", &second);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert!(matches!(
        groups[0].outcome,
        Verification::CollisionOnly { .. }
    ));
    assert!(removal_list(&groups).is_empty());
    assert_eq!(summary.collision_groups, 1);
    assert_eq!(summary.duplicate_count, 1);
    assert_eq!(summary.removable_count, 0);
}

#[test]
fn test_scan_multiple_groups_in_order() {
    let dir = tempdir().unwrap();
    let one = patterned(300, 10);
    let two = patterned(300, 20);
    write(dir.path(), "1a.bin", &one);
    write(dir.path(), "1b.bin", &one);
    write(dir.path(), "1c.bin", &one);
    write(dir.path(), "2a.bin", &two);
    write(dir.path(), "2b.bin", &two);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(summary.confirmed_groups, 2);
    assert_eq!(
        removal_list(&groups),
        vec![
            dir.path().join("1b.bin"),
            dir.path().join("1c.bin"),
            dir.path().join("2b.bin")
        ]
    );
    assert_eq!(summary.reclaimable_space, 900);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let content = patterned(256, 3);
    write(dir.path(), "top.bin", &content);
    write(dir.path(), "sub/deeper/copy.bin", &content);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group.len(), 2);
    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.removable_count, 1);
}

#[test]
fn test_scan_is_deterministic() {
    let dir = tempdir().unwrap();
    let content = patterned(512, 4);
    for name in ["m.bin", "a/z.bin", "b.bin", "a/c.bin", "q/r/s.bin"] {
        write(dir.path(), name, &content);
    }

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(removal_list(&first), removal_list(&second));
    assert_eq!(first[0].kept(), second[0].kept());
    assert_eq!(removal_list(&first).len(), 4);
}

#[test]
fn test_scan_same_size_different_content() {
    let dir = tempdir().unwrap();
    write(dir.path(), "x.bin", &patterned(400, 5));
    write(dir.path(), "y.bin", &patterned(400, 6));

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.unique_signatures, 2);
    assert_eq!(summary.duplicate_count, 0);
}

#[test]
fn test_scan_multiple_ignore_patterns() {
    let dir = tempdir().unwrap();
    let content = patterned(200, 7);
    write(dir.path(), "test.tmp", &content);
    write(dir.path(), "test.log", &content);
    write(dir.path(), "keep.bin", &content);
    write(dir.path(), "keep2.bin", &content);
    write(dir.path(), "ignored/file.bin", &content);

    let walker_config = WalkerConfig::default().with_patterns(vec![
        "*.tmp".to_string(),
        "*.log".to_string(),
        "ignored/**".to_string(),
    ]);
    let finder_config = FinderConfig::default().with_walker_config(walker_config);
    let finder = DuplicateFinder::new(finder_config);

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.file_count, 2);
    assert_eq!(removal_list(&groups), vec![dir.path().join("keep2.bin")]);
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    let content = patterned(200, 8);
    write(dir.path(), "visible.bin", &content);
    write(dir.path(), ".hidden.bin", &content);
    write(dir.path(), ".cache/inner.bin", &content);

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        skip_hidden: true,
        ..Default::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.file_count, 1);
}

#[test]
fn test_scan_interrupted_before_start() {
    let dir = tempdir().unwrap();
    let content = patterned(200, 9);
    write(dir.path(), "a.bin", &content);
    write(dir.path(), "b.bin", &content);

    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));

    assert!(matches!(
        finder.find_duplicates(dir.path()),
        Err(FinderError::Interrupted)
    ));
}
