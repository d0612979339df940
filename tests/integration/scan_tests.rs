use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::tempdir;
use twinscan::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig};
use twinscan::scanner::{ContentDigest, DigestValue, Hasher, IgnoreRules, JenkinsDigest, WalkerConfig};

/// Digest wrapper that counts calls.
#[derive(Default)]
struct CountingDigest {
    calls: AtomicUsize,
}

impl ContentDigest for CountingDigest {
    fn digest(&self, bytes: &[u8]) -> DigestValue {
        self.calls.fetch_add(1, Ordering::SeqCst);
        JenkinsDigest.digest(bytes)
    }
}

/// Maps every input to one digest, so any two same-size files collide.
struct CollidingDigest;

impl ContentDigest for CollidingDigest {
    fn digest(&self, _bytes: &[u8]) -> DigestValue {
        [0xdead_beef; 8]
    }
}

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn recursive() -> FinderConfig {
    FinderConfig::default().with_walker_config(WalkerConfig::default().with_recurse(true))
}

fn scan(config: FinderConfig, root: &Path) -> Vec<DuplicateGroup> {
    DuplicateFinder::new(config)
        .find_duplicates(&[root.to_path_buf()])
        .unwrap()
        .0
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (groups, summary) = DuplicateFinder::new(recursive())
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_same_size_pair_and_outsider() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"hello");
    let b = write(dir.path(), "b", b"hello");
    write(dir.path(), "c", b"world");

    let groups = scan(recursive(), dir.path());

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![a, b]);
    assert_eq!(groups[0].size, 5);
}

#[test]
fn test_engineered_collision_is_not_grouped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one", b"0123456789");
    write(dir.path(), "two", b"abcdefghij");
    write(dir.path(), "three", b"ABCDEFGHIJ");

    let config = recursive().with_hasher(Hasher::new().with_digest(Arc::new(CollidingDigest)));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.hashed_files, 3);
    assert_eq!(summary.mismatches, 3);
}

#[test]
fn test_empty_files_grouped_without_hashing() {
    let dir = tempdir().unwrap();
    let e1 = write(dir.path(), "empty1", b"");
    let e2 = write(dir.path(), "empty2", b"");
    let e3 = write(dir.path(), "empty3", b"");
    write(dir.path(), "x", b"1");
    write(dir.path(), "y", b"22");

    let counting = Arc::new(CountingDigest::default());
    let config = recursive().with_hasher(Hasher::new().with_digest(counting.clone()));
    let groups = scan(config, dir.path());

    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![e1, e2, e3]);
    assert_eq!(groups[0].size, 0);
}

#[test]
fn test_pairs_never_hashed() {
    let dir = tempdir().unwrap();
    write(dir.path(), "same1", b"twin");
    write(dir.path(), "same2", b"twin");
    write(dir.path(), "diff1", b"left!");
    write(dir.path(), "diff2", b"rite!");

    let counting = Arc::new(CountingDigest::default());
    let config = recursive().with_hasher(Hasher::new().with_digest(counting.clone()));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 4);
    assert_eq!(summary.comparisons, 2);
}

#[test]
fn test_singleton_size_never_hashed_or_compared() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"1");
    write(dir.path(), "b", b"22");
    write(dir.path(), "c", b"333");

    let counting = Arc::new(CountingDigest::default());
    let config = recursive().with_hasher(Hasher::new().with_digest(counting.clone()));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    assert_eq!(summary.comparisons, 0);
    assert_eq!(summary.eliminated_by_size, 3);
}

#[test]
fn test_directory_without_recursion_yields_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "only", b"visible");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_ignored_name_removes_twin() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep.txt", b"twin content");
    write(dir.path(), "skip.txt", b"twin content");

    let walker = WalkerConfig::default()
        .with_recurse(true)
        .with_ignore(IgnoreRules::new().with_names(["skip.txt"]));
    let (groups, summary) = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker))
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_nested_directories_and_multiple_roots() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let nested = first.path().join("deep").join("er");
    fs::create_dir_all(&nested).unwrap();

    let a = write(&nested, "a.bin", b"shared bytes");
    let b = write(second.path(), "b.bin", b"shared bytes");

    let (groups, _) = DuplicateFinder::new(recursive())
        .find_duplicates(&[first.path().to_path_buf(), second.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    let mut files = groups[0].files.clone();
    files.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(files, expected);
}

#[test]
fn test_file_roots_without_recursion() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"same");
    let b = write(dir.path(), "b", b"same");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[b.clone(), a.clone()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![a, b]);
}

#[test]
fn test_min_size_excludes_small_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "s1", b"tiny");
    write(dir.path(), "s2", b"tiny");
    write(dir.path(), "l1", b"large enough");
    write(dir.path(), "l2", b"large enough");

    let walker = WalkerConfig::default().with_recurse(true).with_min_size(5);
    let groups = scan(FinderConfig::default().with_walker_config(walker), dir.path());

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 12);
}

#[test]
fn test_groups_of_several_contents_in_one_bucket() {
    let dir = tempdir().unwrap();
    let a1 = write(dir.path(), "a1", b"AAAA");
    let a2 = write(dir.path(), "a2", b"AAAA");
    let b1 = write(dir.path(), "b1", b"BBBB");
    let b2 = write(dir.path(), "b2", b"BBBB");
    let b3 = write(dir.path(), "b3", b"BBBB");
    write(dir.path(), "c1", b"CCCC");

    let mut groups = scan(recursive(), dir.path());
    groups.sort_by(|x, y| x.files.cmp(&y.files));

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].files, vec![a1, a2]);
    assert_eq!(groups[1].files, vec![b1, b2, b3]);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        write(dir.path(), &format!("dup{i}"), b"repeated");
        write(dir.path(), &format!("uniq{i}"), format!("unique-{i}").as_bytes());
    }
    write(dir.path(), "pair1", b"xy");
    write(dir.path(), "pair2", b"xy");

    let first = scan(recursive(), dir.path());
    let second = scan(recursive(), dir.path());

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_hard_links_reported_as_duplicates() {
    let dir = tempdir().unwrap();
    let original = write(dir.path(), "original", b"linked data");
    let link = dir.path().join("second-name");
    fs::hard_link(&original, &link).unwrap();

    let groups = scan(recursive(), dir.path());

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![original, link]);
}
