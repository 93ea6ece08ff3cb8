//! Tests for the progress store (files in a temp dir).

use std::sync::Arc;

use super::{ProgressSet, ProgressStore, RatingResult};

fn rec(index: usize, key: &str, value: Option<f64>) -> RatingResult {
    RatingResult::new(index, key, value)
}

#[test]
fn load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProgressStore::new(dir.path().join("none_progress.csv"));
    let set = store.load().unwrap();
    assert!(set.is_empty());
    assert_eq!(store.append_count(), 0);
}

#[test]
fn append_then_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProgressStore::new(dir.path().join("movies_progress.csv"));
    store
        .append(&[rec(1, "Heat", Some(8.3)), rec(0, "Nothing, Really", None)])
        .unwrap();
    let total = store.append(&[rec(2, "Alien", Some(8.5))]).unwrap();
    assert_eq!(total, 3);
    assert_eq!(store.append_count(), 2);

    let set = store.load().unwrap();
    let got: Vec<_> = set.iter().cloned().collect();
    assert_eq!(
        got,
        vec![
            rec(0, "Nothing, Really", None),
            rec(1, "Heat", Some(8.3)),
            rec(2, "Alien", Some(8.5)),
        ]
    );
}

#[test]
fn file_format_has_expected_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x_progress.csv");
    let store = ProgressStore::new(&path);
    store
        .append(&[rec(0, "A", Some(7.1)), rec(1, "B", None)])
        .unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "Index,Title,Rating\n0,A,7.1\n1,B,\n");
    assert!(!dir.path().join("x_progress.csv.tmp").exists());
}

#[test]
fn loads_file_written_by_other_tools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_progress.csv");
    // Column order differs and index 1 appears twice.
    std::fs::write(
        &path,
        "Title,Index,Rating\nFirst,0,6.5\nOld,1,\nNew,1,7.0\n",
    )
    .unwrap();
    let store = ProgressStore::new(&path);
    let set = store.load().unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.duplicates(), 1);
    assert_eq!(set.get(1), Some(&rec(1, "New", Some(7.0))));

    store.append(&[rec(2, "Third", None)]).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "Index,Title,Rating\n0,First,6.5\n1,New,7.0\n2,Third,\n");
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad_progress.csv");
    std::fs::write(&path, "Index,Title,Rating\nnot-a-number,X,1.0\n").unwrap();
    let store = ProgressStore::new(&path);
    let err = store.load().unwrap_err();
    assert!(format!("{:#}", err).contains("parse progress file"));
    // Appending must not clobber the unreadable file either.
    assert!(store.append(&[rec(0, "X", None)]).is_err());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("not-a-number"));
}

#[test]
fn appends_overwrite_same_index() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProgressStore::new(dir.path().join("p.csv"));
    store.append(&[rec(3, "Retry me", None)]).unwrap();
    store.append(&[rec(3, "Retry me", Some(6.0))]).unwrap();
    let set = store.load().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.get(3).unwrap().value, Some(6.0));
}

#[test]
fn concurrent_appends_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ProgressStore::new(dir.path().join("c_progress.csv")));
    let workers = 8;
    let per_batch = 5;
    let batches_per_worker = 4;

    let handles: Vec<_> = (0..workers)
        .map(|w| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for b in 0..batches_per_worker {
                    let base = (w * batches_per_worker + b) * per_batch;
                    let batch: Vec<_> = (base..base + per_batch)
                        .map(|i| rec(i, &format!("title {i}"), Some(i as f64 / 10.0)))
                        .collect();
                    store.append(&batch).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let set = store.load().unwrap();
    assert_eq!(set.len(), workers * batches_per_worker * per_batch);
    assert_eq!(set.duplicates(), 0);
    assert_eq!(store.append_count(), workers * batches_per_worker);
}

#[test]
fn processed_indices_respects_retry_misses() {
    let set: ProgressSet = vec![
        rec(0, "a", Some(1.0)),
        rec(1, "b", None),
        rec(4, "c", Some(2.0)),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        set.processed_indices(false).into_iter().collect::<Vec<_>>(),
        vec![0, 1, 4]
    );
    assert_eq!(
        set.processed_indices(true).into_iter().collect::<Vec<_>>(),
        vec![0, 4]
    );
    assert_eq!(set.misses(), 1);
}
