//! Query cache tests: a hit must suppress the underlying fetch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quarry_core::errors::AccessError;
use quarry_core::types::{Params, Row, Value};
use quarry_engine::{AccessEngine, QueryCache};
use tempfile::TempDir;

fn ages_fixture() -> Vec<Row> {
    [28, 32, 45]
        .into_iter()
        .map(|age| Row::new(vec![Value::Integer(age)]))
        .collect()
}

#[test]
fn second_identical_call_returns_cached_rows_without_refetching() {
    let cache = QueryCache::unbounded();
    let calls = AtomicUsize::new(0);
    let statement = "SELECT age FROM users";

    let first = cache
        .get_or_fetch(statement, &Params::None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ages_fixture())
        })
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = cache
        .get_or_fetch(statement, &Params::None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ages_fixture())
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1, "hit must not run the fetch");
    assert_eq!(first, second);
    assert_eq!(
        second.iter().filter_map(|r| r.as_i64(0)).collect::<Vec<_>>(),
        vec![28, 32, 45]
    );
}

#[test]
fn named_parameter_order_does_not_split_the_cache() {
    let cache = QueryCache::unbounded();
    let calls = AtomicUsize::new(0);
    let statement = "SELECT * FROM users WHERE age BETWEEN :min AND :max";

    let forward = Params::named([(":min", Value::Integer(25)), (":max", Value::Integer(60))]);
    let backward = Params::named([(":max", Value::Integer(60)), (":min", Value::Integer(25))]);

    cache
        .get_or_fetch(statement, &forward, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ages_fixture())
        })
        .unwrap();
    cache
        .get_or_fetch(statement, &backward, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ages_fixture())
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn different_parameters_fetch_separately() {
    let cache = QueryCache::unbounded();
    let calls = AtomicUsize::new(0);
    let statement = "SELECT * FROM users WHERE id = ?1";

    for id in [1, 2, 1] {
        cache
            .get_or_fetch(statement, &Params::positional([Value::Integer(id)]), || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![Row::new(vec![Value::Integer(id)])])
            })
            .unwrap();
    }

    // Two distinct keys; the third call hits the first entry.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn fetch_failure_is_not_cached() {
    let cache = QueryCache::unbounded();
    let calls = AtomicUsize::new(0);
    let statement = "SELECT age FROM users";

    let err = cache
        .get_or_fetch(statement, &Params::None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AccessError::Execution {
                message: "source unavailable".to_string(),
            })
        })
        .unwrap_err();
    assert!(matches!(err, AccessError::Execution { .. }));

    cache
        .get_or_fetch(statement, &Params::None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ages_fixture())
        })
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2, "a failure must not pin the key");
}

#[test]
fn invalidation_forces_a_refetch() {
    let cache = QueryCache::unbounded();
    let calls = AtomicUsize::new(0);
    let statement = "SELECT age FROM users";
    let fetch = |calls: &AtomicUsize| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(ages_fixture())
    };

    cache.get_or_fetch(statement, &Params::None, || fetch(&calls)).unwrap();
    cache.get_or_fetch(statement, &Params::None, || fetch(&calls)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    cache.invalidate(statement, &Params::None);
    cache.get_or_fetch(statement, &Params::None, || fetch(&calls)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_readers_see_complete_entries() {
    let cache = Arc::new(QueryCache::unbounded());
    let calls = Arc::new(AtomicUsize::new(0));
    let statement = "SELECT age FROM users";

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        handles.push(std::thread::spawn(move || {
            cache
                .get_or_fetch(statement, &Params::None, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ages_fixture())
                })
                .unwrap()
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    // Concurrent misses may each fetch, but every reader gets a complete,
    // identical result.
    assert!(calls.load(Ordering::SeqCst) >= 1);
    for result in &results {
        assert_eq!(result.as_slice(), ages_fixture().as_slice());
    }
}

#[test]
fn engine_fetch_cached_skips_the_data_source_on_repeat() {
    let dir = TempDir::new().unwrap();
    let engine = AccessEngine::open(&dir.path().join("test.db")).unwrap();

    engine
        .run_in_transaction(|session| {
            session.run_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, age INTEGER)")?;
            for age in [28, 32, 45] {
                session.run(
                    "INSERT INTO users (age) VALUES (?1)",
                    &Params::positional([Value::Integer(age)]),
                )?;
            }
            Ok(())
        })
        .unwrap();

    let statement = "SELECT age FROM users ORDER BY id";
    let first = engine.fetch_cached(statement, &Params::None).unwrap();
    assert_eq!(first.len(), 3);

    // Mutate underneath the cache; the repeat call must serve the stored
    // result, proving the fetch never re-ran.
    engine
        .run_in_transaction(|session| session.run("DELETE FROM users", &Params::None))
        .unwrap();
    let second = engine.fetch_cached(statement, &Params::None).unwrap();
    assert_eq!(first, second);

    // Explicit invalidation is the way entries leave the cache.
    engine.invalidate_cached(statement, &Params::None);
    let third = engine.fetch_cached(statement, &Params::None).unwrap();
    assert!(third.is_empty());
}
