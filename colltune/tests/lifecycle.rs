//! End-to-end lifecycle tests: init → get_coll_info* → destroy against the
//! default-sized pool.

use std::sync::Arc;

use colltune::{
    Algorithm, CollChoice, CollRequest, CollType, ContextHandle, ErrorKind, Protocol,
    RecordingSink, Tuner, TunerConfig, TunerError,
};

fn default_tuner() -> Tuner {
    Tuner::new(TunerConfig::default()).unwrap()
}

fn preset_choice() -> CollChoice {
    CollChoice {
        algorithm: Algorithm::Ring.as_raw(),
        protocol: Protocol::Simple.as_raw(),
        n_channels: 16,
    }
}

// ============================================================================
// Context pool
// ============================================================================

#[test]
fn test_1024_sessions_then_exhausted() {
    let tuner = default_tuner();
    let handles: Vec<ContextHandle> = (0..1024)
        .map(|i| tuner.init(i + 1, 1, None).unwrap())
        .collect();
    assert_eq!(tuner.pool().in_use().unwrap(), 1024);

    let err = tuner.init(1, 1, None).unwrap_err();
    assert!(matches!(err, TunerError::PoolExhausted { capacity: 1024 }));
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);

    // Free one in the middle; first-fit hands that exact slot back.
    tuner.destroy(handles[517]).unwrap();
    let again = tuner.init(9, 9, None).unwrap();
    assert_eq!(again.index(), 517);
    assert_eq!(tuner.pool().in_use().unwrap(), 1024);
}

#[test]
fn test_zero_ranks_is_invalid_input() {
    let tuner = default_tuner();
    for n_nodes in [0, 1, 16, 1000] {
        let err = tuner.init(0, n_nodes, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert_eq!(tuner.pool().in_use().unwrap(), 0);
}

#[test]
fn test_zero_nodes_allowed() {
    let tuner = default_tuner();
    let h = tuner.init(4, 0, None).unwrap();
    assert_eq!(tuner.pool().lookup(h).unwrap().n_nodes, 0);
}

#[test]
fn test_reallocated_slot_has_no_stale_data() {
    let tuner = default_tuner();
    let sink = RecordingSink::new();
    let first = tuner.init(256, 32, Some(sink.clone())).unwrap();
    tuner.destroy(first).unwrap();

    let second = tuner.init(2, 1, None).unwrap();
    assert_eq!(second.index(), first.index());
    let ctx = tuner.pool().lookup(second).unwrap();
    assert_eq!(ctx.n_ranks, 2);
    assert_eq!(ctx.n_nodes, 1);
    assert!(ctx.sink().is_none());

    // The old communicator's sink hears nothing about the new one.
    sink.clear();
    let mut choice = preset_choice();
    tuner
        .get_coll_info(second, &CollRequest::new(CollType::AllReduce, 8), &mut choice)
        .unwrap();
    assert!(sink.records().is_empty());
}

// ============================================================================
// Decision function
// ============================================================================

#[test]
fn test_threshold_boundaries() {
    let tuner = default_tuner();
    let big = tuner.init(128, 16, None).unwrap();
    let small = tuner.init(120, 15, None).unwrap();

    let run = |h, coll, n_bytes| {
        let mut choice = preset_choice();
        tuner
            .get_coll_info(h, &CollRequest::new(coll, n_bytes), &mut choice)
            .unwrap();
        choice
    };

    let forced = run(big, CollType::AllReduce, 64);
    assert_eq!(forced.algorithm, Algorithm::Tree.as_raw());
    assert_eq!(forced.protocol, Protocol::LL.as_raw());
    assert_eq!(forced.n_channels, 16);

    assert_eq!(run(big, CollType::AllReduce, 65), preset_choice());
    assert_eq!(run(small, CollType::AllReduce, 64), preset_choice());
    assert_eq!(run(big, CollType::Broadcast, 64), preset_choice());
    assert_eq!(run(big, CollType::ReduceScatter, 1), preset_choice());
}

#[test]
fn test_raw_null_handle_does_not_resolve() {
    assert!(ContextHandle::from_raw(0).is_none());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_init_destroy() {
    let tuner = Arc::new(Tuner::new(TunerConfig::default().with_max_contexts(64)).unwrap());

    std::thread::scope(|s| {
        for t in 0..8 {
            let tuner = Arc::clone(&tuner);
            s.spawn(move || {
                for round in 0..200 {
                    let h = tuner.init(t + 1, 16, None).unwrap();
                    let mut choice = preset_choice();
                    tuner
                        .get_coll_info(h, &CollRequest::new(CollType::AllReduce, 8), &mut choice)
                        .unwrap();
                    assert_eq!(choice.algorithm, Algorithm::Tree.as_raw());
                    // Nobody else may have claimed our slot in the meantime.
                    assert_eq!(tuner.pool().lookup(h).unwrap().n_ranks, t + 1, "round {round}");
                    tuner.destroy(h).unwrap();
                }
            });
        }
    });

    assert_eq!(tuner.pool().in_use().unwrap(), 0);
}

#[test]
fn test_concurrent_claims_are_distinct() {
    let tuner = Tuner::new(TunerConfig::default().with_max_contexts(256)).unwrap();

    let mut handles: Vec<ContextHandle> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    (0..32)
                        .map(|_| tuner.init(1, 1, None).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect()
    });

    handles.sort_by_key(|h| h.index());
    handles.dedup_by_key(|h| h.index());
    assert_eq!(handles.len(), 256);
    assert!(tuner.init(1, 1, None).is_err());
}
