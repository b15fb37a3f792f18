use super::*;
use crate::domain::SnodeTarget;
use rand::rngs::OsRng;

fn snode(n: u8) -> SnodeTarget {
    SnodeTarget::new(format!("https://10.0.0.{n}"), 22021)
}

// =========================================================================
// TEST GROUP 1: Failure counting
// =========================================================================

#[test]
fn test_failures_accumulate_until_threshold() {
    let mut counter = FailureCounter::new(3);
    let target = snode(1);

    assert_eq!(counter.record_failure(&target), FailureOutcome::Counted(1));
    assert_eq!(counter.record_failure(&target), FailureOutcome::Counted(2));
    assert_eq!(
        counter.record_failure(&target),
        FailureOutcome::ThresholdReached
    );
    assert_eq!(counter.count(&target), 3);

    counter.reset(&target);
    assert_eq!(counter.count(&target), 0);
}

#[test]
fn test_failures_are_per_target() {
    let mut counter = FailureCounter::new(3);
    counter.record_failure(&snode(1));
    counter.record_failure(&snode(1));
    counter.record_failure(&snode(2));

    assert_eq!(counter.count(&snode(1)), 2);
    assert_eq!(counter.count(&snode(2)), 1);
    assert_eq!(counter.count(&snode(3)), 0);
}

#[test]
fn test_zero_threshold_is_raised_to_one() {
    let mut counter = FailureCounter::new(0);
    assert_eq!(counter.threshold(), 1);
    assert_eq!(
        counter.record_failure(&snode(1)),
        FailureOutcome::ThresholdReached
    );
}

// =========================================================================
// TEST GROUP 2: Pool selection
// =========================================================================

#[test]
fn test_empty_pool_yields_nothing() {
    let pool = SnodePool::new();
    assert!(pool.choose(&mut OsRng, None).is_none());
}

#[test]
fn test_choose_honours_exclusion() {
    let mut pool = SnodePool::new();
    pool.replace([snode(1), snode(2)]);

    for _ in 0..20 {
        let chosen = pool.choose(&mut OsRng, Some(&snode(1))).unwrap();
        assert_eq!(chosen, snode(2));
    }
}

#[test]
fn test_only_excluded_snode_yields_nothing() {
    let mut pool = SnodePool::new();
    pool.replace([snode(1)]);
    assert!(pool.choose(&mut OsRng, Some(&snode(1))).is_none());
}

#[test]
fn test_remove_is_idempotent() {
    let mut pool = SnodePool::new();
    pool.replace([snode(1), snode(2)]);

    assert!(pool.remove(&snode(1)));
    assert!(!pool.remove(&snode(1)));
    assert_eq!(pool.len(), 1);
    assert!(!pool.contains(&snode(1)));
}
