//! Backpressure behavior between a fast and a slow producer.
//!
//! A fast counter feeds slot 0 of a zip node, a counter that only produces
//! every other tick feeds slot 1. The fast producer's policy decides what
//! reaches the zip while it waits on the slow side:
//!
//! - **Block**: the fast producer skips ticks, nothing is lost
//! - **Drop**: values arriving at a busy slot are discarded
//! - **Replace**: the newest value overwrites the one waiting in the slot
//!
//! The `prop_tests` module checks these properties for random stream lengths.


use rivulet_stream::prelude::*;
use test_utils::{fast_slow_zip, pairs};

fn zipped(policy: Backpressure, fast: usize, slow: usize) -> Vec<(i64, i64)> {
    let mut graph = Graph::new();
    let zip = fast_slow_zip(&mut graph, policy, fast, slow);
    let output = rivulet_stream::run(&mut graph, zip).unwrap();
    pairs(&output)
}

/// With Block, every fast value is paired with the slow value of the same
/// position.
#[test]
fn block_is_lossless() {
    assert_eq!(
        zipped(Backpressure::Block, 4, 4),
        vec![(0, 0), (1, 1), (2, 2), (3, 3)]
    );
}

/// With Drop, the value produced while the slot is busy is lost.
#[test]
fn drop_discards_while_slot_is_busy() {
    assert_eq!(
        zipped(Backpressure::Drop, 8, 3),
        vec![(0, 0), (2, 1), (4, 2)]
    );
}

/// With Replace, the waiting value is overwritten by the newest one.
#[test]
fn replace_keeps_newest_value() {
    assert_eq!(
        zipped(Backpressure::Replace, 8, 3),
        vec![(1, 0), (3, 1), (5, 2)]
    );
}

/// A blocked producer reports its skipped ticks.
#[tokio::test]
async fn blocked_ticks_are_observable() {
    let mut graph = Graph::new();
    let zip = fast_slow_zip(&mut graph, Backpressure::Block, 3, 3);
    let fast = graph.node(zip).unwrap().upstream()[0];

    let executor = StreamExecutor::new();
    let blocked = std::sync::Arc::new(parking_lot::Mutex::new(0usize));
    let counter = std::sync::Arc::clone(&blocked);
    executor
        .hooks()
        .register_observer::<OnNodeBlocked, _>("count_blocked", move |event| {
            if event.node_id() == Some(fast) {
                *counter.lock() += 1;
            }
        })
        .unwrap();

    executor.run(&mut graph, zip).await.unwrap();

    assert!(*blocked.lock() > 0);
}

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_increasing(firsts: &[i64]) -> Result<(), TestCaseError> {
        for window in firsts.windows(2) {
            prop_assert!(window[0] < window[1], "not increasing: {firsts:?}");
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Block delivers every value in order and stops with the shorter
        /// stream.
        #[test]
        fn block_pairs_positions(fast in 0usize..12, slow in 0usize..12) {
            let expected: Vec<(i64, i64)> = (0..fast.min(slow) as i64).map(|i| (i, i)).collect();
            prop_assert_eq!(zipped(Backpressure::Block, fast, slow), expected);
        }

        /// Drop and Replace never reorder, never duplicate, and never lose a
        /// value from the blocking side.
        #[test]
        fn lossy_policies_preserve_order(
            replace in any::<bool>(),
            fast in 0usize..16,
            slow in 0usize..8,
        ) {
            let policy = if replace { Backpressure::Replace } else { Backpressure::Drop };
            let output = zipped(policy, fast, slow);

            prop_assert!(output.len() <= fast.min(slow));
            let firsts: Vec<i64> = output.iter().map(|(a, _)| *a).collect();
            assert_increasing(&firsts)?;
            prop_assert!(firsts.iter().all(|&a| a < fast as i64));

            let seconds: Vec<i64> = output.iter().map(|(_, b)| *b).collect();
            let expected: Vec<i64> = (0..output.len() as i64).collect();
            prop_assert_eq!(seconds, expected);
        }
    }
}
