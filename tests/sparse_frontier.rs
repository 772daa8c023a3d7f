use halo_frontier::gds::{FrontierPair, PathLengths, SinglePathLengths, SparseFrontier};
use halo_frontier::{FrontierConfig, NodeId, NumNodesMap, SystemAllocator};
use proptest::prelude::*;

fn disabled() -> SparseFrontier {
    let f = SparseFrontier::new(1);
    f.pin_table_id(0);
    f.add_node(0);
    f.check_sample_size();
    assert!(!f.enabled());
    f
}

#[test]
fn merging_disabled_into_enabled_disables_receiver() {
    let receiver = SparseFrontier::new(100);
    receiver.pin_table_id(0);
    receiver.add_node(3);
    receiver.merge_sparse_frontier(&disabled());
    assert!(!receiver.enabled());
}

#[test]
fn merging_enabled_into_disabled_is_noop() {
    let receiver = disabled();
    let before = receiver.offsets(0);
    let other = SparseFrontier::new(100);
    other.pin_table_id(0);
    other.add_node(42);
    receiver.merge_sparse_frontier(&other);
    assert!(!receiver.enabled());
    assert_eq!(receiver.offsets(0), before);
    assert!(other.enabled());
}

#[test]
fn pair_propagates_local_disablement() {
    let cfg = FrontierConfig::default().with_threads(2);
    let map: NumNodesMap = [(0, 16)].into_iter().collect();
    let pl = PathLengths::get_frontier(&cfg, &map, &SystemAllocator, PathLengths::UNVISITED)
        .unwrap();
    let mut pair = FrontierPair::new(SinglePathLengths::new(pl), &cfg);
    pair.init_source(NodeId::new(0, 0));
    pair.begin_new_iteration();
    pair.begin_frontier_compute_between_tables(0, 0);

    pair.merge_local_frontier(&disabled());
    assert!(!pair.next_sparse_frontier().enabled());

    let late = SparseFrontier::new(100);
    late.pin_table_id(0);
    late.add_node(9);
    pair.merge_local_frontier(&late);
    assert!(!pair.next_sparse_frontier().enabled());
    assert!(pair.next_sparse_frontier().offsets(0).is_empty());
}

#[derive(Debug, Clone)]
enum Op {
    Add(u64),
    Check,
    MergeEnabled(Vec<u64>),
    MergeDisabled,
    Reset,
}

proptest! {
    #[test]
    fn disablement_is_monotone(
        sample_size in 1usize..16,
        ops in proptest::collection::vec(
            prop_oneof![
                (0u64..64).prop_map(Op::Add),
                Just(Op::Check),
                proptest::collection::vec(0u64..64, 0..8).prop_map(Op::MergeEnabled),
                Just(Op::MergeDisabled),
                Just(Op::Reset),
            ],
            1..64
        ),
    ) {
        let f = SparseFrontier::new(sample_size);
        f.pin_table_id(0);
        let mut was_disabled = false;
        for op in ops {
            match op {
                Op::Add(o) => f.add_node(o),
                Op::Check => f.check_sample_size(),
                Op::MergeEnabled(offsets) => {
                    let other = SparseFrontier::new(usize::MAX);
                    other.pin_table_id(0);
                    for o in offsets {
                        other.add_node(o);
                    }
                    f.merge_sparse_frontier(&other);
                }
                Op::MergeDisabled => f.merge_sparse_frontier(&disabled()),
                Op::Reset => {
                    f.reset_state();
                    f.pin_table_id(0);
                }
            }
            if was_disabled {
                prop_assert!(!f.enabled());
            }
            was_disabled = !f.enabled();
        }
    }
}
