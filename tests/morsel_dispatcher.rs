use std::sync::Mutex;

use halo_frontier::gds::{FrontierMorsel, FrontierMorselDispatcher};
use halo_frontier::FrontierConfig;
use proptest::prelude::*;

fn dispatcher(threads: usize, floor: u64, min_morsels: u64) -> FrontierMorselDispatcher {
    FrontierMorselDispatcher::new(&FrontierConfig {
        max_threads: threads,
        min_frontier_morsel_size: floor,
        min_number_of_frontier_morsels: min_morsels,
        ..FrontierConfig::default()
    })
}

fn assert_partition(mut morsels: Vec<FrontierMorsel>, max_offset: u64) {
    morsels.sort_unstable_by_key(FrontierMorsel::begin);
    let mut next = 0;
    for m in &morsels {
        assert_eq!(m.begin(), next, "gap or overlap at {next}");
        assert!(!m.is_empty());
        next = m.end();
    }
    assert_eq!(next, max_offset);
}

#[test]
fn concurrent_claims_partition_the_range() {
    const MAX_OFFSET: u64 = 1_000_003;
    let d = dispatcher(8, 64, 1);
    d.init(MAX_OFFSET);
    let claimed = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let mut local = Vec::new();
                while let Some(m) = d.get_next_range_morsel() {
                    local.push(m);
                }
                claimed.lock().unwrap().extend(local);
            });
        }
    });

    assert_partition(claimed.into_inner().unwrap(), MAX_OFFSET);
}

#[test]
fn default_floor_with_four_threads() {
    let d = FrontierMorselDispatcher::new(&FrontierConfig::default().with_threads(4));
    d.init(1000);
    let min_morsels = FrontierConfig::MIN_NUMBER_OF_FRONTIER_MORSELS.max(16);
    let expected = FrontierConfig::MIN_FRONTIER_MORSEL_SIZE.max(1000 / min_morsels);
    assert_eq!(d.morsel_size(), expected);
    let total: u64 = std::iter::from_fn(|| d.get_next_range_morsel()).map(|m| m.len()).sum();
    assert_eq!(total, 1000);
}

proptest! {
    #[test]
    fn morsels_cover_range_exactly(
        max_offset in 0u64..200_000,
        threads in 1usize..64,
        floor in 1u64..2_000,
        min_morsels in 1u64..256,
    ) {
        let d = dispatcher(threads, floor, min_morsels);
        d.init(max_offset);
        let morsels: Vec<_> = std::iter::from_fn(|| d.get_next_range_morsel()).collect();
        prop_assert!(morsels.iter().all(|m| m.len() <= d.morsel_size()));
        prop_assert!(d.morsel_size() >= floor);
        assert_partition(morsels, max_offset);
        prop_assert!(d.get_next_range_morsel().is_none());
    }

    #[test]
    fn more_threads_never_grow_morsels(
        max_offset in 0u64..10_000_000,
        threads in 1usize..256,
        floor in 1u64..4_096,
    ) {
        let few = dispatcher(threads, floor, 1);
        let many = dispatcher(threads + 1, floor, 1);
        few.init(max_offset);
        many.init(max_offset);
        prop_assert!(many.morsel_size() <= few.morsel_size());
        prop_assert!(many.morsel_size() >= floor);
    }
}
