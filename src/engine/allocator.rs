use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::model::*;

use super::store::SpotPool;

/// Min-heap of free spot ids for one class.
///
/// Entries are keys into the pool, not owners. A spot can change status after
/// it was admitted, so an entry may go stale; stale entries are discarded
/// when they surface in `take_best`, never searched for eagerly. A spot is
/// re-admitted whenever it returns to Free, so it may hold several entries;
/// the first one popped while the spot is Free wins and the rest go stale.
#[derive(Debug, Default)]
pub struct SpotHeap {
    heap: BinaryHeap<Reverse<SpotId>>,
}

impl SpotHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert if the spot is currently Free; no-op otherwise.
    pub fn admit(&mut self, spot: &Spot) {
        if spot.status != SpotStatus::Free {
            return;
        }
        self.heap.push(Reverse(spot.id.clone()));
    }

    /// Pop the lowest free spot id, dropping stale entries on the way.
    pub fn take_best(&mut self, pool: &SpotPool) -> Option<SpotId> {
        while let Some(Reverse(id)) = self.heap.pop() {
            if pool.status(&id) == Some(SpotStatus::Free) {
                return Some(id);
            }
            tracing::trace!("discarding stale allocator entry {id}");
        }
        None
    }

    /// Heap size including stale entries: an upper bound on free spots.
    /// Use `SpotPool::free_counts` for the exact figure.
    pub fn pending_count(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_and_heap(n: u32) -> (SpotPool, SpotHeap) {
        let pool = SpotPool::layout(1, n, 0);
        let mut heap = SpotHeap::new();
        // Admit in reverse to show order comes from the key, not insertion.
        for spot in pool.iter().collect::<Vec<_>>().into_iter().rev() {
            heap.admit(spot);
        }
        (pool, heap)
    }

    #[test]
    fn take_best_yields_increasing_ids() {
        let (pool, mut heap) = pool_and_heap(4);
        let mut taken = Vec::new();
        while let Some(id) = heap.take_best(&pool) {
            taken.push(id);
        }
        let expected: Vec<_> = (1..=4).map(|i| SpotId::from_layout(1, i)).collect();
        assert_eq!(taken, expected);
    }

    #[test]
    fn admit_skips_non_free_spots() {
        let mut pool = SpotPool::layout(1, 2, 0);
        pool.set_status(&SpotId::from_layout(1, 1), SpotStatus::Held);
        let mut heap = SpotHeap::new();
        for spot in pool.iter() {
            heap.admit(spot);
        }
        assert_eq!(heap.pending_count(), 1);
    }

    #[test]
    fn stale_entries_discarded_on_extraction() {
        let (mut pool, mut heap) = pool_and_heap(3);
        pool.set_status(&SpotId::from_layout(1, 1), SpotStatus::Held);
        pool.set_status(&SpotId::from_layout(1, 2), SpotStatus::InUse);
        // Stale entries still counted until they surface.
        assert_eq!(heap.pending_count(), 3);

        assert_eq!(heap.take_best(&pool), Some(SpotId::from_layout(1, 3)));
        assert_eq!(heap.pending_count(), 0);
        assert_eq!(heap.take_best(&pool), None);
    }

    #[test]
    fn exhausted_heap_returns_none() {
        let pool = SpotPool::layout(1, 1, 0);
        let mut heap = SpotHeap::new();
        assert_eq!(heap.take_best(&pool), None);
    }
}
