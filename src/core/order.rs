use hashbrown::HashMap;

use crate::{favorite::OrderUpdate, types::FavoriteId};

/// Pairs each key with its zero-based position.
pub fn densify<K: Copy>(keys: &[K]) -> Vec<(K, u32)> {
    keys.iter()
        .enumerate()
        .map(|(rank, key)| (*key, rank as u32))
        .collect()
}

/// True iff `ranks` is exactly `{0, ..., n-1}` in any order.
pub fn is_dense<I: IntoIterator<Item = u32>>(ranks: I) -> bool {
    let mut ranks: Vec<u32> = ranks.into_iter().collect();
    ranks.sort_unstable();
    ranks.iter().enumerate().all(|(idx, rank)| *rank as usize == idx)
}

/// Folds updates so each record appears once, keeping first-seen order.
pub fn merge_updates(updates: Vec<OrderUpdate>) -> Vec<OrderUpdate> {
    let mut pos: HashMap<FavoriteId, usize> = HashMap::new();
    let mut out: Vec<OrderUpdate> = Vec::with_capacity(updates.len());
    for update in updates {
        match pos.get(&update.id) {
            Some(idx) => {
                let slot = &mut out[*idx];
                if update.order.is_some() {
                    slot.order = update.order;
                }
                if update.favorite_order.is_some() {
                    slot.favorite_order = update.favorite_order;
                }
            }
            None => {
                pos.insert(update.id, out.len());
                out.push(update);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn densify_ranks_by_position() {
        assert_eq!(densify(&[30u64, 10, 20]), vec![(30, 0), (10, 1), (20, 2)]);
        assert!(densify::<u64>(&[]).is_empty());
    }

    #[test]
    fn dense_detection() {
        assert!(is_dense([]));
        assert!(is_dense([2, 0, 1]));
        assert!(!is_dense([0, 2]));
        assert!(!is_dense([0, 0, 1]));
        assert!(!is_dense([1]));
    }

    #[test]
    fn merge_combines_both_ranks() {
        let merged = merge_updates(vec![
            OrderUpdate { id: 1, order: Some(0), favorite_order: None },
            OrderUpdate { id: 2, order: None, favorite_order: Some(0) },
            OrderUpdate { id: 1, order: None, favorite_order: Some(1) },
        ]);
        assert_eq!(
            merged,
            vec![
                OrderUpdate { id: 1, order: Some(0), favorite_order: Some(1) },
                OrderUpdate { id: 2, order: None, favorite_order: Some(0) },
            ]
        );
    }
}
