use rand::Rng;
use rand::seq::SliceRandom;

/// Uniformly shuffles a copy of `pool` and keeps the first `size` items.
///
/// `size >= pool.len()` yields the whole pool, shuffled.
pub fn draw_sample<T, R>(pool: &[T], size: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let mut drawn = pool.to_vec();
    drawn.shuffle(rng);
    drawn.truncate(size);
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn sample_is_distinct_subset_of_requested_size() {
        let pool: Vec<u32> = (0..5).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let drawn = draw_sample(&pool, 3, &mut rng);

        assert_eq!(drawn.len(), 3);
        let unique: HashSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(drawn.iter().all(|q| pool.contains(q)));
    }

    #[test]
    fn oversized_request_returns_whole_pool() {
        let pool = vec!['a', 'b', 'c'];
        let mut rng = StdRng::seed_from_u64(1);
        let mut drawn = draw_sample(&pool, 10, &mut rng);
        drawn.sort_unstable();
        assert_eq!(drawn, pool);
    }

    #[test]
    fn same_seed_same_sample() {
        let pool: Vec<u32> = (0..20).collect();
        let a = draw_sample(&pool, 5, &mut StdRng::seed_from_u64(42));
        let b = draw_sample(&pool, 5, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let pool: Vec<u32> = Vec::new();
        assert!(draw_sample(&pool, 3, &mut StdRng::seed_from_u64(0)).is_empty());
    }
}
