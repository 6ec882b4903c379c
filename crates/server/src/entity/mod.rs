//! Game entities (squares and their bullets).
//!
//! Players and bots share one state model; the only differences are the
//! `is_bot` flag and whether a network link is attached.

mod bullet;
mod square;

pub use bullet::Bullet;
pub use square::{
    COLOR_CYCLE_INTERVAL, INVULNERABILITY_WINDOW, RELOAD_DELAY, Regeneration, SharedSquare,
    Square, random_bright_color,
};

use rand::Rng;

/// Identifier of a square or obstacle. Always fits in 63 bits.
pub type EntityId = u64;

/// Draw a random 63-bit id that `taken` does not already claim.
///
/// Ids are rejection-sampled against the live set, so uniqueness only holds
/// while that set is tiny compared to the id space.
pub fn unique_id<R, F>(rng: &mut R, taken: F) -> EntityId
where
    R: Rng + ?Sized,
    F: Fn(EntityId) -> bool,
{
    loop {
        let id = rng.random::<u64>() & i64::MAX as u64;
        if !taken(id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_ids_fit_in_63_bits() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1_000 {
            assert!(unique_id(&mut rng, |_| false) <= i64::MAX as u64);
        }
    }

    #[test]
    fn test_taken_ids_are_skipped() {
        let mut rng = StdRng::seed_from_u64(4);
        let first = unique_id(&mut rng.clone(), |_| false);

        let taken: HashSet<EntityId> = [first].into_iter().collect();
        let second = unique_id(&mut rng, |id| taken.contains(&id));
        assert_ne!(first, second);
    }
}
