//! Random rolls used by the battle resolver
//!
//! All rolls take an injected RNG so a seeded generator replays a battle.

use std::ops::RangeInclusive;

use rand::Rng;

/// Variance applied to a basic attack
pub const ATTACK_VARIANCE: RangeInclusive<f64> = 0.8..=1.2;

/// Variance applied to a special attack
pub const SPECIAL_VARIANCE: RangeInclusive<f64> = 1.2..=1.5;

/// Multiplier applied to a critical hit
pub const CRITICAL_MULTIPLIER: f64 = 1.5;

/// Scale a base value by a uniform draw from `variance`, truncating to an integer
pub fn scaled_roll<R: Rng + ?Sized>(base: f64, variance: RangeInclusive<f64>, rng: &mut R) -> u32 {
    let factor = rng.random_range(variance);
    truncate(base * factor)
}

/// Succeed with probability `chance` (clamped to 0..=1)
pub fn roll_chance<R: Rng + ?Sized>(chance: f64, rng: &mut R) -> bool {
    if chance <= 0.0 {
        return false;
    }
    rng.random_bool(chance.min(1.0))
}

/// Apply the critical multiplier to finalized damage
pub fn critical(damage: u32) -> u32 {
    truncate(damage as f64 * CRITICAL_MULTIPLIER)
}

/// Truncate a non-negative float toward zero
pub fn truncate(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scaled_roll_bounds() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let roll = scaled_roll(20.0, ATTACK_VARIANCE, &mut rng);
            assert!(roll >= 16, "Roll {} below minimum 16", roll);
            assert!(roll <= 24, "Roll {} above maximum 24", roll);
        }
    }

    #[test]
    fn test_special_bounds() {
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..1000 {
            let roll = scaled_roll(10.0, SPECIAL_VARIANCE, &mut rng);
            assert!((12..=15).contains(&roll), "Special roll {} out of range", roll);
        }
    }

    #[test]
    fn test_roll_chance_edges() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            assert!(!roll_chance(0.0, &mut rng));
            assert!(!roll_chance(-1.0, &mut rng));
            assert!(roll_chance(1.0, &mut rng));
            assert!(roll_chance(2.5, &mut rng));
        }
    }

    #[test]
    fn test_critical() {
        assert_eq!(critical(10), 15);
        assert_eq!(critical(7), 10);
        assert_eq!(critical(0), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(19.99), 19);
        assert_eq!(truncate(-3.0), 0);
        assert_eq!(truncate(f64::MAX), u32::MAX);
    }

    #[test]
    fn test_seeded_rolls_replay() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            assert_eq!(
                scaled_roll(33.0, ATTACK_VARIANCE, &mut a),
                scaled_roll(33.0, ATTACK_VARIANCE, &mut b)
            );
        }
    }
}
