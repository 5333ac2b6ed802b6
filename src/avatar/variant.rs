//! Avatar model variants and the roll that picks between them.

use rand::Rng;
use serde::Serialize;

use crate::ALTERNATE_VARIANT_THRESHOLD;

/// Visual model used for an avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AvatarVariant {
    /// Default walking figure.
    Walker,
    /// Rare upright alligator, drawn larger.
    Alligator,
}

impl AvatarVariant {
    /// Maps a uniform roll in `[0, 1)` to a variant.
    ///
    /// Rolls strictly above the threshold give the alternate model, so
    /// roughly one avatar in ten is an alligator.
    #[must_use]
    pub const fn from_roll(roll: f64) -> Self {
        if roll > ALTERNATE_VARIANT_THRESHOLD {
            Self::Alligator
        } else {
            Self::Walker
        }
    }

    /// Rolls a variant with the given random source.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_roll(rng.random::<f64>())
    }

    /// Asset path of the glTF model, relative to the asset root.
    #[must_use]
    pub const fn model_path(self) -> &'static str {
        match self {
            Self::Walker => "man-walk2.glb",
            Self::Alligator => "alligator_walking_upright.glb",
        }
    }

    /// Uniform scale applied to the model.
    #[must_use]
    pub const fn scale(self) -> f32 {
        match self {
            Self::Walker => 1.5,
            Self::Alligator => 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case::low(0.0, AvatarVariant::Walker)]
    #[case::at_threshold(0.9, AvatarVariant::Walker)]
    #[case::above_threshold(0.900_001, AvatarVariant::Alligator)]
    #[case::high(0.999, AvatarVariant::Alligator)]
    fn roll_selects_variant(#[case] roll: f64, #[case] expected: AvatarVariant) {
        assert_eq!(AvatarVariant::from_roll(roll), expected);
    }

    #[rstest]
    fn picks_mostly_walkers() {
        let mut rng = StdRng::seed_from_u64(7);
        let alligators = (0..10_000)
            .filter(|_| AvatarVariant::pick(&mut rng) == AvatarVariant::Alligator)
            .count();
        assert!(
            (700..1300).contains(&alligators),
            "expected about 10% alligators, got {alligators}"
        );
    }

    #[rstest]
    fn alternate_model_is_larger() {
        assert!(AvatarVariant::Alligator.scale() > AvatarVariant::Walker.scale());
        assert_ne!(
            AvatarVariant::Alligator.model_path(),
            AvatarVariant::Walker.model_path()
        );
    }
}
