/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// random module
//
// the probability primitives the rest of the model draws from: uniform integer
// draws, clamped gaussian draws, fixed-precision bernoulli trials and a
// weighted gaussian mixture used for location age profiles
//
////////////////////////////////////////////////////////////////////////////////////

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::Normal;

use crate::ModelError;

/// Resolution of [prob_to_bool]: probabilities are compared on a lattice of
/// 1/PROB_PRECISION points.
const PROB_PRECISION: f64 = 0.001;

/// How far mixture weights may stray from summing to 1 before the mixture is
/// rejected as misconfigured.
const MIXTURE_WEIGHT_TOLERANCE: f64 = 0.2;

/// Uniform integer draw over the inclusive range [low, high].
pub fn rand_uniform(rng: &mut impl Rng, low: i64, high: i64) -> i64 {
    rng.gen_range(low, high + 1)
}

/// Gaussian draw rounded up to an integer.  Negative draws are clamped to
/// zero - ages and durations cannot go negative.
pub fn rand_gaussian(rng: &mut impl Rng, mean: f64, spread: f64) -> i64 {
    let normal = Normal::new(mean, spread).expect("gaussian spread must be non-negative");
    let draw = normal.sample(rng).ceil() as i64;
    if draw < 0 {
        0
    } else {
        draw
    }
}

/// Bernoulli trial at fixed precision: a uniform draw over the probability
/// lattice is compared against the (truncated) scaled probability.
pub fn prob_to_bool(rng: &mut impl Rng, probability: f64) -> bool {
    let lattice = (1.0 / PROB_PRECISION) as i64;
    let threshold = (probability / PROB_PRECISION) as i64;
    rand_uniform(rng, 0, lattice) < threshold
}

// AgeMixture ----------------------------------------------------------------------

/// One gaussian component of an age mixture.
#[derive(Debug, Clone, Copy)]
pub struct AgeComponent {
    pub weight: f64,
    pub mean: f64,
    pub spread: f64,
}

impl AgeComponent {
    pub fn new(weight: f64, mean: f64, spread: f64) -> AgeComponent {
        AgeComponent {
            weight,
            mean,
            spread,
        }
    }
}

/// A weighted list of gaussian (mean, spread) pairs describing the age
/// profile of a location.  Sampling picks a component by weight and then
/// gaussian-samples it, clamped at zero.
#[derive(Debug, Clone)]
pub struct AgeMixture {
    components: Vec<Normal<f64>>,
    picker: WeightedIndex<f64>,
}

impl AgeMixture {
    /// Build a mixture, rejecting weight sets whose sum strays more than
    /// 0.2 from 1.  Misconfigured spreads are rejected here too, so
    /// sampling itself never fails.
    pub fn new(components: &[AgeComponent]) -> Result<AgeMixture, ModelError> {
        if components.is_empty() {
            return Err(ModelError::InvalidMixture(String::from(
                "mixture has no components",
            )));
        }
        let total: f64 = components.iter().map(|c| c.weight).sum();
        if (total - 1.0).abs() > MIXTURE_WEIGHT_TOLERANCE {
            return Err(ModelError::InvalidMixture(format!(
                "component weights sum to {} - expected 1.0 within {}",
                total, MIXTURE_WEIGHT_TOLERANCE
            )));
        }

        let picker = WeightedIndex::new(components.iter().map(|c| c.weight))
            .map_err(|e| ModelError::InvalidMixture(format!("bad component weight - {:?}", e)))?;
        let mut normals: Vec<Normal<f64>> = Vec::with_capacity(components.len());
        for c in components {
            let normal = Normal::new(c.mean, c.spread).map_err(|e| {
                ModelError::InvalidMixture(format!(
                    "bad gaussian component ({}, {}) - {:?}",
                    c.mean, c.spread, e
                ))
            })?;
            normals.push(normal);
        }

        Ok(AgeMixture {
            components: normals,
            picker,
        })
    }

    /// Convenience for the common one-component profile.
    pub fn single(mean: f64, spread: f64) -> Result<AgeMixture, ModelError> {
        AgeMixture::new(&[AgeComponent::new(1.0, mean, spread)])
    }

    pub fn sample(&self, rng: &mut impl Rng) -> i64 {
        let component = &self.components[self.picker.sample(rng)];
        let draw = component.sample(rng).ceil() as i64;
        if draw < 0 {
            0
        } else {
            draw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn uniform_draw_stays_in_inclusive_range() {
        let mut rng = rng();
        for _ in 0..1000 {
            let draw = rand_uniform(&mut rng, 3, 5);
            assert!(draw >= 3 && draw <= 5);
        }
    }

    #[test]
    fn gaussian_draw_clamps_negatives_to_zero() {
        let mut rng = rng();
        for _ in 0..100 {
            assert_eq!(rand_gaussian(&mut rng, -50.0, 1.0), 0);
        }
    }

    #[test]
    fn gaussian_draw_centres_on_mean() {
        let mut rng = rng();
        let trials = 10_000;
        let total: i64 = (0..trials).map(|_| rand_gaussian(&mut rng, 40.0, 5.0)).sum();
        let mean = total as f64 / trials as f64;
        // ceil shifts the mean up by about half a unit
        assert!((mean - 40.5).abs() < 0.5);
    }

    #[test]
    fn zero_probability_never_fires() {
        let mut rng = rng();
        for _ in 0..1000 {
            assert!(!prob_to_bool(&mut rng, 0.0));
        }
    }

    #[test]
    fn half_probability_fires_about_half_the_time() {
        let mut rng = rng();
        let trials = 10_000;
        let hits = (0..trials).filter(|_| prob_to_bool(&mut rng, 0.5)).count();
        let rate = hits as f64 / trials as f64;
        assert!((rate - 0.5).abs() < 0.05);
    }

    #[test]
    fn mixture_rejects_weights_far_from_one() {
        let components = [
            AgeComponent::new(1.0, 15.0, 5.0),
            AgeComponent::new(0.5, 45.0, 8.0),
        ];
        match AgeMixture::new(&components) {
            Err(ModelError::InvalidMixture(_)) => (),
            other => panic!("expected invalid mixture error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn mixture_rejects_empty_component_list() {
        assert!(AgeMixture::new(&[]).is_err());
    }

    #[test]
    fn mixture_accepts_weights_within_tolerance() {
        let components = [
            AgeComponent::new(0.6, 15.0, 5.0),
            AgeComponent::new(0.5, 45.0, 8.0),
        ];
        assert!(AgeMixture::new(&components).is_ok());
    }

    #[test]
    fn mixture_samples_are_never_negative() {
        let mixture = AgeMixture::single(2.0, 20.0).unwrap();
        let mut rng = rng();
        for _ in 0..1000 {
            assert!(mixture.sample(&mut rng) >= 0);
        }
    }
}
