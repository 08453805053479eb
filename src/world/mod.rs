/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// world module
//
// the world is a set of locations, each owning its own populace
//
// In each cycle - people make random pairwise contacts, the infection spreads
// across contacts, everyone advances through the disease states and the
// location tallies its populace by state
//
////////////////////////////////////////////////////////////////////////////////////

use rand::prelude::*;

use crate::disease::{DiseaseParms, HealthState, Person, Place, PopulationSize, Timestamp};
use crate::random::{rand_uniform, AgeMixture};
use crate::ModelError;

/// Contacts sampled per person per cycle (doubled for schools).
const PER_CAPITA_CONTACTS: i64 = 40;

// NPI policy ----------------------------------------------------------------------

/// Non-pharmaceutical intervention: per-pool contact reduction fractions
/// plus the share of the population that complies.
#[derive(Debug, Clone, Copy)]
pub struct NpiPolicy {
    pub home: f64,
    pub school: f64,
    pub work: f64,
    pub random: f64,
    pub compliance: f64,
}

impl NpiPolicy {
    pub fn new(home: f64, school: f64, work: f64, random: f64, compliance: f64) -> NpiPolicy {
        NpiPolicy {
            home,
            school,
            work,
            random,
            compliance,
        }
    }

    /// No reductions, full compliance - the identity policy.
    pub fn none() -> NpiPolicy {
        NpiPolicy::new(0.0, 0.0, 0.0, 0.0, 1.0)
    }

    fn reductions(&self) -> [f64; 4] {
        [self.home, self.school, self.work, self.random]
    }
}

// Transmission probability --------------------------------------------------------

/// Per-pool probability that a risky contact converts into an exposure.
#[derive(Debug, Clone, Copy)]
pub struct TransmissionProb {
    probs: [f64; 4],
}

impl TransmissionProb {
    pub fn prob(&self, place: Place) -> f64 {
        match place.pool_index() {
            Some(index) => self.probs[index],
            None => 0.0,
        }
    }

    /// Fold a policy into the probabilities: reduce each pool by its
    /// fraction, renormalize the four pools to sum to 1, then blend with the
    /// originals according to compliance.
    pub fn apply_policy(&mut self, policy: &NpiPolicy) {
        let originals = self.probs;
        let reductions = policy.reductions();

        let mut reduced = [0.0; 4];
        for i in 0..4 {
            reduced[i] = originals[i] * (1.0 - reductions[i]);
        }
        let sum: f64 = reduced.iter().sum();
        for r in reduced.iter_mut() {
            *r /= sum;
        }

        for i in 0..4 {
            self.probs[i] =
                (1.0 - policy.compliance) * originals[i] + policy.compliance * reduced[i];
        }
    }
}

impl Default for TransmissionProb {
    // home, school, work, random
    fn default() -> TransmissionProb {
        TransmissionProb {
            probs: [0.33, 0.17, 0.17, 0.33],
        }
    }
}

// Summaries -----------------------------------------------------------------------

/// Per-state population counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    counts: [PopulationSize; HealthState::COUNT],
}

impl Summary {
    pub fn get(&self, state: HealthState) -> PopulationSize {
        self.counts[state.index()]
    }

    pub fn total(&self) -> PopulationSize {
        self.counts.iter().sum()
    }

    pub fn merge(&mut self, other: &Summary) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }
}

/// The live/published counter pair a location fills each cycle.  `inc` runs
/// once per person per cycle; `publish` swaps the live counters out as the
/// cycle's summary and zeroes them for the next cycle.
#[derive(Debug, Default)]
pub struct LocationSummary {
    daily: Summary,
    last: Summary,
}

impl LocationSummary {
    pub fn new() -> LocationSummary {
        LocationSummary::default()
    }

    pub fn inc(&mut self, state: HealthState) {
        self.daily.counts[state.index()] += 1;
    }

    pub fn publish(&mut self) {
        self.last = self.daily;
        self.daily = Summary::default();
    }

    pub fn last(&self) -> &Summary {
        &self.last
    }
}

/// Sum the latest published summaries across locations for global reporting.
pub fn aggregate(locations: &[Location]) -> Summary {
    let mut combined = Summary::default();
    for loc in locations {
        combined.merge(loc.report());
    }
    combined
}

// Contact rejection ---------------------------------------------------------------

/// Whether a sampled pair carries any transmission risk.  A contact is a
/// single directional risk event: the pair must share a place and exactly
/// one side must have drawn nonzero infectiousness.
pub fn contact_risk(place_a: Place, place_b: Place, infectious_a: f64, infectious_b: f64) -> bool {
    place_a == place_b && (infectious_a == 0.0) != (infectious_b == 0.0)
}

// Location ------------------------------------------------------------------------

/// A mixing pool with its own populace, age profile, transmission
/// probability and per-cycle summary.  People whose place drifts away
/// (hospital, cemetery) stay in their home location's populace - locations
/// model a home base, not physical presence.
pub struct Location {
    place: Place,
    initial_susceptible: PopulationSize,
    initial_seed: PopulationSize,
    total: PopulationSize,
    ages: AgeMixture,
    transmission: TransmissionProb,
    parms: DiseaseParms,
    population: Vec<Person>,
    summary: LocationSummary,
}

impl Location {
    /// The transmission probability is computed once here, from the baseline
    /// table and the optional policy.
    pub fn new(
        place: Place,
        susceptible: PopulationSize,
        seed: PopulationSize,
        ages: AgeMixture,
        npi: Option<&NpiPolicy>,
        parms: DiseaseParms,
    ) -> Location {
        let mut transmission = TransmissionProb::default();
        if let Some(policy) = npi {
            transmission.apply_policy(policy);
        }
        Location {
            place,
            initial_susceptible: susceptible,
            initial_seed: seed,
            total: susceptible + seed,
            ages,
            transmission,
            parms,
            population: Vec::new(),
            summary: LocationSummary::new(),
        }
    }

    pub fn place(&self) -> Place {
        self.place
    }

    pub fn total(&self) -> PopulationSize {
        self.total
    }

    pub fn people(&self) -> &[Person] {
        &self.population
    }

    pub fn transmission_prob(&self) -> f64 {
        self.transmission.prob(self.place)
    }

    /// Latest published summary.
    pub fn report(&self) -> &Summary {
        self.summary.last()
    }

    fn seed(&mut self, rng: &mut impl Rng, ts: Timestamp) {
        for _ in 0..self.initial_seed {
            self.population.push(Person::new(
                rng,
                self.place,
                HealthState::Exposed,
                ts,
                &self.ages,
                &self.parms,
            ));
        }
    }

    /// Generate the populace: seeds first (already exposed), then the
    /// susceptible bulk, all stamped at the same start time.
    pub fn init(&mut self, rng: &mut impl Rng, ts: Timestamp) {
        self.seed(rng, ts);
        if (self.population.len() as PopulationSize) != self.total {
            for _ in 0..self.initial_susceptible {
                self.population.push(Person::new(
                    rng,
                    self.place,
                    HealthState::Susceptible,
                    ts,
                    &self.ages,
                    &self.parms,
                ));
            }
        }
    }

    /// One sampled pairwise contact.  Both infectiousness values are drawn
    /// fresh and handed to the pure rejection rule; on risk, the susceptible
    /// side (first index wins) attempts exposure with the nonzero draw.
    fn contact(&mut self, rng: &mut impl Rng, first: usize, second: usize, ts: Timestamp) {
        let infectious_first = self.population[first].infectiousness(rng, ts, &self.parms);
        let infectious_second = self.population[second].infectiousness(rng, ts, &self.parms);
        let place_first = self.population[first].place;
        let place_second = self.population[second].place;

        if !contact_risk(place_first, place_second, infectious_first, infectious_second) {
            return;
        }

        let infectiousness = infectious_first.max(infectious_second);
        let transmission_prob = self.transmission.prob(self.place);
        if self.population[first].health_status == HealthState::Susceptible {
            self.population[first].under_exposed(rng, infectiousness, transmission_prob, ts);
        } else if self.population[second].health_status == HealthState::Susceptible {
            self.population[second].under_exposed(rng, infectiousness, transmission_prob, ts);
        }
    }

    /// One cycle: contacts first, then every person advances one state-
    /// machine step and is tallied, then the summary is published.
    pub fn run(&mut self, rng: &mut impl Rng, ts: Timestamp) {
        let mut ncontacts = ((PER_CAPITA_CONTACTS * self.total) as f64 / 2.0).ceil() as i64;
        if self.place == Place::School {
            ncontacts *= 2;
        }
        for _ in 0..ncontacts {
            let first = rand_uniform(rng, 0, self.total - 1) as usize;
            let second = rand_uniform(rng, 0, self.total - 1) as usize;
            self.contact(rng, first, second, ts);
        }

        for person in self.population.iter_mut() {
            let state = person.status_update(rng, ts, &self.parms);
            self.summary.inc(state);
        }
        self.summary.publish();
    }
}

// Simulation ----------------------------------------------------------------------

/// The discrete time loop.  Simulations always start by initializing every
/// location at `start_time`; the checkpoint callback fires on every step
/// where the timer divides the report interval, and once more at the end.
#[derive(Debug, Clone, Copy)]
pub struct Simulation {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub step_size: Timestamp,
    pub report_interval: Timestamp,
}

impl Simulation {
    pub fn new(start: Timestamp, end: Timestamp, step: Timestamp, interval: Timestamp) -> Simulation {
        Simulation {
            start_time: start,
            end_time: end,
            step_size: step,
            report_interval: interval,
        }
    }

    /// Run every location forward to `end_time`.  Configuration invariants
    /// are checked before anything steps, so a bad setup aborts cleanly.
    pub fn run(
        &self,
        rng: &mut impl Rng,
        locations: &mut [Location],
        mut checkpoint: impl FnMut(Timestamp, &[Location]),
    ) -> Result<(), ModelError> {
        if self.report_interval <= 0 {
            return Err(ModelError::Config(format!(
                "report interval must be positive, got {}",
                self.report_interval
            )));
        }
        for loc in locations.iter() {
            loc.parms.validate(self.step_size)?;
        }

        for loc in locations.iter_mut() {
            loc.init(rng, self.start_time);
        }

        let mut timer = self.start_time;
        while timer < self.end_time {
            for loc in locations.iter_mut() {
                loc.run(rng, timer);
            }
            if timer % self.report_interval == 0 {
                checkpoint(timer, &*locations);
            }
            timer += self.step_size;
        }
        checkpoint(self.end_time, &*locations);
        Ok(())
    }
}

impl Default for Simulation {
    fn default() -> Simulation {
        Simulation::new(0, 100, 1, 10)
    }
}
