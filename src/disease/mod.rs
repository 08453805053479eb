/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// disease module
//
// the SEIHCRD state machine: health states, the per-person transition record,
// age-bucketed outcome rates, the disease parameter set and the Person agent
//
////////////////////////////////////////////////////////////////////////////////////

use rand::prelude::*;
use rand_distr::{Distribution, Gamma};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::random::{prob_to_bool, AgeMixture};
use crate::ModelError;

pub type Timestamp = i64;
pub type PopulationSize = i64;

/// Timestamp value for a state the person has never entered.
pub const NEVER: Timestamp = -1;

// Health states -------------------------------------------------------------------

#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum HealthState {
    Susceptible,
    Exposed,
    Infectious,
    Hospitalized,
    Critical,
    Recovered,
    Deceased,
}

impl HealthState {
    pub const COUNT: usize = 7;

    pub const ALL: [HealthState; HealthState::COUNT] = [
        HealthState::Susceptible,
        HealthState::Exposed,
        HealthState::Infectious,
        HealthState::Hospitalized,
        HealthState::Critical,
        HealthState::Recovered,
        HealthState::Deceased,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Recovered and Deceased have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        self == HealthState::Recovered || self == HealthState::Deceased
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// Places --------------------------------------------------------------------------

/// Where a person is.  The first four are mixing pools with their own
/// transmission probabilities; Hospital and Cemetery only ever appear as a
/// person's placement after a transition.
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum Place {
    Home,
    School,
    Work,
    Random,
    Hospital,
    Cemetery,
}

impl Place {
    pub const POOLS: [Place; 4] = [Place::Home, Place::School, Place::Work, Place::Random];

    /// Index into per-pool tables, None for places that are not mixing pools.
    pub fn pool_index(self) -> Option<usize> {
        match self {
            Place::Home => Some(0),
            Place::School => Some(1),
            Place::Work => Some(2),
            Place::Random => Some(3),
            Place::Hospital | Place::Cemetery => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Place {
    type Err = ();

    fn from_str(s: &str) -> Result<Place, ()> {
        match s {
            "home" => Ok(Place::Home),
            "school" => Ok(Place::School),
            "work" => Ok(Place::Work),
            "random" => Ok(Place::Random),
            "hospital" => Ok(Place::Hospital),
            "cemetery" => Ok(Place::Cemetery),
            _ => Err(()),
        }
    }
}

// Transition record ---------------------------------------------------------------

/// When a person first entered each health state.  Owned by exactly one
/// Person and written only by its transitions.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRecord {
    entered: [Timestamp; HealthState::COUNT],
}

impl TransitionRecord {
    pub fn new() -> TransitionRecord {
        TransitionRecord {
            entered: [NEVER; HealthState::COUNT],
        }
    }

    pub fn get(&self, state: HealthState) -> Timestamp {
        self.entered[state.index()]
    }

    pub fn set(&mut self, state: HealthState, ts: Timestamp) {
        self.entered[state.index()] = ts;
    }

    /// The exact-equality trigger: fires only on the step where the elapsed
    /// time in `state` equals `duration`.  Step sizes that do not divide the
    /// durations are rejected up front by [DiseaseParms::validate].
    pub fn time_to_transit(&self, state: HealthState, now: Timestamp, duration: Timestamp) -> bool {
        now - self.get(state) == duration
    }
}

impl Default for TransitionRecord {
    fn default() -> TransitionRecord {
        TransitionRecord::new()
    }
}

// Outcome rates -------------------------------------------------------------------

const AGE_BUCKETS: usize = 9;

/// Age-decile outcome probabilities.  Bucket n covers ages 10n..10n+9;
/// everyone over 80 lands in the last bucket.
#[derive(Debug, Clone)]
pub struct OutcomeRates {
    pub hospitalization: [f64; AGE_BUCKETS],
    pub critical_care: [f64; AGE_BUCKETS],
    pub fatality: [f64; AGE_BUCKETS],
}

impl OutcomeRates {
    fn bucket(age: i64) -> usize {
        if age > 80 {
            8
        } else {
            (age / 10) as usize
        }
    }

    /// Share of symptomatic cases requiring hospitalization.
    pub fn hospitalization(&self, age: i64) -> f64 {
        self.hospitalization[OutcomeRates::bucket(age)]
    }

    /// Share of hospitalized cases requiring critical care.
    pub fn critical_care(&self, age: i64) -> f64 {
        self.critical_care[OutcomeRates::bucket(age)]
    }

    /// Infection fatality rate.
    pub fn fatality(&self, age: i64) -> f64 {
        self.fatality[OutcomeRates::bucket(age)]
    }
}

impl Default for OutcomeRates {
    fn default() -> OutcomeRates {
        OutcomeRates {
            hospitalization: [
                0.001, 0.003, 0.012, 0.032, 0.049, 0.102, 0.166, 0.243, 0.273,
            ],
            critical_care: [0.05, 0.05, 0.05, 0.05, 0.063, 0.122, 0.274, 0.432, 0.709],
            fatality: [
                0.00002, 0.00006, 0.0003, 0.0008, 0.0015, 0.0060, 0.022, 0.051, 0.093,
            ],
        }
    }
}

// Disease parameters --------------------------------------------------------------

// One simulation time unit is a tenth of a day.
const DAY: Timestamp = 10;

const PROB_SYMPTOMATIC: f64 = 0.67;
const INCUBATION_PERIOD: Timestamp = 51; // 5.1 days
const SYMPTOMATIC_LATENT_PERIOD: Timestamp = 46;
const ASYMPTOMATIC_LATENT_PERIOD: Timestamp = 70;
const INFECTIOUS_ALPHA: f64 = 0.25;
const INFECTIOUS_BETA: f64 = 4.0;
const HOSPITALIZATION_DELAY: Timestamp = 5 * DAY;
const INFECTIOUS_SELF_ISOLATE_RATIO: f64 = 2.0 / 3.0;
const CRITICAL_DEATH: f64 = 0.5;
const HOSPITAL_DAYS: Timestamp = 8 * DAY;
const DECIDE_CRITICAL: Timestamp = 6 * DAY; // must stay below HOSPITAL_DAYS
const ICU_DAYS: Timestamp = 10 * DAY;
const ASYMPTOMATIC_RECOVER: Timestamp = 10 * DAY;
const MILD_RECOVER: Timestamp = 10 * DAY;
const SYMPTOMATIC_INFECTIOUSNESS_SCALE: f64 = 1.5;

/// Every duration and probability constant of the disease course, passed
/// explicitly into locations rather than read from globals so independent
/// scenarios can run side by side.
#[derive(Debug, Clone)]
pub struct DiseaseParms {
    pub prob_symptomatic: f64,
    pub incubation_period: Timestamp,
    pub symptomatic_latent_period: Timestamp,
    pub asymptomatic_latent_period: Timestamp,
    pub hospitalization_delay: Timestamp,
    pub asymptomatic_recovery: Timestamp,
    pub mild_recovery: Timestamp,
    pub decide_critical: Timestamp,
    pub hospital_stay: Timestamp,
    pub icu_stay: Timestamp,
    pub critical_fatality: f64,
    pub self_isolation_ratio: f64,
    pub symptomatic_scale: f64,
    pub rates: OutcomeRates,
    infectiousness: Gamma<f64>,
}

impl DiseaseParms {
    /// The reference parameter set (0.1 day time units).
    pub fn reference() -> DiseaseParms {
        DiseaseParms {
            prob_symptomatic: PROB_SYMPTOMATIC,
            incubation_period: INCUBATION_PERIOD,
            symptomatic_latent_period: SYMPTOMATIC_LATENT_PERIOD,
            asymptomatic_latent_period: ASYMPTOMATIC_LATENT_PERIOD,
            hospitalization_delay: HOSPITALIZATION_DELAY,
            asymptomatic_recovery: ASYMPTOMATIC_RECOVER,
            mild_recovery: MILD_RECOVER,
            decide_critical: DECIDE_CRITICAL,
            hospital_stay: HOSPITAL_DAYS,
            icu_stay: ICU_DAYS,
            critical_fatality: CRITICAL_DEATH,
            self_isolation_ratio: INFECTIOUS_SELF_ISOLATE_RATIO,
            symptomatic_scale: SYMPTOMATIC_INFECTIOUSNESS_SCALE,
            rates: OutcomeRates::default(),
            infectiousness: Gamma::new(INFECTIOUS_ALPHA, INFECTIOUS_BETA)
                .expect("reference gamma parameters"),
        }
    }

    /// Reference parameters with a different infectiousness distribution.
    pub fn with_infectiousness(alpha: f64, beta: f64) -> Result<DiseaseParms, ModelError> {
        let infectiousness = Gamma::new(alpha, beta).map_err(|e| {
            ModelError::Config(format!("bad gamma parameters ({}, {}) - {:?}", alpha, beta, e))
        })?;
        Ok(DiseaseParms {
            infectiousness,
            ..DiseaseParms::reference()
        })
    }

    /// One draw from the infectiousness distribution.
    pub fn draw_infectiousness(&self, rng: &mut impl Rng) -> f64 {
        self.infectiousness.sample(rng)
    }

    /// Startup invariants.  Transitions fire on exact elapsed-time equality,
    /// so the step size must divide every duration or a due transition could
    /// be stepped over and lost.
    pub fn validate(&self, step_size: Timestamp) -> Result<(), ModelError> {
        if step_size <= 0 {
            return Err(ModelError::Config(format!(
                "step size must be positive, got {}",
                step_size
            )));
        }
        if self.decide_critical >= self.hospital_stay {
            return Err(ModelError::Config(format!(
                "decide_critical ({}) must be below hospital_stay ({})",
                self.decide_critical, self.hospital_stay
            )));
        }
        let durations = [
            ("incubation_period", self.incubation_period),
            ("symptomatic_latent_period", self.symptomatic_latent_period),
            ("asymptomatic_latent_period", self.asymptomatic_latent_period),
            ("hospitalization_delay", self.hospitalization_delay),
            ("asymptomatic_recovery", self.asymptomatic_recovery),
            ("mild_recovery", self.mild_recovery),
            ("decide_critical", self.decide_critical),
            ("hospital_stay", self.hospital_stay),
            ("icu_stay", self.icu_stay),
        ];
        for (name, duration) in durations.iter() {
            if duration % step_size != 0 {
                return Err(ModelError::Config(format!(
                    "step size {} does not divide {} ({})",
                    step_size, name, duration
                )));
            }
        }
        Ok(())
    }
}

// Person --------------------------------------------------------------------------

/// One simulated individual.  Traits (age, symptomatic, isolate, latent
/// period) are fixed at creation; the health state and place evolve through
/// [Person::status_update] and exposure.
#[derive(Debug, Clone)]
pub struct Person {
    age: i64,
    latent_period: Timestamp,
    symptomatic: bool,
    isolate: bool,
    pub health_status: HealthState,
    pub place: Place,
    record: TransitionRecord,
}

impl Person {
    pub fn new(
        rng: &mut impl Rng,
        place: Place,
        health: HealthState,
        ts: Timestamp,
        ages: &AgeMixture,
        parms: &DiseaseParms,
    ) -> Person {
        let age = ages.sample(rng);
        let symptomatic = prob_to_bool(rng, parms.prob_symptomatic);
        let (latent_period, isolate) = if symptomatic {
            (
                parms.symptomatic_latent_period,
                prob_to_bool(rng, parms.self_isolation_ratio),
            )
        } else {
            (parms.asymptomatic_latent_period, false)
        };
        let mut record = TransitionRecord::new();
        record.set(health, ts);
        Person {
            age,
            latent_period,
            symptomatic,
            isolate,
            health_status: health,
            place,
            record,
        }
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn symptomatic(&self) -> bool {
        self.symptomatic
    }

    pub fn isolate(&self) -> bool {
        self.isolate
    }

    pub fn record(&self) -> &TransitionRecord {
        &self.record
    }

    /// The single transition primitive: every legal edge stamps the record
    /// and may relocate the person (recoveries go home, hospitalizations to
    /// hospital, deaths to the cemetery).
    fn transit(&mut self, next: HealthState, ts: Timestamp) {
        self.health_status = next;
        match next {
            HealthState::Recovered => self.place = Place::Home,
            HealthState::Hospitalized | HealthState::Critical => self.place = Place::Hospital,
            HealthState::Deceased => self.place = Place::Cemetery,
            _ => (),
        }
        self.record.set(next, ts);
    }

    fn is_fatal(&self, rng: &mut impl Rng, parms: &DiseaseParms) -> bool {
        prob_to_bool(rng, parms.rates.fatality(self.age))
    }

    fn is_hospitalized(&self, rng: &mut impl Rng, parms: &DiseaseParms) -> bool {
        prob_to_bool(rng, parms.rates.hospitalization(self.age))
    }

    fn is_critical(&self, rng: &mut impl Rng, parms: &DiseaseParms) -> bool {
        prob_to_bool(rng, parms.rates.critical_care(self.age))
    }

    /// Elapsed-time check against the record entry for the current state.
    fn due(&self, ts: Timestamp, duration: Timestamp) -> bool {
        self.record.time_to_transit(self.health_status, ts, duration)
    }

    /// Per-contact infectiousness, redrawn on every call:
    ///   susceptible, recovered, deceased        -> 0
    ///   exposed, asymptomatic                   -> 0
    ///   exposed, symptomatic, past latency      -> gamma
    ///   infectious/hospitalized/critical        -> gamma, scaled if symptomatic
    pub fn infectiousness(&self, rng: &mut impl Rng, ts: Timestamp, parms: &DiseaseParms) -> f64 {
        match self.health_status {
            HealthState::Susceptible | HealthState::Recovered | HealthState::Deceased => 0.0,
            HealthState::Exposed => {
                if self.symptomatic
                    && ts - self.record.get(HealthState::Exposed) > self.latent_period
                {
                    parms.draw_infectiousness(rng)
                } else {
                    0.0
                }
            }
            _ => {
                let draw = parms.draw_infectiousness(rng);
                if self.symptomatic {
                    parms.symptomatic_scale * draw
                } else {
                    draw
                }
            }
        }
    }

    /// Exposure attempt on a susceptible person.  The infectiousness draw is
    /// passed in explicitly so the trial itself is deterministic in its
    /// inputs apart from the bernoulli roll.
    pub fn under_exposed(
        &mut self,
        rng: &mut impl Rng,
        infectiousness: f64,
        transmission_prob: f64,
        ts: Timestamp,
    ) -> bool {
        if prob_to_bool(rng, infectiousness * transmission_prob) {
            self.transit(HealthState::Exposed, ts);
            return true;
        }
        false
    }

    /// Advance the state machine by one step.  Conditions are checked in
    /// order against the record of whatever state the person is in at each
    /// check, so a transition fired earlier in the same call cannot cascade
    /// into a second one (the freshly stamped record never matches a
    /// positive duration).  Returns the end-of-step state.
    pub fn status_update(
        &mut self,
        rng: &mut impl Rng,
        ts: Timestamp,
        parms: &DiseaseParms,
    ) -> HealthState {
        match self.health_status {
            HealthState::Exposed => {
                if self.symptomatic && self.due(ts, parms.incubation_period) {
                    self.transit(HealthState::Infectious, ts);
                }
                if !self.symptomatic && self.due(ts, self.latent_period) {
                    self.transit(HealthState::Infectious, ts);
                }
            }
            HealthState::Infectious => {
                if !self.symptomatic && self.due(ts, parms.asymptomatic_recovery) {
                    if self.is_fatal(rng, parms) {
                        self.transit(HealthState::Deceased, ts);
                    } else {
                        self.transit(HealthState::Recovered, ts);
                    }
                }
                if self.symptomatic && self.due(ts, parms.hospitalization_delay) {
                    if self.is_hospitalized(rng, parms) {
                        self.transit(HealthState::Hospitalized, ts);
                    }
                }
                if self.symptomatic && self.due(ts, parms.mild_recovery) {
                    self.transit(HealthState::Recovered, ts);
                }
            }
            HealthState::Hospitalized => {
                if self.due(ts, parms.decide_critical) {
                    if self.is_critical(rng, parms) {
                        self.transit(HealthState::Critical, ts);
                    }
                }
                if self.due(ts, parms.hospital_stay) {
                    if self.is_fatal(rng, parms) {
                        self.transit(HealthState::Deceased, ts);
                    } else {
                        self.transit(HealthState::Recovered, ts);
                    }
                }
            }
            HealthState::Critical => {
                // roll the die only once
                if self.due(ts, parms.icu_stay) {
                    if prob_to_bool(rng, parms.critical_fatality) {
                        self.transit(HealthState::Deceased, ts);
                    } else {
                        self.transit(HealthState::Recovered, ts);
                    }
                }
            }
            HealthState::Susceptible | HealthState::Recovered | HealthState::Deceased => (),
        }
        self.health_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn person(health: HealthState, symptomatic: bool, age: i64, ts: Timestamp) -> Person {
        let parms = DiseaseParms::reference();
        let latent_period = if symptomatic {
            parms.symptomatic_latent_period
        } else {
            parms.asymptomatic_latent_period
        };
        let mut record = TransitionRecord::new();
        record.set(health, ts);
        Person {
            age,
            latent_period,
            symptomatic,
            isolate: false,
            health_status: health,
            place: Place::Home,
            record,
        }
    }

    #[test]
    fn record_starts_at_sentinel() {
        let record = TransitionRecord::new();
        for state in HealthState::ALL.iter() {
            assert_eq!(record.get(*state), NEVER);
        }
    }

    #[test]
    fn record_set_and_get() {
        let mut record = TransitionRecord::new();
        record.set(HealthState::Exposed, 42);
        assert_eq!(record.get(HealthState::Exposed), 42);
        assert_eq!(record.get(HealthState::Infectious), NEVER);
        assert!(record.time_to_transit(HealthState::Exposed, 93, 51));
        assert!(!record.time_to_transit(HealthState::Exposed, 94, 51));
    }

    #[test]
    fn rates_bucket_by_decile_and_clamp_over_eighty() {
        let rates = OutcomeRates::default();
        assert!((rates.fatality(25) - 0.0003).abs() < 1e-12);
        assert!((rates.fatality(85) - 0.093).abs() < 1e-12);
        assert!((rates.fatality(120) - 0.093).abs() < 1e-12);
        assert!((rates.hospitalization(0) - 0.001).abs() < 1e-12);
        assert!((rates.critical_care(44) - 0.063).abs() < 1e-12);
    }

    #[test]
    fn infectiousness_draws_average_to_one() {
        let parms = DiseaseParms::reference();
        let mut rng = rng();
        let trials = 10_000;
        let total: f64 = (0..trials).map(|_| parms.draw_infectiousness(&mut rng)).sum();
        let mean = total / trials as f64;
        assert!((mean - 1.0).abs() < 0.1, "mean infectiousness was {}", mean);
    }

    #[test]
    fn inert_states_have_zero_infectiousness() {
        let parms = DiseaseParms::reference();
        let mut rng = rng();
        for state in [
            HealthState::Susceptible,
            HealthState::Recovered,
            HealthState::Deceased,
        ]
        .iter()
        {
            let p = person(*state, true, 40, 0);
            assert_eq!(p.infectiousness(&mut rng, 500, &parms), 0.0);
        }
    }

    #[test]
    fn exposed_infectiousness_gated_by_latency() {
        let parms = DiseaseParms::reference();
        let mut rng = rng();

        // asymptomatic exposed people never shed
        let asymptomatic = person(HealthState::Exposed, false, 40, 0);
        assert_eq!(asymptomatic.infectiousness(&mut rng, 200, &parms), 0.0);

        // symptomatic ones only after the latent period has passed
        let symptomatic = person(HealthState::Exposed, true, 40, 0);
        assert_eq!(symptomatic.infectiousness(&mut rng, 46, &parms), 0.0);
        let mut shed_some = false;
        for _ in 0..50 {
            if symptomatic.infectiousness(&mut rng, 47, &parms) > 0.0 {
                shed_some = true;
            }
        }
        assert!(shed_some);
    }

    #[test]
    fn symptomatic_exposed_turns_infectious_at_incubation_exactly() {
        let parms = DiseaseParms::reference();
        let mut rng = rng();
        let mut p = person(HealthState::Exposed, true, 40, 0);
        assert_eq!(p.status_update(&mut rng, 50, &parms), HealthState::Exposed);
        assert_eq!(p.status_update(&mut rng, 51, &parms), HealthState::Infectious);
        assert_eq!(p.record().get(HealthState::Infectious), 51);
    }

    #[test]
    fn asymptomatic_exposed_uses_its_latent_period() {
        let parms = DiseaseParms::reference();
        let mut rng = rng();
        let mut p = person(HealthState::Exposed, false, 40, 0);
        assert_eq!(p.status_update(&mut rng, 51, &parms), HealthState::Exposed);
        assert_eq!(p.status_update(&mut rng, 70, &parms), HealthState::Infectious);
    }

    #[test]
    fn missed_trigger_never_fires_later() {
        // the exact-equality contract: once 51 is stepped over, the person
        // is stuck - which is why validate() insists on divisibility
        let parms = DiseaseParms::reference();
        let mut rng = rng();
        let mut p = person(HealthState::Exposed, true, 40, 0);
        for ts in (52..200).step_by(2) {
            assert_eq!(p.status_update(&mut rng, ts, &parms), HealthState::Exposed);
        }
    }

    #[test]
    fn asymptomatic_infectious_resolves_at_recovery_time() {
        let mut parms = DiseaseParms::reference();
        parms.rates.fatality = [0.0; 9]; // force survival
        let mut rng = rng();
        let mut p = person(HealthState::Infectious, false, 40, 100);
        assert_eq!(p.status_update(&mut rng, 199, &parms), HealthState::Infectious);
        assert_eq!(p.status_update(&mut rng, 200, &parms), HealthState::Recovered);
        assert_eq!(p.place, Place::Home);
    }

    #[test]
    fn symptomatic_infectious_recovers_mild_when_not_hospitalized() {
        let mut parms = DiseaseParms::reference();
        parms.rates.hospitalization = [0.0; 9];
        let mut rng = rng();
        let mut p = person(HealthState::Infectious, true, 40, 0);
        assert_eq!(p.status_update(&mut rng, 50, &parms), HealthState::Infectious);
        assert_eq!(p.status_update(&mut rng, 100, &parms), HealthState::Recovered);
    }

    #[test]
    fn hospitalization_fires_at_delay_with_forced_rates() {
        let mut parms = DiseaseParms::reference();
        // rate tables are bernoulli at 0.001 precision, so 2.0 always fires
        parms.rates.hospitalization = [2.0; 9];
        let mut rng = rng();
        let mut p = person(HealthState::Infectious, true, 40, 0);
        assert_eq!(p.status_update(&mut rng, 50, &parms), HealthState::Hospitalized);
        assert_eq!(p.place, Place::Hospital);
        assert_eq!(p.record().get(HealthState::Hospitalized), 50);
    }

    #[test]
    fn hospitalized_goes_critical_then_resolves_in_icu() {
        let mut parms = DiseaseParms::reference();
        parms.rates.critical_care = [2.0; 9];
        parms.critical_fatality = 0.0; // always survive the ICU
        let mut rng = rng();
        let mut p = person(HealthState::Hospitalized, true, 70, 0);
        assert_eq!(p.status_update(&mut rng, 60, &parms), HealthState::Critical);
        assert_eq!(p.place, Place::Hospital);
        assert_eq!(p.status_update(&mut rng, 159, &parms), HealthState::Critical);
        assert_eq!(p.status_update(&mut rng, 160, &parms), HealthState::Recovered);
        assert_eq!(p.place, Place::Home);
    }

    #[test]
    fn hospitalized_discharge_at_stay_end_when_never_critical() {
        let mut parms = DiseaseParms::reference();
        parms.rates.critical_care = [0.0; 9];
        parms.rates.fatality = [0.0; 9];
        let mut rng = rng();
        let mut p = person(HealthState::Hospitalized, true, 70, 0);
        assert_eq!(p.status_update(&mut rng, 60, &parms), HealthState::Hospitalized);
        assert_eq!(p.status_update(&mut rng, 80, &parms), HealthState::Recovered);
    }

    #[test]
    fn critical_fatality_sends_person_to_cemetery() {
        let mut parms = DiseaseParms::reference();
        parms.critical_fatality = 2.0; // always fires at the 0.001 lattice
        let mut rng = rng();
        let mut p = person(HealthState::Critical, true, 70, 0);
        assert_eq!(p.status_update(&mut rng, 100, &parms), HealthState::Deceased);
        assert_eq!(p.place, Place::Cemetery);
    }

    #[test]
    fn terminal_states_never_move() {
        let parms = DiseaseParms::reference();
        let mut rng = rng();
        for state in [HealthState::Recovered, HealthState::Deceased].iter() {
            let mut p = person(*state, true, 40, 0);
            for ts in 0..300 {
                assert_eq!(p.status_update(&mut rng, ts, &parms), *state);
            }
        }
    }

    #[test]
    fn exposure_attempt_with_certain_probability() {
        let parms = DiseaseParms::reference();
        let mut rng = rng();
        let mut p = person(HealthState::Susceptible, true, 40, 0);
        // infectiousness * transmission well above the bernoulli lattice top
        assert!(p.under_exposed(&mut rng, 2000.0, 1.0, 5));
        assert_eq!(p.health_status, HealthState::Exposed);
        assert_eq!(p.record().get(HealthState::Exposed), 5);

        let mut q = person(HealthState::Susceptible, true, 40, 0);
        assert!(!q.under_exposed(&mut rng, 0.0, 1.0, 5));
        assert_eq!(q.health_status, HealthState::Susceptible);
    }

    #[test]
    fn validate_rejects_critical_decision_after_discharge() {
        let mut parms = DiseaseParms::reference();
        parms.decide_critical = parms.hospital_stay;
        match parms.validate(1) {
            Err(ModelError::Config(_)) => (),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_non_dividing_step() {
        let parms = DiseaseParms::reference();
        // 2 does not divide the 51-unit incubation period
        assert!(parms.validate(2).is_err());
        assert!(parms.validate(0).is_err());
        assert!(parms.validate(1).is_ok());
    }

    #[test]
    fn new_person_stamps_creation_state() {
        let parms = DiseaseParms::reference();
        let ages = AgeMixture::single(40.0, 20.0).unwrap();
        let mut rng = rng();
        let p = Person::new(&mut rng, Place::Work, HealthState::Exposed, 17, &ages, &parms);
        assert_eq!(p.health_status, HealthState::Exposed);
        assert_eq!(p.place, Place::Work);
        assert_eq!(p.record().get(HealthState::Exposed), 17);
        assert_eq!(p.record().get(HealthState::Susceptible), NEVER);
        assert!(p.age() >= 0);
        if !p.symptomatic() {
            assert!(!p.isolate());
        }
    }
}
