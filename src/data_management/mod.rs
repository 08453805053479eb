/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// data_management module
//
// reads scenario definitions (parms.yaml) from a model root directory and
// manages the output directory for a run
//
////////////////////////////////////////////////////////////////////////////////////

use std::fmt;
use std::fs;
use std::fs::File;
use std::io::prelude::Read;
use std::path::PathBuf;

use yaml_rust::yaml::{Yaml, YamlLoader};

use crate::disease::{Place, PopulationSize};
use crate::random::AgeComponent;
use crate::world::{Location, NpiPolicy, Simulation};
use crate::{disease, ModelError};

// -------------------------------- File paths -------------------------------------

pub struct ModelDataStore {
    parameter_file: PathBuf,
    output_dir: PathBuf,
}

impl ModelDataStore {
    /// Resolve the file layout under model_root.  The output directory is
    /// recreated from scratch on every run.
    pub fn new(model_root: &str) -> Result<ModelDataStore, ModelError> {
        let parameter_file: PathBuf = [model_root, "parms.yaml"].iter().collect();
        if !parameter_file.exists() {
            return Err(ModelError::Config(format!(
                "no parameter file at {}",
                parameter_file.display()
            )));
        }

        let output_dir: PathBuf = [model_root, "output"].iter().collect();
        if output_dir.exists() {
            fs::remove_dir_all(&output_dir)?;
        }
        fs::create_dir_all(&output_dir)?;

        Ok(ModelDataStore {
            parameter_file,
            output_dir,
        })
    }

    pub fn get_model_parms(&self) -> Result<ModelParameters, ModelError> {
        let mut parm_string = String::new();
        File::open(&self.parameter_file)?.read_to_string(&mut parm_string)?;
        ModelParameters::from_yaml_str(&parm_string)
    }

    pub fn summary_log_path(&self) -> PathBuf {
        self.output_dir.join("summary_log.csv")
    }
}

// ----------------------------- Scenario parameters --------------------------------

/// Per-location slice of a scenario definition.
#[derive(Debug, Clone)]
pub struct LocationParms {
    pub place: Place,
    pub susceptible: PopulationSize,
    pub seed: PopulationSize,
    pub ages: Vec<AgeComponent>,
}

/// Everything a single run needs, parsed from parms.yaml.
#[derive(Debug, Clone)]
pub struct ModelParameters {
    pub model_name: String,
    pub model_description: String,
    pub rng_seed: Option<u64>,
    pub simulation: Simulation,
    pub npi: Option<NpiPolicy>,
    pub locations: Vec<LocationParms>,
}

impl ModelParameters {
    pub fn from_yaml_str(parm_string: &str) -> Result<ModelParameters, ModelError> {
        // there can be multiple docs in a yaml file - only the first one
        // interests us
        let docs = YamlLoader::load_from_str(parm_string)?;
        let doc = docs
            .get(0)
            .ok_or_else(|| ModelError::Config(String::from("empty parameter file")))?;

        let model_name = yaml_str(&doc["model_name"], "model_name")?;
        let model_description = yaml_str(&doc["model_description"], "model_description")?;

        let seed_node = &doc["seed"];
        let rng_seed = if seed_node.is_badvalue() {
            None
        } else {
            Some(yaml_i64(seed_node, "seed")? as u64)
        };

        let sim = &doc["simulation"];
        let simulation = Simulation::new(
            yaml_i64(&sim["start"], "simulation.start")?,
            yaml_i64(&sim["end"], "simulation.end")?,
            yaml_i64(&sim["step"], "simulation.step")?,
            yaml_i64(&sim["report_interval"], "simulation.report_interval")?,
        );

        let npi_node = &doc["npi"];
        let npi = if npi_node.is_badvalue() {
            None
        } else {
            Some(NpiPolicy::new(
                yaml_f64(&npi_node["home"], "npi.home")?,
                yaml_f64(&npi_node["school"], "npi.school")?,
                yaml_f64(&npi_node["work"], "npi.work")?,
                yaml_f64(&npi_node["random"], "npi.random")?,
                yaml_f64(&npi_node["compliance"], "npi.compliance")?,
            ))
        };

        let location_nodes = doc["locations"]
            .as_vec()
            .ok_or_else(|| ModelError::Config(String::from("missing 'locations' list")))?;
        let mut locations: Vec<LocationParms> = Vec::with_capacity(location_nodes.len());
        for node in location_nodes {
            locations.push(ModelParameters::parse_location(node)?);
        }
        if locations.is_empty() {
            return Err(ModelError::Config(String::from(
                "'locations' list must name at least one location",
            )));
        }

        Ok(ModelParameters {
            model_name,
            model_description,
            rng_seed,
            simulation,
            npi,
            locations,
        })
    }

    fn parse_location(node: &Yaml) -> Result<LocationParms, ModelError> {
        let place_name = yaml_str(&node["place"], "locations[].place")?;
        let place: Place = place_name
            .parse()
            .map_err(|_| ModelError::Config(format!("unknown place '{}'", place_name)))?;

        let age_nodes = node["ages"]
            .as_vec()
            .ok_or_else(|| ModelError::Config(format!("location '{}' has no age mixture", place)))?;
        let mut ages: Vec<AgeComponent> = Vec::with_capacity(age_nodes.len());
        for age in age_nodes {
            ages.push(AgeComponent::new(
                yaml_f64(&age["weight"], "ages[].weight")?,
                yaml_f64(&age["mean"], "ages[].mean")?,
                yaml_f64(&age["spread"], "ages[].spread")?,
            ));
        }

        Ok(LocationParms {
            place,
            susceptible: yaml_i64(&node["susceptible"], "locations[].susceptible")?,
            seed: yaml_i64(&node["seed"], "locations[].seed")?,
            ages,
        })
    }

    /// Turn the parsed definition into live locations.  Mixture weights and
    /// disease-parameter invariants are checked here and by the simulation,
    /// before any stepping happens.
    pub fn build_locations(&self) -> Result<Vec<Location>, ModelError> {
        let mut locations: Vec<Location> = Vec::with_capacity(self.locations.len());
        for parms in &self.locations {
            let ages = crate::random::AgeMixture::new(&parms.ages)?;
            locations.push(Location::new(
                parms.place,
                parms.susceptible,
                parms.seed,
                ages,
                self.npi.as_ref(),
                disease::DiseaseParms::reference(),
            ));
        }
        Ok(locations)
    }
}

impl fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let population: PopulationSize = self
            .locations
            .iter()
            .map(|l| l.susceptible + l.seed)
            .sum();
        write!(
            f,
            "Model name {}\nModel description {}\nPopulation {} across {} locations\nCycles {} to {} by {} (reports every {})",
            self.model_name,
            self.model_description,
            population,
            self.locations.len(),
            self.simulation.start_time,
            self.simulation.end_time,
            self.simulation.step_size,
            self.simulation.report_interval
        )
    }
}

// ----------------------------- yaml helpers ---------------------------------------

fn yaml_str(node: &Yaml, label: &str) -> Result<String, ModelError> {
    node.as_str()
        .map(String::from)
        .ok_or_else(|| ModelError::Config(format!("missing or non-string '{}' parameter", label)))
}

fn yaml_i64(node: &Yaml, label: &str) -> Result<i64, ModelError> {
    node.as_i64()
        .ok_or_else(|| ModelError::Config(format!("missing or non-integer '{}' parameter", label)))
}

// yaml-rust refuses to read an unadorned integer as a real
fn yaml_f64(node: &Yaml, label: &str) -> Result<f64, ModelError> {
    match node {
        Yaml::Integer(i) => Some(*i as f64),
        _ => node.as_f64(),
    }
    .ok_or_else(|| ModelError::Config(format!("missing or non-numeric '{}' parameter", label)))
}
