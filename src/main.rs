use std::env;
use std::process;

use rand::prelude::*;
use rand::rngs::StdRng;

use outbreak::data_management::ModelDataStore;
use outbreak::disease::HealthState;
use outbreak::stats::{SummaryLog, SummaryRecord};
use outbreak::world::{aggregate, Summary};
use outbreak::ModelError;

fn main() {
    // process command line arguments (for now just the model root directory)
    let args: Vec<_> = env::args().collect();
    let model_root = if args.len() > 1 {
        &args[1]
    } else {
        eprintln!("Error: no model location specified");
        process::exit(1);
    };

    if let Err(e) = run(model_root) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(model_root: &str) -> Result<(), ModelError> {
    // The model data store handles all model inputs and outputs
    let data_store = ModelDataStore::new(model_root)?;
    let model_parms = data_store.get_model_parms()?;
    println!("\n--------------------Outbreak Model-----------------------");
    println!("{}", model_parms);

    let mut rng = match model_parms.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut locations = model_parms.build_locations()?;
    let summary_log = SummaryLog::new(&data_store.summary_log_path())?;

    // the checkpoint cannot bubble its own errors out of the simulation
    // loop, so log failures are carried to the side and raised afterwards
    let mut log_result: Result<(), ModelError> = Ok(());
    model_parms
        .simulation
        .run(&mut rng, &mut locations, |ts, locs| {
            println!("\nReport for time {}", ts);
            for loc in locs {
                print_summary(&loc.place().to_string(), loc.report());
            }
            print_summary("All", &aggregate(locs));
            if log_result.is_ok() {
                log_result = summary_log.append(&SummaryRecord::from_checkpoint(ts, locs));
            }
        })?;
    log_result?;

    println!(
        "\nRun complete - summary log in {}",
        data_store.summary_log_path().display()
    );
    Ok(())
}

fn print_summary(label: &str, summary: &Summary) {
    println!(
        "  {:<8} S {:>9}  E {:>8}  I {:>8}  H {:>7}  C {:>7}  R {:>9}  D {:>7}",
        label,
        summary.get(HealthState::Susceptible),
        summary.get(HealthState::Exposed),
        summary.get(HealthState::Infectious),
        summary.get(HealthState::Hospitalized),
        summary.get(HealthState::Critical),
        summary.get(HealthState::Recovered),
        summary.get(HealthState::Deceased),
    );
}
