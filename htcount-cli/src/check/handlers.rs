use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;

use htcount_counter::check_annotation;

use crate::count::handlers::build_config;

pub fn run_check(matches: &ArgMatches) -> Result<()> {
    let annotation = matches
        .get_one::<String>("annotation")
        .ok_or_else(|| anyhow!("A path to an annotation file is required."))?;

    let config = build_config(matches)?;
    let features = check_annotation(Path::new(annotation), &config)
        .with_context(|| format!("{} cannot be used for counting", annotation))?;

    println!(
        "{}: {} '{}' features identified by '{}'",
        annotation, features, config.genomic_type, config.attribute_id
    );
    Ok(())
}
