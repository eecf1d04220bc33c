mod check;
mod count;

use anyhow::Result;
use clap::{Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "htcount";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Count how many aligned reads overlap each feature of a genome annotation.")
        .subcommand_required(true)
        .arg(arg!(-q --quiet "Only log warnings and errors").global(true))
        .subcommand(count::cli::create_count_cli())
        .subcommand(check::cli::create_check_cli())
}

fn init_logger(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_logger(matches.get_flag("quiet"));

    match matches.subcommand() {
        //
        // COUNT
        //
        Some((count::cli::COUNT_CMD, matches)) => {
            count::handlers::run_count(matches)?;
        }

        //
        // CHECK
        //
        Some((check::cli::CHECK_CMD, matches)) => {
            check::handlers::run_check(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
