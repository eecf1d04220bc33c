use clap::{Arg, Command};

use crate::count::cli::config_args;

pub const CHECK_CMD: &str = "check";

pub fn create_check_cli() -> Command {
    Command::new(CHECK_CMD)
        .author("Databio")
        .about("Check that an annotation yields a usable feature index, without counting anything.")
        .arg_required_else_help(true)
        .arg(Arg::new("annotation").required(true).help("GTF or GFF3 annotation (plain or .gz)"))
        .args(config_args())
}
