use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const COUNT_CMD: &str = "count";

/// Options of [`config_args`] that map one-to-one onto a counter parameter.
pub const CONFIG_OPTIONS: &[(&str, &str)] = &[
    ("type", "genomic-type"),
    ("idattr", "attribute-id"),
    ("stranded", "strand-usage"),
];

/// Same, for the options only `count` has.
pub const COUNT_OPTIONS: &[(&str, &str)] = &[
    ("mode", "overlap-mode"),
    ("minaqual", "minimum-alignment-quality"),
    ("counter", "counter"),
    ("tag", "tag-to-use"),
];

///
/// The options shared by every subcommand that builds an index: everything
/// that ends up in a `CounterConfig`.
///
pub fn config_args() -> Vec<Arg> {
    vec![
        arg!(-c --config <CONFIG> "TOML file with counter parameters; explicit options override it"),
        arg!(--set <KEY_VALUE> "Set any counter parameter, e.g. --set overlap-mode=union")
            .action(ArgAction::Append),
        Arg::new("type")
            .short('t')
            .long("type")
            .value_name("TYPE")
            .help("Feature type (3rd annotation column) to count [default: exon]"),
        arg!(-i --idattr <ATTRIBUTE> "Attribute holding the feature id [default: gene_id]"),
        arg!(-s --stranded <STRANDED> "Whether reads are strand-specific")
            .value_parser(["yes", "no", "reverse"]),
        arg!(--"split-attribute-values" "Split feature ids on commas (e.g. Parent=tx1,tx2)"),
    ]
}

pub fn create_count_cli() -> Command {
    Command::new(COUNT_CMD)
        .author("Databio")
        .about("Count the reads of one or more SAM/BAM files that overlap each annotated feature.")
        .arg_required_else_help(true)
        .arg(Arg::new("annotation").required(true).help("GTF or GFF3 annotation (plain or .gz)"))
        .arg(
            Arg::new("alignments")
                .required(true)
                .num_args(1..)
                .help("SAM (plain or .gz) or BAM files, '-' for SAM on stdin"),
        )
        .args(config_args())
        .arg(
            arg!(-m --mode <MODE> "How reads overlapping several features are resolved")
                .value_parser(["union", "intersection-strict", "intersection-nonempty"]),
        )
        .arg(arg!(-a --minaqual <MINAQUAL> "Skip reads with a lower alignment quality [default: 0]"))
        .arg(
            arg!(--nonunique <NONUNIQUE> "Whether multi-mapped reads are dropped (none) or counted (all)")
                .value_parser(["none", "all"]),
        )
        .arg(
            arg!(--"secondary-alignments" <MODE> "Count (score) or drop (ignore) secondary alignments")
                .value_parser(["score", "ignore"]),
        )
        .arg(
            arg!(--"supplementary-alignments" <MODE> "Count (score) or drop (ignore) supplementary alignments")
                .value_parser(["score", "ignore"]),
        )
        .arg(arg!(--"keep-ambiguous" "Count ambiguous reads for every feature they overlap"))
        .arg(arg!(--counter <COUNTER> "Counting method [default: htseq-count]"))
        .arg(
            arg!(-r --order <ORDER> "Override the sort order declared in the alignment header")
                .value_parser(["name", "pos"]),
        )
        .arg(
            arg!(-o --samout <SAMOUT> "Write tagged records here, once per alignment file")
                .action(ArgAction::Append),
        )
        .arg(arg!(--tag <TAG> "Tag written on records of --samout [default: XF]"))
        .arg(arg!(--"remove-non-assigned-tags" "Do not tag records that were not assigned to a feature"))
        .arg(
            arg!(--output <OUTPUT> "Where to write the count table ('-' for stdout, .gz to compress)")
                .default_value("-"),
        )
        .arg(arg!(--"with-header" "Start the count table with a header line"))
        .arg(arg!(--"no-summary" "Leave the __no_feature, __ambiguous, ... rows out of the count table"))
        .arg(
            arg!(-p --threads <THREADS> "Alignment files counted at once")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
}
