use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use htcount_core::models::{ReferenceSequence, SortOrder};
use htcount_counter::{
    AnnotationIndex, CountResult, CounterConfig, CounterSink, CountingSession, LogSink,
};
use htcount_io::{AlignmentReader, CountTable, SamWriter};

use super::cli::{CONFIG_OPTIONS, COUNT_OPTIONS};

///
/// Build the counter configuration of a subcommand.
///
/// Later sources override earlier ones: defaults, the `--config` file, every
/// `--set KEY=VALUE`, then the dedicated options.
///
pub fn build_config(matches: &ArgMatches) -> Result<CounterConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => CounterConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load counter config from {}", path))?,
        None => CounterConfig::default(),
    };

    if let Some(pairs) = matches.get_many::<String>("set") {
        for pair in pairs {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", pair))?;
            config.set_parameter(key, value)?;
        }
    }

    apply_options(matches, &mut config, CONFIG_OPTIONS)?;
    if matches.get_flag("split-attribute-values") {
        config.split_attribute_values = true;
    }

    Ok(config)
}

fn apply_options(matches: &ArgMatches, config: &mut CounterConfig, options: &[(&str, &str)]) -> Result<()> {
    for (id, parameter) in options {
        if let Some(value) = matches.get_one::<String>(id) {
            config.set_parameter(parameter, value)?;
        }
    }
    Ok(())
}

fn apply_count_options(matches: &ArgMatches, config: &mut CounterConfig) -> Result<()> {
    apply_options(matches, config, COUNT_OPTIONS)?;

    if let Some(value) = matches.get_one::<String>("nonunique") {
        config.remove_non_unique_alignments = value == "none";
    }
    if let Some(value) = matches.get_one::<String>("secondary-alignments") {
        config.remove_secondary_alignments = value == "ignore";
    }
    if let Some(value) = matches.get_one::<String>("supplementary-alignments") {
        config.remove_supplementary_alignments = value == "ignore";
    }
    if matches.get_flag("keep-ambiguous") {
        config.remove_ambiguous_cases = false;
    }
    if matches.get_flag("remove-non-assigned-tags") {
        config.remove_non_assigned_feature_tags = true;
    }

    config.validate()?;
    Ok(())
}

/// One alignment file to count, and where its tagged records go.
struct CountJob {
    alignments: String,
    samout: Option<PathBuf>,
}

fn sample_name(alignments: &str) -> String {
    if alignments == "-" {
        return "stdin".to_string();
    }
    let name = Path::new(alignments)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| alignments.to_string());
    if let Some(stem) = name.strip_suffix(".bam") {
        return stem.to_string();
    }
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    name.strip_suffix(".sam").unwrap_or(name).to_string()
}

///
/// The `@SQ` lines of the first alignment file that is not stdin, used to
/// seed the feature index. `None` when there is no such file or it declares
/// no reference sequence.
///
fn reference_sequences(alignments: &[String]) -> Result<Option<Vec<ReferenceSequence>>> {
    let Some(path) = alignments.iter().find(|a| a.as_str() != "-") else {
        return Ok(None);
    };
    let reader = AlignmentReader::from_path(path)
        .with_context(|| format!("Failed to open alignment file {}", path))?;
    let sequences = &reader.header().reference_sequences;
    log::debug!("{} declares {} reference sequences", path, sequences.len());
    Ok((!sequences.is_empty()).then(|| sequences.clone()))
}

fn spinner(progress: &MultiProgress, quiet: bool, alignments: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = progress.add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} records)")
    {
        bar.set_style(style);
    }
    bar.set_message(format!("Counting {}", alignments));
    bar
}

fn count_file(
    job: &CountJob,
    index: &Arc<AnnotationIndex>,
    config: &CounterConfig,
    order: Option<SortOrder>,
    bar: &ProgressBar,
) -> Result<CountResult> {
    let reader = AlignmentReader::from_path(&job.alignments)
        .with_context(|| format!("Failed to open alignment file {}", job.alignments))?;

    let mut header = reader.header().clone();
    if let Some(order) = order {
        header = header.with_sort_order(order);
    }

    let mut writer = match &job.samout {
        Some(path) => Some(
            SamWriter::from_path(path, &header)
                .with_context(|| format!("Failed to create {:?}", path))?,
        ),
        None => None,
    };

    let counter = config
        .counter
        .counter(Arc::clone(index), config.clone())?
        .with_header(&header);

    let tag = config.output_tag()?;
    let remove_non_assigned = config.remove_non_assigned_feature_tags;
    let result = counter
        .count_with(reader, |mut assignment| {
            bar.inc(assignment.records.len() as u64);
            if let Some(writer) = writer.as_mut() {
                assignment.apply_tag(tag, remove_non_assigned);
                for record in assignment.records.iter() {
                    writer.write_record(record)?;
                }
            }
            Ok(())
        })
        .with_context(|| format!("Failed to count reads of {}", job.alignments))?;

    if let Some(writer) = writer {
        writer.finish()?;
    }
    bar.finish_with_message(format!("Counted {}", job.alignments));

    LogSink::new(sample_name(&job.alignments)).report(&result.stats);
    Ok(result)
}

pub fn run_count(matches: &ArgMatches) -> Result<()> {
    let annotation = matches
        .get_one::<String>("annotation")
        .ok_or_else(|| anyhow!("A path to an annotation file is required."))?;

    let alignments: Vec<String> = matches
        .get_many::<String>("alignments")
        .ok_or_else(|| anyhow!("At least one alignment file is required."))?
        .cloned()
        .collect();

    let samouts: Vec<PathBuf> = matches
        .get_many::<String>("samout")
        .map(|paths| paths.map(PathBuf::from).collect())
        .unwrap_or_default();
    if !samouts.is_empty() && samouts.len() != alignments.len() {
        return Err(anyhow!(
            "Got {} --samout paths for {} alignment files",
            samouts.len(),
            alignments.len()
        ));
    }

    let order = match matches.get_one::<String>("order").map(String::as_str) {
        Some("name") => Some(SortOrder::QueryName),
        Some("pos") => Some(SortOrder::Coordinate),
        _ => None,
    };

    let default_output = "-".to_string();
    let output = matches.get_one::<String>("output").unwrap_or(&default_output);
    let threads = matches.get_one::<usize>("threads").copied().unwrap_or(1).max(1);
    let quiet = matches.get_flag("quiet");

    let mut config = build_config(matches)?;
    apply_count_options(matches, &mut config)?;

    let sequences = reference_sequences(&alignments)?;
    let mut session = CountingSession::new();
    let index = session
        .get_or_build(Path::new(annotation), &config, sequences.as_deref())
        .with_context(|| format!("Failed to build the feature index from {}", annotation))?;

    let jobs: Vec<CountJob> = alignments
        .into_iter()
        .enumerate()
        .map(|(i, alignments)| CountJob {
            alignments,
            samout: samouts.get(i).cloned(),
        })
        .collect();

    let progress = MultiProgress::new();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to start the counting threads")?;

    let results: Vec<CountResult> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let bar = spinner(&progress, quiet, &job.alignments);
                count_file(job, &index, &config, order, &bar)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut table = CountTable::new().with_header(matches.get_flag("with-header"));
    for (job, mut result) in jobs.iter().zip(results) {
        result.add_zero_count_features(&index);
        table.add_sample(
            sample_name(&job.alignments),
            result.sorted_counts(),
            result.stats.summary_rows(),
        );
    }

    table
        .write_to_path(output, !matches.get_flag("no-summary"))
        .with_context(|| format!("Failed to write the count table to {}", output))?;

    log::info!(
        "Counted {} alignment file(s) against {} features",
        jobs.len(),
        index.num_features()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use clap::{Command, arg};
    use htcount_core::models::StrandUsage;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::count::cli::create_count_cli;

    fn parse(args: &[&str]) -> ArgMatches {
        // `quiet` lives on the root command
        Command::new("htcount")
            .arg(arg!(-q --quiet).global(true))
            .subcommand(create_count_cli())
            .try_get_matches_from(args)
            .unwrap()
            .subcommand_matches("count")
            .unwrap()
            .clone()
    }

    #[rstest]
    #[case("reads.sam", "reads")]
    #[case("dir/reads.sam.gz", "reads")]
    #[case("dir/reads.bam", "reads")]
    #[case("reads.txt", "reads.txt")]
    #[case("-", "stdin")]
    fn test_sample_name(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(sample_name(path), expected);
    }

    #[rstest]
    fn test_reference_sequences_skip_stdin() {
        let alignments = vec!["-".to_string(), "../tests/data/counting/single.sam".to_string()];
        let names: Vec<String> = reference_sequences(&alignments)
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["chr1", "chr2", "chrM"]);

        assert_eq!(reference_sequences(&["-".to_string()]).unwrap(), None);
    }

    #[rstest]
    fn test_options_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strand-usage = \"reverse\"\ngenomic-type = \"CDS\"\nminimum-alignment-quality = 5").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let matches = parse(&[
            "htcount", "count", "genes.gtf", "a.sam", "-c", path.as_str(), "-s", "yes", "--set", "tag-to-use=XG",
            "--nonunique", "all", "--keep-ambiguous",
        ]);
        let mut config = build_config(&matches).unwrap();
        apply_count_options(&matches, &mut config).unwrap();

        assert_eq!(config.strand_usage, StrandUsage::Yes);
        assert_eq!(config.genomic_type, "CDS");
        assert_eq!(config.minimum_alignment_quality, 5);
        assert_eq!(config.tag_to_use, "XG");
        assert!(!config.remove_non_unique_alignments);
        assert!(!config.remove_ambiguous_cases);
    }

    #[rstest]
    fn test_bad_set_pair() {
        let matches = parse(&["htcount", "count", "genes.gtf", "a.sam", "--set", "overlap-mode"]);
        assert!(build_config(&matches).is_err());
    }

    #[rstest]
    fn test_run_count_writes_table_and_samout() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("counts.tsv");
        let samout = dir.path().join("tagged.sam");

        let matches = parse(&[
            "htcount",
            "count",
            "../tests/data/counting/genes.gtf",
            "../tests/data/counting/paired.sam",
            "-o",
            samout.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--with-header",
            "-q",
        ]);
        run_count(&matches).unwrap();

        let table = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "feature\tpaired");
        assert!(lines.contains(&"geneA\t2"));
        assert!(lines.contains(&"geneE\t0"));
        assert!(lines.contains(&"__ambiguous\t1"));

        let tagged = std::fs::read_to_string(&samout).unwrap();
        assert!(tagged.contains("XF:Z:__ambiguous[geneA+geneB]"));
    }

    #[rstest]
    fn test_run_count_rejects_mismatched_samout() {
        let matches = parse(&[
            "htcount",
            "count",
            "../tests/data/counting/genes.gtf",
            "../tests/data/counting/single.sam",
            "../tests/data/counting/paired.sam",
            "-o",
            "only_one.sam",
            "-q",
        ]);
        assert!(run_count(&matches).is_err());
    }
}
