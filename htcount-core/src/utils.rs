use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Stdout, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

fn is_gzipped(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("gz"))
}

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped(path) {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Get a reader for either a gzipped, non-gzipped file, or stdin
///
/// # Arguments
///
/// - file_path: path to the file to read, or '-' for stdin
pub fn get_dynamic_reader_w_stdin(file_path_str: &str) -> Result<Box<dyn BufRead>> {
    if file_path_str == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(get_dynamic_reader(Path::new(file_path_str))?))
    }
}

///
/// A buffered output, plain or gzip-compressed.
///
/// Call [`DynamicWriter::finish`] once everything is written: for gzip it
/// writes the trailer and reports any error doing so.
///
pub enum DynamicWriter {
    Stdout(BufWriter<Stdout>),
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl DynamicWriter {
    pub fn finish(self) -> io::Result<()> {
        match self {
            DynamicWriter::Stdout(mut writer) => writer.flush(),
            DynamicWriter::Plain(mut writer) => writer.flush(),
            DynamicWriter::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for DynamicWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DynamicWriter::Stdout(writer) => writer.write(buf),
            DynamicWriter::Plain(writer) => writer.write(buf),
            DynamicWriter::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            DynamicWriter::Stdout(writer) => writer.flush(),
            DynamicWriter::Plain(writer) => writer.flush(),
            DynamicWriter::Gzip(writer) => writer.flush(),
        }
    }
}

///
/// Get a buffered writer, gzip-compressing when the path ends in `.gz`.
/// Parent directories are created as needed. `-` writes to stdout.
///
pub fn get_dynamic_writer(path: &Path) -> Result<DynamicWriter> {
    if path == Path::new("-") {
        return Ok(DynamicWriter::Stdout(BufWriter::new(io::stdout())));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let writer = match is_gzipped(path) {
        true => DynamicWriter::Gzip(GzEncoder::new(BufWriter::new(file), Compression::default())),
        false => DynamicWriter::Plain(BufWriter::new(file)),
    };

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("counts.tsv")]
    #[case("nested/dir/counts.tsv.gz")]
    fn test_write_then_read(#[case] name: &str) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join(name);

        let mut writer = get_dynamic_writer(&path).unwrap();
        writeln!(writer, "geneA\t1").unwrap();
        writeln!(writer, "geneB\t0").unwrap();
        writer.finish().unwrap();

        let reader = get_dynamic_reader(&path).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["geneA\t1", "geneB\t0"]);
    }

    #[rstest]
    fn test_gzip_output_is_complete_once_finished() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("counts.tsv.gz");

        let mut writer = get_dynamic_writer(&path).unwrap();
        assert!(matches!(writer, DynamicWriter::Gzip(_)));
        writeln!(writer, "geneA\t1").unwrap();
        writer.finish().unwrap();

        // the gzip trailer is there: a strict single-member decoder accepts it
        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "geneA\t1\n");
    }

    #[rstest]
    fn test_missing_file() {
        let Err(err) = get_dynamic_reader(Path::new("does/not/exist.gtf")) else {
            panic!("opening a missing file should fail");
        };
        assert!(err.to_string().contains("Failed to open file"));
    }
}
