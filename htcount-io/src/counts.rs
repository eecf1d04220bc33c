use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use htcount_core::utils::get_dynamic_writer;

use crate::error::Result;

///
/// A feature-by-sample table of read counts.
///
/// Rows are kept sorted by feature id. Features missing from a sample count
/// as zero in that sample's column. Diagnostic rows (`__no_feature`,
/// `__ambiguous`, ...) are kept apart and written after the feature rows, in
/// the order they were first seen.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    samples: Vec<String>,
    features: BTreeMap<String, Vec<u64>>,
    summary: Vec<(String, Vec<u64>)>,
    with_header: bool,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a `feature<TAB>sample...` header line before the rows.
    pub fn with_header(mut self, with_header: bool) -> Self {
        self.with_header = with_header;
        self
    }

    ///
    /// Append one sample column.
    ///
    /// # Arguments
    /// - name: column name, used by the header line
    /// - counts: `(feature id, count)` pairs
    /// - summary: `(diagnostic name, count)` pairs
    pub fn add_sample<'a, C, S>(&mut self, name: impl Into<String>, counts: C, summary: S)
    where
        C: IntoIterator<Item = (&'a str, u64)>,
        S: IntoIterator<Item = (&'a str, u64)>,
    {
        let column = self.samples.len();
        self.samples.push(name.into());

        for values in self.features.values_mut() {
            values.push(0);
        }
        for (_, values) in self.summary.iter_mut() {
            values.push(0);
        }

        for (feature, count) in counts {
            let values = self
                .features
                .entry(feature.to_string())
                .or_insert_with(|| vec![0; column + 1]);
            values[column] += count;
        }

        for (name, count) in summary {
            let pos = match self.summary.iter().position(|(n, _)| n == name) {
                Some(pos) => pos,
                None => {
                    self.summary.push((name.to_string(), vec![0; column + 1]));
                    self.summary.len() - 1
                }
            };
            self.summary[pos].1[column] += count;
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Counts of one feature across samples.
    pub fn get(&self, feature: &str) -> Option<&[u64]> {
        self.features.get(feature).map(|v| v.as_slice())
    }

    ///
    /// Write the table as tab-separated text.
    ///
    /// # Arguments
    /// - writer: where to write
    /// - include_summary: also write the diagnostic rows
    pub fn write<W: Write>(&self, writer: &mut W, include_summary: bool) -> Result<()> {
        if self.with_header {
            writeln!(writer, "feature\t{}", self.samples.join("\t"))?;
        }

        let mut write_row = |name: &str, values: &[u64]| -> Result<()> {
            write!(writer, "{}", name)?;
            for value in values {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
            Ok(())
        };

        for (feature, values) in &self.features {
            write_row(feature, values)?;
        }
        if include_summary {
            for (name, values) in &self.summary {
                write_row(name, values)?;
            }
        }
        Ok(())
    }

    /// Write the table to a file (gzip-compressed for `.gz` names, stdout for `-`).
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P, include_summary: bool) -> Result<()> {
        let mut writer = get_dynamic_writer(path.as_ref())?;
        self.write(&mut writer, include_summary)?;
        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use htcount_core::utils::get_dynamic_reader;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn table() -> CountTable {
        let mut table = CountTable::new();
        table.add_sample(
            "s1",
            vec![("geneB", 3), ("geneA", 1)],
            vec![("__no_feature", 2), ("__ambiguous", 1)],
        );
        table.add_sample(
            "s2",
            vec![("geneC", 5), ("geneA", 4)],
            vec![("__no_feature", 7)],
        );
        table
    }

    #[rstest]
    fn test_columns_are_aligned(table: CountTable) {
        assert_eq!(table.samples(), &["s1".to_string(), "s2".to_string()]);
        assert_eq!(table.num_features(), 3);
        assert_eq!(table.get("geneA"), Some(&[1, 4][..]));
        assert_eq!(table.get("geneB"), Some(&[3, 0][..]));
        assert_eq!(table.get("geneC"), Some(&[0, 5][..]));
    }

    #[rstest]
    fn test_write_sorted_with_summary(table: CountTable) {
        let mut out = Vec::new();
        table.write(&mut out, true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "geneA\t1\t4\ngeneB\t3\t0\ngeneC\t0\t5\n__no_feature\t2\t7\n__ambiguous\t1\t0\n"
        );
    }

    #[rstest]
    fn test_write_with_header_without_summary(table: CountTable) {
        let table = table.with_header(true);
        let mut out = Vec::new();
        table.write(&mut out, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "feature\ts1\ts2\ngeneA\t1\t4\ngeneB\t3\t0\ngeneC\t0\t5\n"
        );
    }

    #[rstest]
    fn test_write_gz(table: CountTable) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("counts.tsv.gz");
        table.write_to_path(&path, false).unwrap();

        let mut content = String::new();
        get_dynamic_reader(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
