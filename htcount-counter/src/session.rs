use std::path::{Path, PathBuf};
use std::sync::Arc;

use fxhash::FxHashMap as HashMap;
use htcount_core::models::{AlignmentRecord, ReferenceSequence};
use htcount_io::HtcountIoError;
use rayon::prelude::*;

use crate::config::CounterConfig;
use crate::counter::CountResult;
use crate::errors::Result;
use crate::index_builder::{AnnotationIndex, build_index_from_path};

/// What makes two indexes of the same annotation file different.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub path: PathBuf,
    pub genomic_type: String,
    pub attribute_id: String,
    pub stranded: bool,
    pub split_attribute_values: bool,
    /// Chromosomes the index was seeded with, if any.
    pub reference_sequences: Option<Vec<ReferenceSequence>>,
}

impl IndexKey {
    pub fn new(
        path: &Path,
        config: &CounterConfig,
        reference_sequences: Option<&[ReferenceSequence]>,
    ) -> Self {
        IndexKey {
            path: path.to_path_buf(),
            genomic_type: config.genomic_type.clone(),
            attribute_id: config.attribute_id.clone(),
            stranded: config.strand_usage.is_stranded(),
            split_attribute_values: config.split_attribute_values,
            reference_sequences: reference_sequences.map(<[ReferenceSequence]>::to_vec),
        }
    }
}

///
/// The indexes built during one session, so that several counting runs over
/// the same annotation build it once.
///
/// A session is an ordinary value: create it where the runs are driven, pass
/// it by reference, drop or [`clear`](CountingSession::clear) it when done.
///
#[derive(Debug, Default)]
pub struct CountingSession {
    indexes: HashMap<IndexKey, Arc<AnnotationIndex>>,
}

impl CountingSession {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// The index of `path` for `config`, built on first use.
    ///
    /// `reference_sequences` (the `@SQ` lines of an alignment header) seed the
    /// index with its chromosomes, so reads on a chromosome known to neither
    /// side are reported as such.
    ///
    pub fn get_or_build(
        &mut self,
        path: &Path,
        config: &CounterConfig,
        reference_sequences: Option<&[ReferenceSequence]>,
    ) -> Result<Arc<AnnotationIndex>> {
        let key = IndexKey::new(path, config, reference_sequences);
        if let Some(index) = self.indexes.get(&key) {
            log::debug!("Reusing index of {:?}", path);
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(build_index_from_path(path, config, reference_sequences)?);
        self.indexes.insert(key, Arc::clone(&index));
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Forget every index. Counters still holding one keep it alive.
    pub fn clear(&mut self) {
        self.indexes.clear();
    }
}

///
/// Check that an annotation file yields a usable index for `config`.
///
/// The index built here is private to the check and never reused for counting.
/// Returns the number of distinct feature ids.
///
pub fn check_annotation(path: &Path, config: &CounterConfig) -> Result<usize> {
    let index = build_index_from_path(path, config, None)?;
    Ok(index.num_features())
}

///
/// Count several alignment streams against one index, in parallel, and sum the results.
///
/// Each shard gets its own counter; any failing shard fails the whole run.
///
pub fn count_shards<S>(index: Arc<AnnotationIndex>, config: &CounterConfig, shards: Vec<S>) -> Result<CountResult>
where
    S: IntoIterator<Item = std::result::Result<AlignmentRecord, HtcountIoError>> + Send,
{
    shards
        .into_par_iter()
        .map(|shard| {
            config
                .counter
                .counter(Arc::clone(&index), config.clone())?
                .count(shard)
        })
        .try_reduce(CountResult::default, |mut acc, result| {
            acc.merge(result);
            Ok(acc)
        })
}
