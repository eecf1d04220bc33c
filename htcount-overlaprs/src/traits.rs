use crate::genomic_array::{GenomicArrayError, Segment};

///
/// A read-only index answering "which values cover this stretch of a chromosome".
///
/// The resolver only talks to this trait, so any structure able to report
/// covering segments (with their strand and value set) can stand in for
/// [`GenomicArray`](crate::GenomicArray).
///
pub trait SegmentIndex<T>: Send + Sync
where
    T: Ord + Clone + Send + Sync,
{
    fn contains_chromosome(&self, chromosome: &str) -> bool;

    fn get_entries(
        &self,
        chromosome: &str,
        start: u32,
        end: u32,
    ) -> Result<Vec<Segment<'_, T>>, GenomicArrayError>;
}
