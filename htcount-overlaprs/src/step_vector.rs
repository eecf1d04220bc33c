use std::collections::{BTreeMap, BTreeSet};

/// A stretch `[start, end]` (1-based, inclusive) of a [`StepVector`] and the values covering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<'a, T> {
    pub start: u32,
    pub end: u32,
    pub values: &'a BTreeSet<T>,
}

///
/// A piecewise-constant map from positions `1..=end` to sets of values.
///
/// Every position belongs to exactly one step. A step starts at its key in
/// `steps` and runs up to the next key minus one (or to `end` for the last
/// step). Adjacent steps never hold equal sets: they are merged as soon as an
/// insertion makes them equal.
///
/// # Examples
///
/// ```
/// use htcount_overlaprs::step_vector::StepVector;
///
/// let mut sv = StepVector::new(1_000);
/// sv.add_value(100, 200, "geneA");
/// sv.add_value(150, 300, "geneB");
///
/// let steps = sv.steps_in(120, 160);
/// assert_eq!(steps.len(), 2);
/// assert_eq!(steps[0].start, 120);
/// assert_eq!(steps[0].end, 149);
/// assert_eq!(steps[1].values.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct StepVector<T>
where
    T: Ord + Clone,
{
    end: u32,
    steps: BTreeMap<u32, BTreeSet<T>>,
}

impl<T> StepVector<T>
where
    T: Ord + Clone,
{
    /// Create a vector spanning `1..=end` with a single empty step.
    pub fn new(end: u32) -> Self {
        let mut steps = BTreeMap::new();
        steps.insert(1, BTreeSet::new());
        StepVector {
            end: end.max(1),
            steps,
        }
    }

    /// Last position covered.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of steps currently held.
    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    /// Make sure a step starts exactly at `pos`, copying the set of the step
    /// that used to contain it.
    fn split_at(&mut self, pos: u32) {
        if self.steps.contains_key(&pos) {
            return;
        }
        let values = self
            .steps
            .range(..pos)
            .next_back()
            .map(|(_, values)| values.clone())
            .unwrap_or_default();
        self.steps.insert(pos, values);
    }

    /// Merge every step in `from..=to` into its predecessor when they hold the same set.
    fn coalesce(&mut self, from: u32, to: u32) {
        let mut redundant = Vec::new();
        let mut previous = self.steps.range(..from).next_back().map(|(_, v)| v);
        for (&pos, values) in self.steps.range(from..=to) {
            if previous == Some(values) {
                redundant.push(pos);
            }
            previous = Some(values);
        }
        for pos in redundant {
            self.steps.remove(&pos);
        }
    }

    ///
    /// Add `value` to every position of `[start, end]`.
    ///
    /// Steps partially covered by the range are split so that the new value
    /// only lands on covered positions. The range is clipped to the vector.
    ///
    pub fn add_value(&mut self, start: u32, end: u32, value: T) {
        let start = start.max(1);
        let end = end.min(self.end);
        if start > end {
            return;
        }

        self.split_at(start);
        if end < self.end {
            self.split_at(end + 1);
        }

        for (_, values) in self.steps.range_mut(start..=end) {
            values.insert(value.clone());
        }

        let after = if end < self.end { end + 1 } else { end };
        self.coalesce(start, after);
    }

    ///
    /// All steps intersecting `[start, end]`, clipped to that range, in
    /// position order. Empty steps are included.
    ///
    pub fn steps_in(&self, start: u32, end: u32) -> Vec<Step<'_, T>> {
        let start = start.max(1);
        let end = end.min(self.end);
        if start > end {
            return Vec::new();
        }

        let first = self
            .steps
            .range(..=start)
            .next_back()
            .map(|(pos, _)| *pos)
            .unwrap_or(1);

        let mut result = Vec::new();
        let mut iter = self.steps.range(first..=end).peekable();
        while let Some((&step_start, values)) = iter.next() {
            let step_end = match iter.peek() {
                Some((next_start, _)) => **next_start - 1,
                None => end
                    .checked_add(1)
                    .and_then(|after| self.steps.range(after..).next())
                    .map(|(next_start, _)| next_start - 1)
                    .unwrap_or(self.end),
            };
            result.push(Step {
                start: step_start.max(start),
                end: step_end.min(end),
                values,
            });
        }
        result
    }

    /// Iterate over every step of the vector.
    pub fn steps(&self) -> Vec<Step<'_, T>> {
        self.steps_in(1, self.end)
    }
}
