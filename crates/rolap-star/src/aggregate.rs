use crate::star::Star;
use rolap_bitkey::BitKey;
use std::cmp::Ordering;

/// A pre-aggregated table a query may be answered from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateCandidate {
    pub name: String,
    /// Level columns the aggregate keeps.
    pub levels: BitKey,
    /// Measure columns the aggregate keeps.
    pub measures: BitKey,
    pub row_count: Option<u64>,
}

impl AggregateCandidate {
    pub fn covers(&self, levels: &BitKey, measures: &BitKey) -> bool {
        self.levels.is_super_set_of(levels) && self.measures.is_super_set_of(measures)
    }
}

fn by_size(a: &AggregateCandidate, b: &AggregateCandidate) -> Ordering {
    match (a.row_count, b.row_count) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.name.cmp(&b.name))
}

impl Star {
    /// Record an aggregate table. The keys are copied, so later changes by
    /// the caller are not observed. A candidate with the same name is replaced.
    pub fn add_aggregate(
        &mut self,
        name: impl Into<String>,
        levels: &BitKey,
        measures: &BitKey,
        row_count: Option<u64>,
    ) {
        let candidate = AggregateCandidate {
            name: name.into(),
            levels: levels.clone(),
            measures: measures.clone(),
            row_count,
        };
        match self.aggregates.iter_mut().find(|a| a.name == candidate.name) {
            Some(existing) => *existing = candidate,
            None => self.aggregates.push(candidate),
        }
    }

    pub fn aggregates(&self) -> &[AggregateCandidate] {
        &self.aggregates
    }

    /// Aggregates holding every requested column, smallest first.
    pub fn matching_aggregates(
        &self,
        levels: &BitKey,
        measures: &BitKey,
    ) -> Vec<&AggregateCandidate> {
        let mut out: Vec<&AggregateCandidate> = self
            .aggregates
            .iter()
            .filter(|a| a.covers(levels, measures))
            .collect();
        out.sort_by(|a, b| by_size(a, b));
        out
    }
}
