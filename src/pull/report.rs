use crate::fetch::FetchAction;
use crate::resource::ResourceKind;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub fetched: usize,
    pub skipped: usize,
    pub warned: usize,
}

impl KindCounts {
    pub fn total(&self) -> usize {
        self.fetched + self.skipped + self.warned
    }
}

/// Outcome counts of one pull, per resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    pub dry_run: bool,
    counts: BTreeMap<ResourceKind, KindCounts>,
}

impl PullReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            counts: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, kind: ResourceKind, action: FetchAction) {
        let counts = self.counts.entry(kind).or_default();
        match action {
            FetchAction::Fetch => counts.fetched += 1,
            FetchAction::Skip => counts.skipped += 1,
            FetchAction::Warn => counts.warned += 1,
        }
    }

    pub fn counts(&self, kind: ResourceKind) -> KindCounts {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    /// Kinds with at least one recorded outcome, in `ResourceKind` order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, KindCounts)> + '_ {
        self.counts.iter().map(|(k, c)| (*k, *c))
    }

    pub fn totals(&self) -> KindCounts {
        self.counts.values().fold(KindCounts::default(), |acc, c| KindCounts {
            fetched: acc.fetched + c.fetched,
            skipped: acc.skipped + c.skipped,
            warned: acc.warned + c.warned,
        })
    }

    pub fn has_warnings(&self) -> bool {
        self.totals().warned > 0
    }
}
