//! Bucket rows by day, hour, or app and sum them.

use indexmap::IndexMap;
use serde::Serialize;
use time::OffsetDateTime;

use crate::store::DictationEvent;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub dictations: u64,
    pub words: i64,
    pub duration_seconds: f64,
}

impl AggregateRow {
    fn new(key: String) -> Self {
        Self {
            key,
            dictations: 0,
            words: 0,
            duration_seconds: 0.0,
        }
    }

    fn add(&mut self, e: &DictationEvent) {
        self.dictations += 1;
        self.words += e.words();
        self.duration_seconds += e.duration();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketOrder {
    /// Descending word sum, ties keep first-seen order; optionally truncated.
    TopByWords(Option<usize>),
    /// Ascending key, for day and hour series.
    ByKey,
}

/// Group `rows` by `key_fn`. Rows for which `key_fn` returns `None` have no
/// bucket and are skipped.
pub fn aggregate_by<'a, I, F>(rows: I, mut key_fn: F, order: BucketOrder) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a DictationEvent>,
    F: FnMut(&DictationEvent) -> Option<String>,
{
    let mut buckets: IndexMap<String, AggregateRow> = IndexMap::new();
    for e in rows {
        let Some(key) = key_fn(e) else {
            continue;
        };
        buckets
            .entry(key.clone())
            .or_insert_with(|| AggregateRow::new(key))
            .add(e);
    }

    let mut out: Vec<AggregateRow> = buckets.into_values().collect();
    match order {
        BucketOrder::TopByWords(limit) => {
            out.sort_by(|a, b| b.words.cmp(&a.words));
            if let Some(n) = limit {
                out.truncate(n);
            }
        }
        BucketOrder::ByKey => out.sort_by(|a, b| a.key.cmp(&b.key)),
    }
    out
}

/// Whole-set totals. Undated rows count here even though they have no day or
/// hour bucket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Totals {
    pub dictations: u64,
    pub words: i64,
    pub duration_seconds: f64,
    pub first: Option<OffsetDateTime>,
    pub last: Option<OffsetDateTime>,
}

impl Totals {
    pub fn hours(&self) -> f64 {
        round1(self.duration_seconds / 3600.0)
    }

    pub fn avg_words(&self) -> f64 {
        if self.dictations == 0 {
            return 0.0;
        }
        round1(self.words as f64 / self.dictations as f64)
    }
}

pub fn totals<'a, I>(rows: I) -> Totals
where
    I: IntoIterator<Item = &'a DictationEvent>,
{
    let mut t = Totals::default();
    for e in rows {
        t.dictations += 1;
        t.words += e.words();
        t.duration_seconds += e.duration();
        if let Some(ts) = e.timestamp {
            t.first = Some(t.first.map_or(ts, |f| f.min(ts)));
            t.last = Some(t.last.map_or(ts, |l| l.max(ts)));
        }
    }
    t
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
