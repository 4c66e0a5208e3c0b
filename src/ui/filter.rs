//! Tab-driven filter cycling shared by both list views.
//!
//! The cycle is the fixed buckets in order (bucket 0 is "all"), then one
//! state per distinct tag, then back to "all". With no tags the tag states
//! are skipped.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Bucket(usize),
    Tag(usize),
}

#[derive(Debug, Clone)]
pub struct FilterCycle {
    labels: &'static [&'static str],
    state: FilterState,
    tags: Vec<String>,
}

impl FilterCycle {
    pub fn new(labels: &'static [&'static str]) -> Self {
        Self {
            labels,
            state: FilterState::Bucket(0),
            tags: Vec::new(),
        }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The selected bucket, or `None` while filtering by tag.
    pub fn bucket(&self) -> Option<usize> {
        match self.state {
            FilterState::Bucket(i) => Some(i),
            FilterState::Tag(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self.state {
            FilterState::Tag(i) => self.tags.get(i).map(String::as_str),
            FilterState::Bucket(_) => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = FilterState::Bucket(0);
    }

    pub fn advance(&mut self) {
        self.state = match self.state {
            FilterState::Tag(i) if i + 1 < self.tags.len() => FilterState::Tag(i + 1),
            FilterState::Tag(_) => FilterState::Bucket(0),
            FilterState::Bucket(i) if i + 1 < self.labels.len() => FilterState::Bucket(i + 1),
            FilterState::Bucket(_) if self.tags.is_empty() => FilterState::Bucket(0),
            FilterState::Bucket(_) => FilterState::Tag(0),
        };
    }

    /// Replaces the tag set (sorted, distinct). A tag selection that no
    /// longer fits is clamped; with no tags left it falls back to "all".
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        if let FilterState::Tag(i) = self.state {
            self.state = if self.tags.is_empty() {
                FilterState::Bucket(0)
            } else {
                FilterState::Tag(i.min(self.tags.len() - 1))
            };
        }
    }
}

/// Sorted distinct tags across `records`.
pub fn collect_tags<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    records
        .into_iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_BUCKETS: &[&str] = &["all", "password", "api key", "ssh key", "note"];
    const TASK_BUCKETS: &[&str] = &["all", "pending", "done"];

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn period(cycle: &mut FilterCycle) -> usize {
        let start = cycle.state();
        for n in 1..100 {
            cycle.advance();
            if cycle.state() == start {
                return n;
            }
        }
        panic!("cycle never returned");
    }

    #[test]
    fn period_without_tags_skips_tag_state() {
        assert_eq!(period(&mut FilterCycle::new(SECRET_BUCKETS)), 5);
        assert_eq!(period(&mut FilterCycle::new(TASK_BUCKETS)), 3);
    }

    #[test]
    fn period_with_tags_visits_each_tag() {
        let mut cycle = FilterCycle::new(SECRET_BUCKETS);
        cycle.set_tags(tags(&["a", "b", "c"]));
        assert_eq!(period(&mut cycle), 4 + 3 + 1);

        let mut cycle = FilterCycle::new(TASK_BUCKETS);
        cycle.set_tags(tags(&["work"]));
        assert_eq!(period(&mut cycle), 2 + 1 + 1);
    }

    #[test]
    fn entering_tag_mode_selects_first_tag() {
        let mut cycle = FilterCycle::new(TASK_BUCKETS);
        cycle.set_tags(tags(&["alpha", "beta"]));
        cycle.advance();
        cycle.advance();
        assert_eq!(cycle.bucket(), Some(2));
        cycle.advance();
        assert_eq!(cycle.tag(), Some("alpha"));
        cycle.advance();
        assert_eq!(cycle.tag(), Some("beta"));
        cycle.advance();
        assert_eq!(cycle.bucket(), Some(0));
    }

    #[test]
    fn shrinking_tags_clamps_selection() {
        let mut cycle = FilterCycle::new(TASK_BUCKETS);
        cycle.set_tags(tags(&["a", "b"]));
        for _ in 0..4 {
            cycle.advance();
        }
        assert_eq!(cycle.tag(), Some("b"));
        cycle.set_tags(tags(&["a"]));
        assert_eq!(cycle.tag(), Some("a"));
        cycle.set_tags(Vec::new());
        assert_eq!(cycle.state(), FilterState::Bucket(0));
    }

    #[test]
    fn collect_tags_sorts_and_dedups() {
        let a = tags(&["work", "dev"]);
        let b = tags(&["dev", "alpha"]);
        let got = collect_tags([a.as_slice(), b.as_slice()]);
        assert_eq!(got, tags(&["alpha", "dev", "work"]));
    }
}
