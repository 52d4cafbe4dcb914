use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::report::Issue;

/// Positions of the issues whose category matches `category`, ignoring case.
pub fn matching_indices(issues: &[Issue], category: &str) -> Vec<usize> {
    let wanted = category.to_lowercase();
    issues
        .iter()
        .enumerate()
        .filter(|(_, issue)| issue.category().to_lowercase() == wanted)
        .map(|(idx, _)| idx)
        .collect()
}

/// Issues whose category matches `category`, ignoring case, in report order.
pub fn query_by_category<'a>(issues: &'a [Issue], category: &str) -> Vec<&'a Issue> {
    matching_indices(issues, category)
        .into_iter()
        .map(|idx| &issues[idx])
        .collect()
}

/// Per-category issue counts, keyed in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    entries: Vec<(String, usize)>,
}

impl Summary {
    pub fn get(&self, category: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    fn bump(&mut self, category: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((category.to_string(), 1)),
        }
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, count) in &self.entries {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Count issues per category. Issues with no checker name count as `Unknown`.
pub fn summarize(issues: &[Issue]) -> Summary {
    let mut summary = Summary::default();
    for issue in issues {
        summary.bump(issue.category_label());
    }
    summary
}
