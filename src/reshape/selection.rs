//! Source discovery and the table selection.
//!
//! The selection is owned by whoever renders the table (pipeline run or TUI);
//! the reshaper only reads it.

use crate::domain::Observation;

/// Ordered set of source names.
///
/// Order is significant: it is the column order of the table and the CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSelection {
    sources: Vec<String>,
}

impl SourceSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from names, keeping first occurrences only.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sel = Self::default();
        for name in names {
            sel.insert(name.into());
        }
        sel
    }

    pub fn contains(&self, source: &str) -> bool {
        self.sources.iter().any(|s| s == source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.sources
    }

    fn insert(&mut self, source: String) {
        if !self.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Flip one source on or off, keeping the order of `available`.
    ///
    /// Sources that are not in `available` are ignored.
    pub fn toggle(&mut self, source: &str, available: &SourceSelection) {
        if !available.contains(source) {
            return;
        }
        let turn_on = !self.contains(source);
        self.sources = available
            .iter()
            .filter(|s| if *s == source { turn_on } else { self.contains(s) })
            .map(str::to_string)
            .collect();
    }

    /// Keep only the names that also appear in `available`, in `self`'s order.
    pub fn restricted_to(&self, available: &SourceSelection) -> Self {
        Self {
            sources: self
                .sources
                .iter()
                .filter(|s| available.contains(s))
                .cloned()
                .collect(),
        }
    }
}

/// Distinct sources in order of first appearance.
pub fn select_sources(observations: &[Observation]) -> SourceSelection {
    SourceSelection::from_names(observations.iter().map(|o| o.source.as_str()))
}

/// Default selection after a successful fetch.
///
/// Call exactly once per fetch and replace the previous selection with the
/// result; a new fetch may add or remove sources.
pub fn on_new_data(observations: &[Observation]) -> SourceSelection {
    let selection = select_sources(observations);
    tracing::debug!(sources = selection.len(), "selection reset from new data");
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(source: &str) -> Observation {
        Observation::new("2024-01-01T00:00:00", source, 1.0, "kW")
    }

    #[test]
    fn first_appearance_order_is_kept() {
        let data = vec![obs("Model B"), obs("Production"), obs("Model B"), obs("Model A")];
        let sel = select_sources(&data);
        assert_eq!(sel.as_slice(), &["Model B", "Production", "Model A"]);
    }

    #[test]
    fn empty_input_gives_empty_selection() {
        assert!(select_sources(&[]).is_empty());
    }

    #[test]
    fn new_data_replaces_rather_than_merges() {
        let first = on_new_data(&[obs("A"), obs("B")]);
        let second = on_new_data(&[obs("C")]);
        assert_eq!(first.as_slice(), &["A", "B"]);
        assert_eq!(second.as_slice(), &["C"]);
    }

    #[test]
    fn toggle_keeps_available_order() {
        let available = SourceSelection::from_names(["A", "B", "C"]);
        let mut sel = available.clone();

        sel.toggle("B", &available);
        assert_eq!(sel.as_slice(), &["A", "C"]);

        sel.toggle("A", &available);
        assert_eq!(sel.as_slice(), &["C"]);

        sel.toggle("A", &available);
        assert_eq!(sel.as_slice(), &["A", "C"]);

        sel.toggle("Z", &available);
        assert_eq!(sel.as_slice(), &["A", "C"]);
    }

    #[test]
    fn restriction_drops_unknown_names() {
        let available = SourceSelection::from_names(["A", "B"]);
        let wanted = SourceSelection::from_names(["B", "X", "A"]);
        assert_eq!(wanted.restricted_to(&available).as_slice(), &["B", "A"]);
    }
}
