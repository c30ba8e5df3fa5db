//! Fragment index: name fragment -> positions of the rows whose name
//! contains it, computed once when a table is loaded.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    CaseSensitive,
    CaseInsensitive,
}

impl MatchMode {
    fn key(&self, s: &str) -> String {
        match self {
            MatchMode::CaseSensitive => s.to_string(),
            MatchMode::CaseInsensitive => s.to_lowercase(),
        }
    }

    /// Substring test under this mode.
    pub fn contains(&self, haystack: &str, needle: &str) -> bool {
        match self {
            MatchMode::CaseSensitive => haystack.contains(needle),
            MatchMode::CaseInsensitive => haystack.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FragmentIndex {
    mode: MatchMode,
    hits: HashMap<String, Vec<usize>>,
}

impl FragmentIndex {
    pub fn empty(mode: MatchMode) -> Self {
        Self { mode, hits: HashMap::new() }
    }

    /// Index every fragment against the row names. Row positions are kept in
    /// table order, so the first hit is the first matching row.
    pub fn build<'f, 'n, F, N>(mode: MatchMode, fragments: F, names: N) -> Self
    where
        F: IntoIterator<Item = &'f str>,
        N: IntoIterator<Item = &'n str>,
    {
        let names: Vec<String> = names.into_iter().map(|n| mode.key(n)).collect();
        let mut hits = HashMap::new();
        for fragment in fragments {
            let key = mode.key(fragment);
            if hits.contains_key(&key) {
                continue;
            }
            let positions: Vec<usize> = names
                .iter()
                .enumerate()
                .filter(|(_, name)| name.contains(key.as_str()))
                .map(|(i, _)| i)
                .collect();
            hits.insert(key, positions);
        }
        Self { mode, hits }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// `None` means the fragment was not indexed (the caller must scan);
    /// `Some(&[])` means it was indexed and matches nothing.
    pub fn get(&self, fragment: &str) -> Option<&[usize]> {
        self.hits.get(&self.mode.key(fragment)).map(Vec::as_slice)
    }
}
