//! Tiered, relevance-ranked search over a [`RecordCatalog`].
//!
//! The index tables are derived from the catalog on first use and then
//! shared read-only for the rest of the process. Construction goes through
//! a [`OnceLock`], so concurrent first callers race safely and the build
//! runs exactly once.
//!
//! # Search Tiers
//!
//! Each tier only runs when every earlier tier came back empty:
//!
//! 1. **Exact**: case-insensitive full-name match; returns a single record.
//! 2. **Category**: the query is a substring of a category's symbolic name;
//!    returns every record in that category.
//! 3. **Keyword**: whitespace-split query terms looked up against the
//!    `_`-delimited name fragments.
//! 4. **Partial**: terms matched as substrings of any indexed fragment
//!    (including full lowercase names).
//! 5. **Substring scan**: linear pass over the catalog.
//!
//! # Relevance Ordering
//!
//! Whatever tier produced matches, results are stably partitioned into
//! `name == query`, `name` starts with `query`, `name` contains `query`,
//! and everything else, then concatenated in that order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use crate::catalog::RecordCatalog;
use crate::models::{Category, Record};

/// Fragments shorter than this never trigger the "query contains name
/// fragment" rule of the substring scan (`1`, `2`, `ON`, `AC`).
const MIN_SCAN_FRAGMENT_LEN: usize = 3;

/// Derived lookup tables. Values are positions in the catalog's record slice.
#[derive(Debug)]
struct IndexTables {
    exact: HashMap<String, usize>,
    by_category: HashMap<Category, Vec<usize>>,
    keywords: HashMap<String, BTreeSet<String>>,
    partial: BTreeMap<String, Vec<usize>>,
}

impl IndexTables {
    fn build(catalog: &RecordCatalog) -> Self {
        let mut exact = HashMap::new();
        let mut by_category: HashMap<Category, Vec<usize>> = HashMap::new();
        let mut keywords: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut partial: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (pos, record) in catalog.records().iter().enumerate() {
            let name_lower = record.name.to_lowercase();

            exact.entry(name_lower.clone()).or_insert(pos);
            by_category.entry(record.category).or_default().push(pos);

            for fragment in name_lower.split('_').filter(|f| !f.is_empty()) {
                keywords
                    .entry(fragment.to_string())
                    .or_default()
                    .insert(record.name.clone());
                let bucket = partial.entry(fragment.to_string()).or_default();
                if !bucket.contains(&pos) {
                    bucket.push(pos);
                }
            }

            let bucket = partial.entry(name_lower).or_default();
            if !bucket.contains(&pos) {
                bucket.push(pos);
            }
        }

        Self {
            exact,
            by_category,
            keywords,
            partial,
        }
    }
}

/// Search index over an immutable catalog.
#[derive(Debug)]
pub struct SearchIndex {
    catalog: Arc<RecordCatalog>,
    tables: OnceLock<IndexTables>,
}

impl SearchIndex {
    /// Create an index; the tables are built lazily on the first query.
    pub fn new(catalog: Arc<RecordCatalog>) -> Self {
        Self {
            catalog,
            tables: OnceLock::new(),
        }
    }

    pub fn catalog(&self) -> &RecordCatalog {
        &self.catalog
    }

    /// Build the tables now instead of on first query. Idempotent.
    pub fn warm(&self) {
        self.tables();
    }

    pub fn is_built(&self) -> bool {
        self.tables.get().is_some()
    }

    fn tables(&self) -> &IndexTables {
        self.tables.get_or_init(|| IndexTables::build(&self.catalog))
    }

    fn record(&self, pos: usize) -> &Record {
        &self.catalog.records()[pos]
    }

    /// Case-insensitive exact lookup by name.
    pub fn by_exact_name(&self, name: &str) -> Option<&Record> {
        let key = name.trim().to_lowercase();
        self.tables().exact.get(&key).map(|&pos| self.record(pos))
    }

    /// All records in `category`, in catalog order. Empty if the category has none.
    pub fn by_category(&self, category: Category) -> Vec<&Record> {
        self.tables()
            .by_category
            .get(&category)
            .map(|positions| positions.iter().map(|&p| self.record(p)).collect())
            .unwrap_or_default()
    }

    /// Tiered search. Never fails; "not found" is an empty list.
    pub fn search(&self, keyword: &str) -> Vec<&Record> {
        let query = keyword.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let tables = self.tables();
        let upper = query.to_uppercase();
        let lower = query.to_lowercase();
        let terms: Vec<&str> = lower.split_whitespace().collect();

        if let Some(&pos) = tables.exact.get(&lower) {
            return vec![self.record(pos)];
        }

        for category in self.catalog.categories() {
            if category.as_str().contains(&upper) {
                let matches = self.by_category(category);
                if !matches.is_empty() {
                    return order_by_relevance(matches, &upper);
                }
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut matches: Vec<&Record> = Vec::new();

        for term in &terms {
            if let Some(names) = tables.keywords.get(*term) {
                for name in names {
                    if let Some(&pos) = tables.exact.get(&name.to_lowercase()) {
                        let record = self.record(pos);
                        if seen.insert(record.name.as_str()) {
                            matches.push(record);
                        }
                    }
                }
            }
        }

        if matches.is_empty() {
            for term in &terms {
                for (fragment, positions) in &tables.partial {
                    if !fragment.contains(term) {
                        continue;
                    }
                    for &pos in positions {
                        let record = self.record(pos);
                        if seen.insert(record.name.as_str()) {
                            matches.push(record);
                        }
                    }
                }
            }
        }

        if matches.is_empty() {
            for record in self.catalog.records() {
                let name_lower = record.name.to_lowercase();
                let hit = name_lower.contains(&lower)
                    || name_lower
                        .split('_')
                        .filter(|f| f.len() >= MIN_SCAN_FRAGMENT_LEN)
                        .any(|f| lower.contains(f))
                    || terms.iter().any(|t| name_lower.contains(t));
                if hit && seen.insert(record.name.as_str()) {
                    matches.push(record);
                }
            }
        }

        order_by_relevance(matches, &upper)
    }
}

/// Stable partition into exact, prefix, infix, and other matches.
fn order_by_relevance<'a>(matches: Vec<&'a Record>, query_upper: &str) -> Vec<&'a Record> {
    let mut exact = Vec::new();
    let mut prefix = Vec::new();
    let mut infix = Vec::new();
    let mut other = Vec::new();

    for record in matches {
        let name = record.name.to_uppercase();
        if name == query_upper {
            exact.push(record);
        } else if name.starts_with(query_upper) {
            prefix.push(record);
        } else if name.contains(query_upper) {
            infix.push(record);
        } else {
            other.push(record);
        }
    }

    exact.extend(prefix);
    exact.extend(infix);
    exact.extend(other);
    exact
}
