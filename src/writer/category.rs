//! Category definitions, row sources, filters and format overrides.

use std::collections::{HashMap, HashSet};

use super::field::{Field, FieldFormat};

/// One chunk of rows backing a category.
pub struct CategorySource<'a, D> {
    pub data: &'a D,
    pub row_count: usize,
    /// Row keys passed to the field getters; `0..row_count` when unset.
    pub keys: Option<Vec<usize>>,
}

impl<'a, D> CategorySource<'a, D> {
    pub fn new(data: &'a D, row_count: usize) -> Self {
        Self {
            data,
            row_count,
            keys: None,
        }
    }

    pub fn with_keys(data: &'a D, keys: Vec<usize>) -> Self {
        Self {
            data,
            row_count: keys.len(),
            keys: Some(keys),
        }
    }

    pub fn keys(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match &self.keys {
            Some(keys) => Box::new(keys.iter().copied()),
            None => Box::new(0..self.row_count),
        }
    }
}

/// Resolved contents of a category for one write.
pub struct CategoryInstance<'a, D> {
    pub fields: Vec<Field<D>>,
    pub source: Vec<CategorySource<'a, D>>,
}

impl<'a, D> CategoryInstance<'a, D> {
    pub fn new(fields: Vec<Field<D>>, source: Vec<CategorySource<'a, D>>) -> Self {
        Self { fields, source }
    }

    /// A category backed by a single data chunk.
    pub fn single(fields: Vec<Field<D>>, data: &'a D, row_count: usize) -> Self {
        Self::new(fields, vec![CategorySource::new(data, row_count)])
    }

    /// Total rows over the non-empty sources.
    pub fn row_count(&self) -> usize {
        self.source.iter().map(|s| s.row_count).sum()
    }

    /// Sources that contribute rows.
    pub fn sources(&self) -> impl Iterator<Item = &CategorySource<'a, D>> {
        self.source.iter().filter(|s| s.row_count > 0)
    }

    /// `(key, data)` for every row in write order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &'a D)> + '_ {
        self.sources()
            .flat_map(|s| s.keys().take(s.row_count).map(move |k| (k, s.data)))
    }

    /// Fields whose `should_include` predicate accepts any source.
    pub fn included_fields(&self) -> Vec<&Field<D>> {
        self.fields
            .iter()
            .filter(|f| match &f.should_include {
                Some(include) => self.sources().any(|s| include(s.data)),
                None => true,
            })
            .collect()
    }
}

/// A writable category.
pub trait Category {
    type Data;
    type Context;

    fn name(&self) -> &str;
    fn instance<'a>(&'a self, ctx: &'a Self::Context) -> CategoryInstance<'a, Self::Data>;
}

/// Decides which categories and fields are written.
pub trait CategoryFilter {
    fn include_category(&self, category: &str) -> bool;
    fn include_field(&self, category: &str, field: &str) -> bool;
}

/// Includes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilter;

impl CategoryFilter for DefaultFilter {
    fn include_category(&self, _category: &str) -> bool {
        true
    }

    fn include_field(&self, _category: &str, _field: &str) -> bool {
        true
    }
}

/// Filter built from newline separated `category` / `category.field`
/// directives. A leading `!` blacklists the entry.
///
/// Blacklisted entries always lose. Whitelisting a field also whitelists its
/// category, and a category with field entries only keeps those fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveFilter {
    category_whitelist: HashSet<String>,
    category_blacklist: HashSet<String>,
    field_whitelist: HashSet<String>,
    field_blacklist: HashSet<String>,
    /// Categories that have at least one whitelisted field.
    restricted: HashSet<String>,
}

impl DirectiveFilter {
    pub fn parse(directives: &str) -> Self {
        let mut filter = Self::default();
        for line in directives.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (blacklist, entry) = match line.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };
            match entry.split_once('.') {
                // field directives of either kind make their category known
                Some((category, _)) if blacklist => {
                    filter.field_blacklist.insert(entry.to_string());
                    filter.category_whitelist.insert(category.to_string());
                }
                Some((category, _)) => {
                    filter.field_whitelist.insert(entry.to_string());
                    filter.restricted.insert(category.to_string());
                    filter.category_whitelist.insert(category.to_string());
                }
                None if blacklist => {
                    filter.category_blacklist.insert(entry.to_string());
                }
                None => {
                    filter.category_whitelist.insert(entry.to_string());
                }
            }
        }
        filter
    }
}

impl CategoryFilter for DirectiveFilter {
    fn include_category(&self, category: &str) -> bool {
        if self.category_blacklist.contains(category) {
            return false;
        }
        self.category_whitelist.is_empty() || self.category_whitelist.contains(category)
    }

    fn include_field(&self, category: &str, field: &str) -> bool {
        let full = format!("{category}.{field}");
        if self.field_blacklist.contains(&full) {
            return false;
        }
        !self.restricted.contains(category) || self.field_whitelist.contains(&full)
    }
}

/// Per-field format overrides applied by the writers.
pub trait CategoryFormatter {
    fn get_format(&self, category: &str, field: &str) -> Option<FieldFormat>;
}

/// No overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl CategoryFormatter for DefaultFormatter {
    fn get_format(&self, _category: &str, _field: &str) -> Option<FieldFormat> {
        None
    }
}

/// Formats keyed by `(category, field)`.
#[derive(Debug, Clone, Default)]
pub struct FormatTable {
    formats: HashMap<(String, String), FieldFormat>,
}

impl FormatTable {
    pub fn insert(&mut self, category: &str, field: &str, format: FieldFormat) {
        self.formats
            .insert((category.to_string(), field.to_string()), format);
    }
}

impl CategoryFormatter for FormatTable {
    fn get_format(&self, category: &str, field: &str) -> Option<FieldFormat> {
        self.formats
            .get(&(category.to_string(), field.to_string()))
            .cloned()
    }
}
