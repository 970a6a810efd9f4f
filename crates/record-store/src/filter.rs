//! Predicate builder and pagination primitives shared by all listings.
//!
//! A [`Filter`] is a storage-neutral description of a row predicate: an
//! OR-group of case-insensitive substring matches (search) combined with
//! AND-ed exact matches (status, category). The in-memory backend
//! evaluates it directly against records; the PostgreSQL backend compiles
//! it to a WHERE clause.

/// How a single field is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    /// Case-insensitive substring match. The needle is stored lowercased.
    Contains(String),
    /// Exact match.
    Equals(String),
}

/// A predicate on one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: &'static str,
    pub matcher: TextMatch,
}

impl Clause {
    fn matches<R: Searchable + ?Sized>(&self, record: &R) -> bool {
        let Some(text) = record.text_field(self.field) else {
            return false;
        };
        match &self.matcher {
            TextMatch::Contains(needle) => text.to_lowercase().contains(needle),
            TextMatch::Equals(value) => text == value,
        }
    }
}

/// A row predicate: `(any_of[0] OR any_of[1] OR …) AND all_of[0] AND …`.
///
/// An empty OR-group matches everything, so the empty filter matches
/// every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    any_of: Vec<Clause>,
    all_of: Vec<Clause>,
}

impl Filter {
    /// Creates an empty filter that matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a case-insensitive substring clause for `term` on each of
    /// `fields`, OR-ed together. A blank term adds nothing.
    pub fn search(mut self, fields: &[&'static str], term: &str) -> Self {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self;
        }
        for field in fields {
            self.any_of.push(Clause {
                field,
                matcher: TextMatch::Contains(term.clone()),
            });
        }
        self
    }

    /// Adds an AND-ed exact-match clause.
    pub fn equals(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.all_of.push(Clause {
            field,
            matcher: TextMatch::Equals(value.into()),
        });
        self
    }

    /// Returns true if no clauses were added.
    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty() && self.all_of.is_empty()
    }

    /// The OR-group clauses.
    pub fn any_of(&self) -> &[Clause] {
        &self.any_of
    }

    /// The AND-ed clauses.
    pub fn all_of(&self) -> &[Clause] {
        &self.all_of
    }

    /// Evaluates the predicate against a record.
    pub fn matches<R: Searchable + ?Sized>(&self, record: &R) -> bool {
        let any_ok = self.any_of.is_empty() || self.any_of.iter().any(|c| c.matches(record));
        let all_ok = self.all_of.iter().all(|c| c.matches(record));
        any_ok && all_ok
    }
}

/// Records that expose named text fields for filter evaluation.
pub trait Searchable {
    /// Returns the text value of `field`, or `None` when the field is
    /// unset or unknown to this record type.
    fn text_field(&self, field: &str) -> Option<&str>;
}

/// A validated page request. `page` and `limit` are both 1-based and at
/// least 1; bounds are checked by the service layer before construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Creates a page request. Values below 1 are clamped to 1; the
    /// service layer rejects them with a typed error before reaching here.
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of rows plus the total row count under the same filter.
///
/// `total` is always counted against the same snapshot the rows were
/// read from, so `rows.len() <= limit` and the two never disagree within
/// a single call.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub rows: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: String,
        email: Option<String>,
    }

    impl Searchable for Row {
        fn text_field(&self, field: &str) -> Option<&str> {
            match field {
                "name" => Some(&self.name),
                "email" => self.email.as_deref(),
                _ => None,
            }
        }
    }

    fn row(name: &str, email: Option<&str>) -> Row {
        Row {
            name: name.to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&row("anything", None)));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let filter = Filter::new().search(&["name", "email"], "ADA");
        assert!(filter.matches(&row("Ada Lovelace", None)));
        assert!(filter.matches(&row("x", Some("ada@example.com"))));
        assert!(!filter.matches(&row("Grace", Some("grace@example.com"))));
    }

    #[test]
    fn search_or_group_needs_only_one_field() {
        let filter = Filter::new().search(&["name", "email"], "example");
        // name doesn't match but email does
        assert!(filter.matches(&row("Ada", Some("ada@example.com"))));
    }

    #[test]
    fn equals_is_anded_with_search() {
        let filter = Filter::new()
            .search(&["name"], "ada")
            .equals("email", "ada@example.com");
        assert!(filter.matches(&row("Ada", Some("ada@example.com"))));
        assert!(!filter.matches(&row("Ada", Some("other@example.com"))));
    }

    #[test]
    fn unset_optional_field_never_matches() {
        let filter = Filter::new().search(&["email"], "ada");
        assert!(!filter.matches(&row("ada", None)));
    }

    #[test]
    fn blank_search_term_is_ignored() {
        let filter = Filter::new().search(&["name"], "   ");
        assert!(filter.is_empty());
    }

    #[test]
    fn page_request_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
        assert_eq!(PageRequest::new(2, 7).offset(), 7);
    }
}
