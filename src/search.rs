//! Key/value search over records and their inherited ancestor data
//!
//! A [`KeyValueMatcher`] tests one key (or any key) against a query value.
//! Query values that read as a date, datetime or number are compared by
//! value; anything else falls back to wildcard text matching. Matchers
//! compose with [`AndMatcher`] and [`OrMatcher`].

use std::cmp::Ordering;
use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::cache::{Handle, MetadataCache, Scope};
use crate::error::{Result, TameError};
use crate::record::Record;
use crate::scc::{calculate_scc_parent_keyvals, InheritedMap};
use crate::value::Value;

/// How a query value is compared against record values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    /// Value equality for dates and numbers, wildcard match for text
    #[default]
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// Regular expression anchored at the start of the field
    Regex,
}

impl MatchType {
    fn is_ordering(self) -> bool {
        matches!(
            self,
            MatchType::Less | MatchType::LessEqual | MatchType::Greater | MatchType::GreaterEqual
        )
    }
}

/// A value that supports ordering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparable {
    DateTime(NaiveDateTime),
    Number(f64),
}

impl Comparable {
    /// Interpret text as a date or datetime, then as a finite number
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(datetime) = parse_datetime(text) {
            return Some(Comparable::DateTime(datetime));
        }
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Comparable::Number)
    }

    /// Ordering between two values of the same kind
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::DateTime(a), Comparable::DateTime(b)) => Some(a.cmp(b)),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y", "%b %d, %Y"];

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Something that can decide whether a record matches.
///
/// `inherited` is the record's inherited ancestor map.
pub trait Matcher {
    fn matches(&self, record: &Record, inherited: &InheritedMap) -> bool;
}

#[derive(Debug, Clone)]
enum Test {
    Pattern(Regex),
    Compare(MatchType, Comparable),
}

/// Match one key (or any key) against a query value
#[derive(Debug, Clone)]
pub struct KeyValueMatcher {
    key: Option<String>,
    include_parents: bool,
    test: Test,
}

impl KeyValueMatcher {
    /// Build a matcher.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` for an ordering match on a value that is neither a
    /// date nor a number, or for an invalid regular expression.
    pub fn new(
        key: Option<String>,
        value: &str,
        include_parents: bool,
        match_type: MatchType,
    ) -> Result<Self> {
        let comparable = Comparable::parse(value);
        let test = match (match_type, comparable) {
            (MatchType::Regex, _) => Test::Pattern(compile(&format!("^(?:{})", value))?),
            (MatchType::Equal, None) => Test::Pattern(compile(&wildcard_regex(value))?),
            (match_type, Some(comparable)) => Test::Compare(match_type, comparable),
            (match_type, None) => {
                debug_assert!(match_type.is_ordering());
                return Err(TameError::InvalidQuery {
                    message: format!(
                        "ordering match {:?} needs a date or a number, got '{}'",
                        match_type, value
                    ),
                });
            }
        };
        Ok(Self {
            key,
            include_parents,
            test,
        })
    }

    /// Equality match with parents included, the common case
    pub fn equal(key: Option<&str>, value: &str) -> Result<Self> {
        Self::new(key.map(str::to_string), value, true, MatchType::Equal)
    }

    fn key_applies(&self, key: &str) -> bool {
        self.key.as_deref().map_or(true, |k| k == key)
    }

    fn value_matches(&self, value: &Value) -> bool {
        match value {
            Value::Sequence(items) => items.iter().any(|item| self.value_matches(item)),
            Value::Mapping(_) => false,
            scalar => scalar
                .scalar_text()
                .is_some_and(|text| self.text_matches(&text)),
        }
    }

    fn text_matches(&self, text: &str) -> bool {
        match &self.test {
            Test::Pattern(regex) => regex.is_match(text),
            Test::Compare(match_type, query) => {
                let Some(ordering) = Comparable::parse(text).and_then(|v| v.compare(query)) else {
                    return false;
                };
                match match_type {
                    MatchType::Equal => ordering == Ordering::Equal,
                    MatchType::Less => ordering == Ordering::Less,
                    MatchType::LessEqual => ordering != Ordering::Greater,
                    MatchType::Greater => ordering == Ordering::Greater,
                    MatchType::GreaterEqual => ordering != Ordering::Less,
                    MatchType::Regex => false,
                }
            }
        }
    }

    fn own_fields_match(&self, record: &Record) -> bool {
        let reserved = [
            ("type", &record.record_type),
            ("name", &record.name),
            ("uid", &record.uid),
        ];
        reserved
            .iter()
            .any(|(key, text)| self.key_applies(key) && self.text_matches(text))
            || record
                .user_data
                .iter()
                .any(|(key, value)| self.key_applies(key) && self.value_matches(value))
    }

    /// Breadth-first over every ancestor dict and the mappings nested in it
    fn ancestors_match(&self, inherited: &InheritedMap) -> bool {
        let mut queue: VecDeque<_> = inherited.values().collect();
        while let Some(data) = queue.pop_front() {
            for (key, value) in data {
                if self.key_applies(key) && self.value_matches(value) {
                    return true;
                }
                if let Value::Mapping(nested) = value {
                    queue.push_back(nested);
                }
            }
        }
        false
    }
}

impl Matcher for KeyValueMatcher {
    fn matches(&self, record: &Record, inherited: &InheritedMap) -> bool {
        self.own_fields_match(record) || (self.include_parents && self.ancestors_match(inherited))
    }
}

/// Matches when every inner matcher matches; empty matches everything
#[derive(Default)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, record: &Record, inherited: &InheritedMap) -> bool {
        self.matchers.iter().all(|m| m.matches(record, inherited))
    }
}

/// Matches when any inner matcher matches; empty matches everything
#[derive(Default)]
pub struct OrMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl OrMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for OrMatcher {
    fn matches(&self, record: &Record, inherited: &InheritedMap) -> bool {
        self.matchers.is_empty() || self.matchers.iter().any(|m| m.matches(record, inherited))
    }
}

/// Every record in the cache that `matcher` accepts, in handle order
pub fn search(cache: &mut MetadataCache, matcher: &dyn Matcher) -> Vec<Handle> {
    search_scoped(cache, &Scope::Everything, matcher)
}

/// Like [`search`], restricted to records registered under `scope`.
///
/// Inheritance is still computed over the whole cache.
pub fn search_scoped(cache: &mut MetadataCache, scope: &Scope, matcher: &dyn Matcher) -> Vec<Handle> {
    let keyvals = calculate_scc_parent_keyvals(cache);
    let Some(mut candidates) = cache.subtree_handles(scope) else {
        return Vec::new();
    };
    candidates.sort_unstable();

    let hits: Vec<Handle> = candidates
        .into_iter()
        .filter(|&handle| matcher.matches(cache.get(handle), keyvals.for_handle(handle)))
        .collect();
    tracing::info!("Search matched {} record(s)", hits.len());
    hits
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| TameError::InvalidQuery {
        message: format!("invalid pattern '{}': {}", pattern, e),
    })
}

/// Regex for a shell-style wildcard search that matches `value` anywhere.
///
/// `*` and `?` are wildcards, `[seq]` and `[!seq]` are character classes.
/// An unclosed `[` is literal.
fn wildcard_regex(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut pattern = String::from("(?s)^.*");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    pattern.push_str(&char_class(&chars[i + 1..end]));
                    i = end;
                }
                None => pattern.push_str("\\["),
            },
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }
    pattern.push_str(".*$");
    pattern
}

/// Index of the `]` closing the class opened at `start`
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    // A leading `]` is a member, not the end
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

fn char_class(body: &[char]) -> String {
    let mut class = String::from("[");
    let mut members = body;
    if body.first() == Some(&'!') {
        class.push('^');
        members = &body[1..];
    }
    for &c in members {
        if c == '-' {
            class.push(c);
        } else {
            class.push_str(&regex::escape(&c.to_string()));
        }
    }
    class.push(']');
    class
}
