//! Tag predicates deciding which objects qualify for area building.

use crate::elements::Tag;

use regex::Regex;

/// Matches a single key or value string.
pub enum StringMatcher {
    AlwaysTrue,
    AlwaysFalse,
    Equal(String),
    Prefix(String),
    Substring(String),
    List(Vec<String>),
    Regex(Regex),
}

impl StringMatcher {
    pub fn equal(s: &str) -> StringMatcher {
        StringMatcher::Equal(String::from(s))
    }

    pub fn prefix(s: &str) -> StringMatcher {
        StringMatcher::Prefix(String::from(s))
    }

    pub fn substring(s: &str) -> StringMatcher {
        StringMatcher::Substring(String::from(s))
    }

    pub fn list(vals: &[&str]) -> StringMatcher {
        StringMatcher::List(vals.iter().map(|v| String::from(*v)).collect())
    }

    pub fn matches(&self, s: &str) -> bool {
        match self {
            StringMatcher::AlwaysTrue => true,
            StringMatcher::AlwaysFalse => false,
            StringMatcher::Equal(t) => s == t,
            StringMatcher::Prefix(t) => s.starts_with(t),
            StringMatcher::Substring(t) => s.contains(t.as_str()),
            StringMatcher::List(tt) => tt.iter().any(|t| s == t),
            StringMatcher::Regex(re) => re.is_match(s),
        }
    }
}

/// Matches one tag: the key matcher must match, the value matcher
/// result is xor-ed with the invert flag.
pub struct TagMatcher {
    key_matcher: StringMatcher,
    value_matcher: StringMatcher,
    invert: bool,
}

impl TagMatcher {
    pub fn new(key_matcher: StringMatcher, value_matcher: StringMatcher, invert: bool) -> TagMatcher {
        TagMatcher {
            key_matcher,
            value_matcher,
            invert,
        }
    }

    /// Any value of the given key.
    pub fn key(key_matcher: StringMatcher) -> TagMatcher {
        TagMatcher::new(key_matcher, StringMatcher::AlwaysTrue, false)
    }

    pub fn matches(&self, key: &str, val: &str) -> bool {
        self.key_matcher.matches(key) && (self.value_matcher.matches(val) != self.invert)
    }
}

/// An ordered list of (result, matcher) rules with a default result for
/// tags no rule covers. A tag list passes when any of its tags matches.
pub struct TagsFilter {
    rules: Vec<(bool, TagMatcher)>,
    default_result: bool,
}

impl TagsFilter {
    pub fn new(default_result: bool) -> TagsFilter {
        TagsFilter {
            rules: Vec::new(),
            default_result,
        }
    }

    pub fn add_rule(&mut self, result: bool, matcher: TagMatcher) -> &mut TagsFilter {
        self.rules.push((result, matcher));
        self
    }

    pub fn test_tag(&self, key: &str, val: &str) -> bool {
        for (result, matcher) in &self.rules {
            if matcher.matches(key, val) {
                return *result;
            }
        }
        self.default_result
    }

    pub fn match_any(&self, tags: &[Tag]) -> bool {
        tags.iter().any(|t| self.test_tag(&t.key, &t.val))
    }

    pub fn match_none(&self, tags: &[Tag]) -> bool {
        !self.match_any(tags)
    }
}

impl Default for TagsFilter {
    fn default() -> TagsFilter {
        TagsFilter::new(true)
    }
}
