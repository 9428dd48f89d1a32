#![forbid(unsafe_code)]

//! Dependency path grammar.
//!
//! A dependency key such as `"elements.Li.name"`, `"accounts.@each.amount"`
//! or `"accounts.[]"` is parsed into a [`Path`]: an ordered list of plain
//! segments plus an optional trailing collection [`Projection`].
//!
//! # Grammar
//!
//! The key is split on `.`. Then, in order:
//!
//! 1. If a token is the literal `@each` and at least one token follows it,
//!    the projection is [`Projection::EachField`] carrying the remaining
//!    tokens (re-joined with `.`), and the tokens before `@each` form the
//!    base segments.
//! 2. Otherwise, if the last token is the literal `[]`, the projection is
//!    [`Projection::WholeCollection`] and the preceding tokens form the base.
//! 3. Otherwise every token is a plain segment.
//!
//! # Invariants
//!
//! 1. Parsing is total: every string yields a `Path`.
//! 2. Parsing is deterministic: equal keys yield equal paths.
//! 3. `Path::parse(&path.to_string()) == path` for every parsed path.
//!
//! Parsed paths are immutable and cheap to share, so [`PathCache`] interns
//! them per literal key string.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

/// Literal token introducing a per-element projection.
pub const EACH_TOKEN: &str = "@each";

/// Literal trailing token observing a collection's structure.
pub const WHOLE_COLLECTION_TOKEN: &str = "[]";

/// Collection observation mode at the end of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    /// No projection; the path names a single value.
    #[default]
    None,
    /// `base.@each.field`: project `field` out of every element.
    ///
    /// The field may itself be dotted (`a.@each.b.c`).
    EachField(String),
    /// `base.[]`: the collection itself, observed structurally.
    WholeCollection,
}

impl Projection {
    /// Whether this projection requires the base to be a collection.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A parsed dependency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
    projection: Projection,
}

impl Path {
    /// Parse a dependency key. Never fails.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        let tokens: Vec<&str> = key.split('.').collect();

        if let Some(at) = tokens.iter().position(|t| *t == EACH_TOKEN)
            && at + 1 < tokens.len()
        {
            return Self {
                segments: owned(&tokens[..at]),
                projection: Projection::EachField(tokens[at + 1..].join(".")),
            };
        }

        if tokens.last() == Some(&WHOLE_COLLECTION_TOKEN) {
            return Self {
                segments: owned(&tokens[..tokens.len() - 1]),
                projection: Projection::WholeCollection,
            };
        }

        Self {
            segments: owned(&tokens),
            projection: Projection::None,
        }
    }

    /// Base segments, in resolution order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Trailing projection.
    #[must_use]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// First segment, if any.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Last base segment, if any.
    #[must_use]
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Whether the path has exactly one plain segment and no projection.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1 && self.projection == Projection::None
    }

    /// Names a compute parameter may use to receive this key's value.
    ///
    /// - plain path: the last segment;
    /// - `base.[]`: the last base segment;
    /// - `base.@each.field`: the last base segment, then `field`.
    #[must_use]
    pub fn binding_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.last_segment().into_iter().collect();
        if let Projection::EachField(field) = &self.projection {
            names.push(field.as_str());
        }
        names
    }

    /// Whether `name` is one of [`binding_names`](Self::binding_names).
    #[must_use]
    pub fn binds(&self, name: &str) -> bool {
        self.last_segment() == Some(name)
            || matches!(&self.projection, Projection::EachField(field) if field == name)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))?;
        let suffix = match &self.projection {
            Projection::None => return Ok(()),
            Projection::EachField(field) => format!("{EACH_TOKEN}.{field}"),
            Projection::WholeCollection => WHOLE_COLLECTION_TOKEN.to_string(),
        };
        if !self.segments.is_empty() {
            f.write_str(".")?;
        }
        f.write_str(&suffix)
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl From<&str> for Path {
    fn from(key: &str) -> Self {
        Self::parse(key)
    }
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| (*t).to_string()).collect()
}

// ---------------------------------------------------------------------------
// PathCache
// ---------------------------------------------------------------------------

/// Interning cache from key string to parsed [`Path`].
#[derive(Debug, Default)]
pub struct PathCache {
    entries: AHashMap<String, Rc<Path>>,
    hits: u64,
    misses: u64,
}

impl PathCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared parse of `key`, parsing it on first use.
    pub fn intern(&mut self, key: &str) -> Rc<Path> {
        if let Some(path) = self.entries.get(key) {
            self.hits += 1;
            return Rc::clone(path);
        }
        self.misses += 1;
        let path = Rc::new(Path::parse(key));
        self.entries.insert(key.to_string(), Rc::clone(&path));
        path
    }

    /// Number of distinct keys parsed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been parsed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups served from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that required a parse.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

thread_local! {
    static PATH_CACHE: RefCell<PathCache> = RefCell::new(PathCache::new());
}

/// Intern `key` in the thread-local path cache.
pub fn intern(key: &str) -> Rc<Path> {
    PATH_CACHE.with(|cache| cache.borrow_mut().intern(key))
}

/// Run `f` with read access to the thread-local path cache.
pub fn with_cache<R>(f: impl FnOnce(&PathCache) -> R) -> R {
    PATH_CACHE.with(|cache| f(&cache.borrow()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &Path) -> Vec<&str> {
        path.segments().iter().map(String::as_str).collect()
    }

    #[test]
    fn single_segment() {
        let p = Path::parse("a");
        assert_eq!(segs(&p), ["a"]);
        assert_eq!(p.projection(), &Projection::None);
        assert!(p.is_simple());
    }

    #[test]
    fn multi_segment() {
        let p = Path::parse("App.currentElement");
        assert_eq!(segs(&p), ["App", "currentElement"]);
        assert_eq!(p.head(), Some("App"));
        assert_eq!(p.last_segment(), Some("currentElement"));
        assert!(!p.is_simple());
    }

    #[test]
    fn each_projection() {
        let p = Path::parse("accounts.@each.amount");
        assert_eq!(segs(&p), ["accounts"]);
        assert_eq!(p.projection(), &Projection::EachField("amount".into()));
    }

    #[test]
    fn each_projection_keeps_dotted_field() {
        let p = Path::parse("a.b.@each.c.d");
        assert_eq!(segs(&p), ["a", "b"]);
        assert_eq!(p.projection(), &Projection::EachField("c.d".into()));
    }

    #[test]
    fn whole_collection() {
        let p = Path::parse("accounts.[]");
        assert_eq!(segs(&p), ["accounts"]);
        assert_eq!(p.projection(), &Projection::WholeCollection);
    }

    #[test]
    fn trailing_each_without_field_is_plain() {
        let p = Path::parse("accounts.@each");
        assert_eq!(segs(&p), ["accounts", "@each"]);
        assert_eq!(p.projection(), &Projection::None);
    }

    #[test]
    fn inner_brackets_are_plain() {
        let p = Path::parse("a.[].b");
        assert_eq!(segs(&p), ["a", "[]", "b"]);
        assert_eq!(p.projection(), &Projection::None);
    }

    #[test]
    fn empty_key_is_one_empty_segment() {
        let p = Path::parse("");
        assert_eq!(segs(&p), [""]);
        assert_eq!(p.to_string(), "");
    }

    #[test]
    fn leading_each_has_empty_base() {
        let p = Path::parse("@each.x");
        assert!(p.segments().is_empty());
        assert_eq!(p.projection(), &Projection::EachField("x".into()));
        assert_eq!(p.to_string(), "@each.x");
    }

    #[test]
    fn display_round_trips() {
        for key in [
            "a",
            "a.b.c",
            "accounts.@each.amount",
            "accounts.[]",
            "[]",
            "x.@each.y.z",
        ] {
            assert_eq!(Path::parse(key).to_string(), key);
        }
    }

    #[test]
    fn binding_names_by_projection() {
        assert_eq!(Path::parse("elements.Li.name").binding_names(), ["name"]);
        assert_eq!(Path::parse("accounts.[]").binding_names(), ["accounts"]);
        assert_eq!(
            Path::parse("accounts.@each.amount").binding_names(),
            ["accounts", "amount"]
        );
        assert!(Path::parse("accounts.@each.amount").binds("amount"));
        assert!(!Path::parse("accounts.@each.amount").binds("amounts"));
    }

    #[test]
    fn cache_interns_once() {
        let mut cache = PathCache::new();
        let a = cache.intern("a.b");
        let b = cache.intern("a.b");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn thread_local_cache_shares_parses() {
        let a = intern("thread.local.key");
        let b = intern("thread.local.key");
        assert!(Rc::ptr_eq(&a, &b));
        assert!(with_cache(|c| c.hits()) >= 1);
    }
}
