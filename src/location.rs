// URL query parameters and the in-memory location provider.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

pub const START: &str = "start";
pub const END: &str = "end";
pub const DISPLAY: &str = "display";
pub const ALERT: &str = "alert";
pub const EVENT: &str = "event";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams(BTreeMap<String, String>);

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a query string. A leading `?` is ignored and later duplicates win.
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        Self(
            form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.remove(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl FromStr for SearchParams {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Browser-like location with history.
///
/// Writes are never reported synchronously: a change is queued and handed out
/// once by [`MemoryLocation::take_change`], the way a browser fires its
/// navigation event after the current callback returns.
#[derive(Debug, Clone)]
pub struct MemoryLocation {
    history: Vec<SearchParams>,
    cursor: usize,
    changed: bool,
}

impl MemoryLocation {
    pub fn new(initial: SearchParams) -> Self {
        Self {
            history: vec![initial],
            cursor: 0,
            changed: false,
        }
    }

    pub fn search(&self) -> SearchParams {
        self.history[self.cursor].clone()
    }

    /// Replaces all parameters. Writing the current value is a no-op.
    pub fn set_search(&mut self, params: SearchParams) {
        if params == self.history[self.cursor] {
            return;
        }
        self.history.truncate(self.cursor + 1);
        self.history.push(params);
        self.cursor = self.history.len() - 1;
        self.changed = true;
    }

    /// External navigation, e.g. a followed link.
    pub fn navigate(&mut self, params: SearchParams) {
        self.set_search(params);
    }

    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.changed = true;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.history.len() {
            return false;
        }
        self.cursor += 1;
        self.changed = true;
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    pub fn take_change(&mut self) -> Option<SearchParams> {
        if self.changed {
            self.changed = false;
            Some(self.search())
        } else {
            None
        }
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new(SearchParams::new())
    }
}
