//! Ordered, case-insensitive header multi-map.
//!
//! Values for one name keep their exact cardinality and order. Nothing in
//! this module deduplicates or sorts values; the header assertions depend on
//! seeing them exactly as the host wrote them.

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ConfigError;

#[derive(Debug, Clone)]
struct HeaderEntry {
    name: String,
    values: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct HeaderValues {
    entries: Vec<HeaderEntry>,
}

impl HeaderValues {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, name: &str) -> Option<&HeaderEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    fn entry_mut(&mut self, name: &str) -> &mut HeaderEntry {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name));

        match position {
            Some(index) => &mut self.entries[index],
            None => {
                self.entries.push(HeaderEntry {
                    name: name.to_string(),
                    values: Vec::new(),
                });
                let last = self.entries.len() - 1;
                &mut self.entries[last]
            }
        }
    }

    /// Append a value after any existing values for `name`.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entry_mut(name).values.push(Some(value.into()));
    }

    /// Record an explicitly null value for `name`.
    pub fn append_null(&mut self, name: &str) {
        self.entry_mut(name).values.push(None);
    }

    /// Replace every value of `name` with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let entry = self.entry_mut(name);
        entry.values.clear();
        entry.values.push(Some(value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.entries
            .retain(|entry| !entry.name.eq_ignore_ascii_case(name));
    }

    /// All recorded values for `name`, nulls included.
    pub fn values(&self, name: &str) -> &[Option<String>] {
        self.entry(name)
            .map(|entry| entry.values.as_slice())
            .unwrap_or(&[])
    }

    /// Recorded values for `name` with nulls skipped, in original order.
    pub fn non_null_values(&self, name: &str) -> Vec<&str> {
        self.values(name)
            .iter()
            .filter_map(|value| value.as_deref())
            .collect()
    }

    /// First non-null value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).iter().find_map(|value| value.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|entry| !entry.values.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| entry.values.is_empty())
    }

    /// Iterate `(name, value)` pairs in insertion order, nulls skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|entry| {
            entry
                .values
                .iter()
                .filter_map(|value| value.as_deref())
                .map(|value| (entry.name.as_str(), value))
        })
    }

    /// Build an `http::HeaderMap`, validating every name and value.
    pub fn to_header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();

        for (key, value) in self.iter() {
            if key.is_empty() {
                continue;
            }

            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
                ConfigError::InvalidHeader {
                    name: key.to_string(),
                    reason: err.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|err| ConfigError::InvalidHeader {
                    name: key.to_string(),
                    reason: err.to_string(),
                })?;
            headers.append(header_name, header_value);
        }

        Ok(headers)
    }
}

impl From<&HeaderMap> for HeaderValues {
    fn from(map: &HeaderMap) -> Self {
        let mut headers = HeaderValues::new();
        for name in map.keys() {
            for value in map.get_all(name) {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                headers.append(name.as_str(), value);
            }
        }
        headers
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for HeaderValues {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = HeaderValues::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = HeaderValues::new();
        headers.append("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.values("CONTENT-TYPE").len(), 1);
    }

    #[test]
    fn keeps_every_value_in_order() {
        let mut headers = HeaderValues::new();
        headers.append("Foo", "Bar2");
        headers.append("foo", "Bar1");
        headers.append("Foo", "Bar2");

        assert_eq!(headers.non_null_values("Foo"), vec!["Bar2", "Bar1", "Bar2"]);
    }

    #[test]
    fn nulls_are_recorded_but_not_counted() {
        let mut headers = HeaderValues::new();
        headers.append_null("Foo");
        headers.append("Foo", "Bar");

        assert_eq!(headers.values("Foo").len(), 2);
        assert_eq!(headers.non_null_values("Foo"), vec!["Bar"]);
        assert_eq!(headers.get("Foo"), Some("Bar"));
    }

    #[test]
    fn set_replaces_values() {
        let mut headers = HeaderValues::new();
        headers.append("Accept", "text/plain");
        headers.append("Accept", "text/html");
        headers.set("accept", "application/json");

        assert_eq!(headers.non_null_values("Accept"), vec!["application/json"]);
    }

    #[test]
    fn missing_header_has_no_values() {
        let headers = HeaderValues::new();
        assert!(headers.values("Foo").is_empty());
        assert!(!headers.contains("Foo"));
        assert!(headers.is_empty());
    }

    #[test]
    fn header_map_round_trip_keeps_multiple_values() {
        let mut map = HeaderMap::new();
        map.append("x-trace", HeaderValue::from_static("a"));
        map.append("x-trace", HeaderValue::from_static("b"));

        let headers = HeaderValues::from(&map);
        assert_eq!(headers.non_null_values("X-Trace"), vec!["a", "b"]);

        let back = headers.to_header_map().unwrap();
        assert_eq!(back.get_all("x-trace").iter().count(), 2);
    }

    #[test]
    fn invalid_header_name_is_a_config_error() {
        let mut headers = HeaderValues::new();
        headers.append("bad header", "value");

        let err = headers.to_header_map().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));
    }
}
