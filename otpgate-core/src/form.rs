//! Submitted login form data.

use std::collections::HashMap;

use url::form_urlencoded;

/// Ordered multi-valued form fields.
///
/// Keys keep the order of their first appearance; repeated keys collect
/// their values in submission order. Providers look at the first value of
/// each key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, Vec<String>)>,
    /// Position of each key in `fields`.
    index: HashMap<String, usize>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Append a value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&position) => self.fields[position].1.push(value),
            None => {
                self.index.insert(key.clone(), self.fields.len());
                self.fields.push((key, vec![value]));
            }
        }
    }

    fn values(&self, key: &str) -> Option<&Vec<String>> {
        self.index
            .get(key)
            .map(|&position| &self.fields[position].1)
    }

    /// First value submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values submitted for `key`.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(key, first value)` pairs in form order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(k, values)| {
            values.first().map(|v| (k.as_str(), v.as_str()))
        })
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (k, v) in iter {
            form.append(k, v);
        }
        form
    }
}
