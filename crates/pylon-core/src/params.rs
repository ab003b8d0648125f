//! Raw string parameters captured from the request path.

use smallvec::SmallVec;

/// Route templates in practice carry one or two placeholders.
const INLINE_PARAMS: usize = 2;

/// Path parameters as `(name, value)` pairs, in template order.
///
/// Values are kept as raw strings. Coercion to the declared field type
/// happens in the binder.
///
/// ```
/// use pylon_core::Params;
///
/// let params: Params = [("id", "42")].into_iter().collect();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(!params.contains("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if a parameter named `name` was captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_wins_on_duplicate_names() {
        let mut params = Params::new();
        params.push("id", "1");
        params.push("id", "2");
        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_iter_keeps_template_order() {
        let params: Params = [("artist", "7"), ("track", "3")].into_iter().collect();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("artist", "7"), ("track", "3")]);
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let params: Params = (0..6).map(|i| (format!("p{i}"), i.to_string())).collect();
        assert_eq!(params.len(), 6);
        assert_eq!(params.get("p5"), Some("5"));
    }
}
