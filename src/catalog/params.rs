//! Raw query parameters, normalized to ordered key → values sequences.
//!
//! A parameter can arrive once or many times depending on the client. Everything
//! downstream reads through this type, so "scalar or list" never leaks further.

use rust_decimal::Decimal;
use std::str::FromStr;
use url::form_urlencoded;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        Self { pairs: form_urlencoded::parse(query.as_bytes()).into_owned().collect() }
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self { pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    /// Every value given for `key`, in request order.
    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }

    /// The value of a single-valued parameter. Repeating such a parameter makes it
    /// ambiguous, and an ambiguous value is treated as absent.
    pub fn single(&self, key: &str) -> Option<&str> {
        match self.all(key).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Serializes every parameter except `page`, skipping empty values. Repeated keys
    /// stay repeated, so filter links keep multi-valued selections.
    pub fn query_string_without_page(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            if k == "page" || v.is_empty() { continue; }
            out.append_pair(k, v);
        }
        out.finish()
    }
}

/// Numeric coercion of a raw parameter: trimmed, plain or scientific notation.
/// Blank or non-numeric input is `None`.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { return None; }
    Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_are_kept_in_order() {
        let q = QueryParams::parse("brand=Midea&brand=Gree&page=2&class=visok");
        assert_eq!(q.all("brand"), ["Midea", "Gree"]);
        assert_eq!(q.single("brand"), None);
        assert_eq!(q.single("class"), Some("visok"));
        assert_eq!(q.first("page"), Some("2"));
    }

    #[test]
    fn test_query_string_strips_page_and_empties() {
        let q = QueryParams::parse("brand=Fuji+Electric&page=3&minPrice=&brand=LG&wifi=1");
        assert_eq!(q.query_string_without_page(), "brand=Fuji+Electric&brand=LG&wifi=1");
        assert_eq!(QueryParams::default().query_string_without_page(), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 9000 "), Some(Decimal::new(9000, 0)));
        assert_eq!(parse_number("12.5"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_number("1e3"), Some(Decimal::new(1000, 0)));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
    }
}
