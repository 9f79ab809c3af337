//! Payload flattening and URL encoding.
//!
//! Form bodies and query strings flatten sequences differently unless
//! `arrays_as_form_args` is set: form bodies use indexed `key[i]` keys, query
//! strings join the elements with commas. With the flag set, both repeat the
//! key once per element, in element order.

use url::form_urlencoded;

use crate::config::{Payload, PayloadValue};

/// Flattens `payload` into pairs for a form body.
pub fn form_pairs(payload: &Payload, arrays_as_form_args: bool) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(payload.len());
    for (key, value) in payload.iter() {
        match value {
            PayloadValue::Single(v) => pairs.push((key.to_string(), v.clone())),
            PayloadValue::List(items) if arrays_as_form_args => {
                pairs.extend(items.iter().map(|item| (key.to_string(), item.clone())));
            }
            PayloadValue::List(items) => {
                pairs.extend(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (format!("{key}[{i}]"), item.clone())),
                );
            }
        }
    }
    pairs
}

/// Flattens `payload` into pairs for a query string.
pub fn query_pairs(payload: &Payload, arrays_as_form_args: bool) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(payload.len());
    for (key, value) in payload.iter() {
        match value {
            PayloadValue::Single(v) => pairs.push((key.to_string(), v.clone())),
            PayloadValue::List(items) if arrays_as_form_args => {
                pairs.extend(items.iter().map(|item| (key.to_string(), item.clone())));
            }
            PayloadValue::List(items) => pairs.push((key.to_string(), items.join(","))),
        }
    }
    pairs
}

/// `application/x-www-form-urlencoded` with spaces written as `%20`.
pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    // Literal '+' is already escaped as %2B, so every remaining '+' is a space.
    encoded.replace('+', "%20")
}

/// Appends an encoded query to `url`, joining with `&` if it already has one.
pub fn append_query(url: &mut String, encoded: &str) {
    if encoded.is_empty() {
        return;
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(encoded);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        let mut p = Payload::new();
        p.insert("q", "x y");
        p.insert("ids", vec!["1", "2", "3"]);
        p
    }

    #[test]
    fn space_is_percent_twenty() {
        let pairs = vec![("a".to_string(), "x y".to_string())];
        assert_eq!(encode_pairs(&pairs), "a=x%20y");
    }

    #[test]
    fn literal_plus_survives() {
        let pairs = vec![("a".to_string(), "1+1".to_string())];
        assert_eq!(encode_pairs(&pairs), "a=1%2B1");
    }

    #[test]
    fn arrays_as_form_args_repeats_key_in_order() {
        let pairs = form_pairs(&payload(), true);
        assert_eq!(
            encode_pairs(&pairs),
            "q=x%20y&ids=1&ids=2&ids=3"
        );
        assert_eq!(query_pairs(&payload(), true), pairs);
    }

    #[test]
    fn form_arrays_nest_by_index() {
        let pairs = form_pairs(&payload(), false);
        assert_eq!(pairs[1], ("ids[0]".to_string(), "1".to_string()));
        assert_eq!(
            encode_pairs(&pairs),
            "q=x%20y&ids%5B0%5D=1&ids%5B1%5D=2&ids%5B2%5D=3"
        );
    }

    #[test]
    fn query_arrays_join_with_commas() {
        let pairs = query_pairs(&payload(), false);
        assert_eq!(encode_pairs(&pairs), "q=x%20y&ids=1%2C2%2C3");
    }

    #[test]
    fn append_query_picks_separator() {
        let mut url = "http://h/p".to_string();
        append_query(&mut url, "a=1");
        assert_eq!(url, "http://h/p?a=1");
        append_query(&mut url, "b=2");
        assert_eq!(url, "http://h/p?a=1&b=2");
    }

    #[test]
    fn append_query_skips_empty() {
        let mut url = "http://h/p".to_string();
        append_query(&mut url, "");
        assert_eq!(url, "http://h/p");
    }
}
