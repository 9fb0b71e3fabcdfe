//! Final URL assembly: base URL plus query parameters.

use std::collections::HashMap;
use url::Url;

use crate::error::HrqError;

/// Append `params` to `base` as a query string. The first pair is joined
/// with `?` (or `&` if `base` already has a query), the rest with `&`.
/// Keys and values are form-urlencoded.
pub fn build_url(base: &str, params: &HashMap<String, String>) -> Result<String, HrqError> {
    if base.trim().is_empty() {
        return Err(HrqError::EmptyUrl);
    }
    let mut url = Url::parse(base).map_err(|e| HrqError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn no_params_leaves_url_alone() {
        assert_eq!(build_url("http://x/api", &HashMap::new()).unwrap(), "http://x/api");
    }

    #[test]
    fn single_param_uses_question_mark() {
        assert_eq!(
            build_url("http://x/api", &params(&[("q", "1")])).unwrap(),
            "http://x/api?q=1"
        );
    }

    #[test]
    fn existing_query_is_extended() {
        assert_eq!(
            build_url("http://x/api?a=b", &params(&[("q", "1")])).unwrap(),
            "http://x/api?a=b&q=1"
        );
    }

    #[test]
    fn each_pair_appears_once() {
        let url = build_url("http://x/api", &params(&[("a", "1"), ("b", "2"), ("c", "3")])).unwrap();
        let (_, query) = url.split_once('?').unwrap();
        let mut pairs: Vec<&str> = query.split('&').collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec!["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn values_are_encoded() {
        assert_eq!(
            build_url("http://x/", &params(&[("name", "a b&c")])).unwrap(),
            "http://x/?name=a+b%26c"
        );
    }

    #[test]
    fn empty_and_invalid_urls_rejected() {
        assert_eq!(build_url("", &HashMap::new()), Err(HrqError::EmptyUrl));
        assert!(matches!(
            build_url("not a url", &HashMap::new()),
            Err(HrqError::InvalidUrl { .. })
        ));
    }
}
