//! Canonical string construction and digesting.
//!
//! ```text
//! k1=enc(v1)&k2=enc(v2)&...&UPPERMD5(body)&secret=UPPERMD5(secret_key)
//! ```
//!
//! Keys are sorted byte-wise, values are query-escaped, and the body segment
//! is left out entirely when there is nothing to digest.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use percent_encoding::{percent_decode, percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::consts::SECRET;

/// Everything except `A-Z a-z 0-9 - _ . ~` gets percent-encoded.
const QUERY_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'~');

/// Uppercase hex MD5 of `data`.
///
/// ```
/// assert_eq!(apisign::upper_md5(b"hello"), "5D41402ABC4B2A76B9719D911017C592");
/// ```
#[must_use]
pub fn upper_md5(data: &[u8]) -> String {
  hex::encode_upper(Md5::digest(data))
}

/// Escape a value for a query string: space becomes `+`, other reserved bytes
/// become `%XX`. Works on raw bytes, so non UTF-8 values survive.
#[must_use]
pub fn query_escape(value: &[u8]) -> String {
  // a literal "%20" in the input is escaped to "%2520", so this only hits spaces
  percent_encode(value, QUERY_ESCAPE_SET)
    .to_string()
    .replace("%20", "+")
}

/// Decode one query-string component: `+` is a space and every `%` must be
/// followed by two hex digits. Returns `None` for a malformed escape.
#[must_use]
pub fn query_unescape(raw: &[u8]) -> Option<Vec<u8>> {
  let well_formed = raw
    .iter()
    .enumerate()
    .filter(|(_, b)| **b == b'%')
    .all(|(i, _)| {
      raw
        .get(i + 1..i + 3)
        .map_or(false, |h| h.iter().all(u8::is_ascii_hexdigit))
    });
  if !well_formed {
    return None;
  }

  let spaced: Vec<u8> = raw
    .iter()
    .map(|&b| if b == b'+' { b' ' } else { b })
    .collect();
  Some(percent_decode(&spaced).collect())
}

/// Build the bytes that get digested into the signature.
///
/// `params` must already contain `ak` and `accessTs`; empty values are
/// filtered before this point. Keys go in as they are, values are escaped.
#[must_use]
pub fn build_string_to_sign(
  params: &BTreeMap<Vec<u8>, Vec<u8>>,
  body_digest: Option<&str>,
  secret_key: &str,
) -> Vec<u8> {
  let mut s = Vec::new();

  for (k, v) in params {
    s.extend_from_slice(k);
    s.push(b'=');
    s.extend_from_slice(query_escape(v).as_bytes());
    s.push(b'&');
  }

  if let Some(digest) = body_digest {
    s.extend_from_slice(digest.as_bytes());
    s.push(b'&');
  }

  s.extend_from_slice(SECRET.as_bytes());
  s.push(b'=');
  s.extend_from_slice(upper_md5(secret_key.as_bytes()).as_bytes());
  s
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_upper_md5() {
    assert_eq!(upper_md5(b""), "D41D8CD98F00B204E9800998ECF8427E");
    assert_eq!(upper_md5(b"SK1"), "91B715457ACF851EB9BD8799ECF75882");
  }

  #[test]
  fn test_query_escape() {
    assert_eq!(query_escape(b"hello world!~"), "hello+world%21~");
    assert_eq!(query_escape(b"a/b?c=d&e"), "a%2Fb%3Fc%3Dd%26e");
    assert_eq!(query_escape(b"100%20"), "100%2520");
    assert_eq!(query_escape("中".as_bytes()), "%E4%B8%AD");
    assert_eq!(query_escape(b"A-Z_a.z~09"), "A-Z_a.z~09");
    assert_eq!(query_escape(&[0xff, b'a']), "%FFa");
  }

  #[test]
  fn test_query_unescape() {
    assert_eq!(query_unescape(b"x+y%21"), Some(b"x y!".to_vec()));
    assert_eq!(query_unescape(b"%2B%2b"), Some(b"++".to_vec()));
    assert_eq!(query_unescape(b"%FF"), Some(vec![0xff]));
    assert_eq!(query_unescape(b""), Some(Vec::new()));
    assert_eq!(query_unescape(b"%zz"), None);
    assert_eq!(query_unescape(b"50%"), None);
    assert_eq!(query_unescape(b"%4"), None);
  }

  #[test]
  fn test_build_string_to_sign() {
    let mut params = BTreeMap::new();
    params.insert(b"b".to_vec(), b"2".to_vec());
    params.insert(b"ak".to_vec(), b"AK1".to_vec());
    params.insert(b"accessTs".to_vec(), b"1700000000".to_vec());
    params.insert(b"a".to_vec(), b"1".to_vec());

    assert_eq!(
      build_string_to_sign(&params, None, "SK1"),
      b"a=1&accessTs=1700000000&ak=AK1&b=2&secret=91B715457ACF851EB9BD8799ECF75882".to_vec()
    );
    assert_eq!(
      build_string_to_sign(&params, Some("AC3EF48CAA08FA3ED5E025DA69EDC645"), "SK1"),
      b"a=1&accessTs=1700000000&ak=AK1&b=2&AC3EF48CAA08FA3ED5E025DA69EDC645&secret=91B715457ACF851EB9BD8799ECF75882".to_vec()
    );
  }
}
