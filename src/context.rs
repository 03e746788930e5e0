use std::collections::BTreeMap;

#[cfg(feature = "http")]
use http::{header::CONTENT_TYPE, Request};

use crate::canonical::query_unescape;
use crate::consts::FORM_CONTENT_TYPE;

/// Where a request's signed parameters come from, decided by its method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
  /// GET: the URL query string.
  Query,
  /// POST: the URL-encoded form body merged with the query string.
  Form,
  /// Any other verb signs no request parameters.
  Unsupported,
}

impl Extraction {
  pub fn from_method(method: &str) -> Self {
    match method {
      "GET" => Extraction::Query,
      "POST" => Extraction::Form,
      _ => Extraction::Unsupported,
    }
  }
}

/// The parts of a request that go into its signature.
///
/// Names and values are raw bytes, as decoded from the request. Only the first
/// value of a repeated parameter is kept. Empty names and values are kept here
/// and dropped when the canonical string is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext<'a> {
  extraction: Extraction,
  params: BTreeMap<Vec<u8>, Vec<u8>>,
  body: Option<&'a [u8]>,
}

impl<'a> SigningContext<'a> {
  pub fn new(extraction: Extraction) -> Self {
    Self {
      extraction,
      params: BTreeMap::new(),
      body: None,
    }
  }

  /// Add a parameter. A name that is already present keeps its first value.
  pub fn param(mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
    self.params.entry(name.into()).or_insert_with(|| value.into());
    self
  }

  /// Attach the raw body to digest.
  pub fn body(mut self, body: &'a [u8]) -> Self {
    self.body = Some(body);
    self
  }

  /// Build a context from the raw pieces of a request.
  ///
  /// GET takes parameters from `query`. POST with a form content type takes
  /// parameters from the body first and then from `query`; the form body is
  /// then spent on parameters and is not digested. POST with any other
  /// content type takes parameters from `query` and digests the body.
  pub fn from_parts(
    method: &str,
    query: Option<&str>,
    content_type: Option<&str>,
    body: &'a [u8],
  ) -> Self {
    let extraction = Extraction::from_method(method);
    let mut ctx = Self::new(extraction);

    match extraction {
      Extraction::Query => {
        ctx.extend_urlencoded(query.unwrap_or("").as_bytes());
      }
      Extraction::Form => {
        if is_form(content_type) {
          ctx.extend_urlencoded(body);
        } else {
          ctx.body = Some(body);
        }
        ctx.extend_urlencoded(query.unwrap_or("").as_bytes());
      }
      Extraction::Unsupported => {}
    }

    ctx
  }

  /// Build a context from an `http::Request` whose body is already in memory.
  ///
  /// Borrowing the body leaves it untouched for later handlers; for
  /// streaming bodies see [`crate::buffer_body`].
  #[cfg(feature = "http")]
  pub fn from_request<T>(req: &'a Request<T>) -> Self
  where
    T: AsRef<[u8]>,
  {
    let content_type = req
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok());

    Self::from_parts(req.method().as_str(), req.uri().query(), content_type, req.body().as_ref())
  }

  pub fn extraction(&self) -> Extraction {
    self.extraction
  }

  pub fn params(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
    &self.params
  }

  /// The body to digest, if any. Only POST bodies are digested and an empty
  /// body counts as absent.
  pub fn digestible_body(&self) -> Option<&'a [u8]> {
    match (self.extraction, self.body) {
      (Extraction::Form, Some(b)) if !b.is_empty() => Some(b),
      _ => None,
    }
  }

  /// Pairs with a `;` in them or a malformed escape are skipped whole.
  fn extend_urlencoded(&mut self, input: &[u8]) {
    for pair in input.split(|&b| b == b'&') {
      if pair.is_empty() || pair.contains(&b';') {
        continue;
      }

      let (k, v) = match pair.iter().position(|&b| b == b'=') {
        Some(i) => (&pair[..i], &pair[i + 1..]),
        None => (pair, &pair[pair.len()..]),
      };
      let (k, v) = match (query_unescape(k), query_unescape(v)) {
        (Some(k), Some(v)) => (k, v),
        _ => continue,
      };

      self.params.entry(k).or_insert(v);
    }
  }
}

#[cfg(feature = "http")]
fn is_form(content_type: Option<&str>) -> bool {
  content_type
    .and_then(|ct| ct.parse::<mime::Mime>().ok())
    .map_or(false, |m| m.essence_str() == FORM_CONTENT_TYPE)
}

#[cfg(not(feature = "http"))]
fn is_form(content_type: Option<&str>) -> bool {
  content_type
    .and_then(|ct| ct.split(';').next())
    .map_or(false, |essence| essence.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
