//! Replayable request bodies.
//!
//! A streaming body can only be read once. [`buffer_body`] drains it into a
//! [`Bytes`] buffer and puts that buffer back on the request, so the body can
//! be digested for signing and still be read by whoever handles the request
//! next.

use std::io::Read;

use bytes::Bytes;
use http::Request;
use tracing::warn;

/// Read the whole body of `req` and reinstall it as an in-memory buffer.
///
/// A body that fails to read is replaced by whatever was read before the
/// error, which at worst is empty. The signature then simply won't match.
pub fn buffer_body<R>(req: Request<R>) -> Request<Bytes>
where
  R: Read,
{
  let (parts, mut body) = req.into_parts();

  let mut buf = Vec::new();
  if let Err(e) = body.read_to_end(&mut buf) {
    warn!(error = %e, read = buf.len(), "failed to read request body");
  }

  Request::from_parts(parts, Bytes::from(buf))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::{self, Cursor};

  use bytes::Buf;
  use http::header::CONTENT_TYPE;

  use crate::{SignatureEngine, SigningContext};

  struct Broken;

  impl Read for Broken {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::Other, "connection reset"))
    }
  }

  #[test]
  fn test_buffer_body_replays() {
    let req = Request::post("http://example.com/api?b=2&a=1")
      .header(CONTENT_TYPE, "application/json")
      .body(Cursor::new(b"{\"x\":1}".to_vec()))
      .unwrap();
    let req = buffer_body(req);

    let engine = SignatureEngine::new("AK1", "SK1", "1700000000");
    let sig = engine.sign(&SigningContext::from_request(&req));
    assert_eq!(sig, "47F850286E09FD07515AEB5A31557FF3");

    // a later handler can still read the full body, more than once
    let mut first = String::new();
    req.body().clone().reader().read_to_string(&mut first).unwrap();
    assert_eq!(first, "{\"x\":1}");
    let mut second = Vec::new();
    req.body().clone().reader().read_to_end(&mut second).unwrap();
    assert_eq!(second, b"{\"x\":1}".to_vec());

    assert!(engine.verify_request(&req, &sig));
  }

  #[test]
  fn test_buffer_body_unreadable_is_empty() {
    let req = Request::post("http://example.com/api?a=1").body(Broken).unwrap();
    let req = buffer_body(req);
    assert!(req.body().is_empty());

    let engine = SignatureEngine::new("AK1", "SK1", "1700000000");
    let ctx = SigningContext::from_request(&req);
    assert_eq!(ctx.digestible_body(), None);
    assert!(!engine.sign(&ctx).is_empty());
  }
}
