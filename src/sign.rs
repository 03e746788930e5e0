use std::collections::BTreeMap;

#[cfg(feature = "http")]
use http::Request;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::canonical::{build_string_to_sign, upper_md5};
use crate::consts::{ACCESS_TS, AK, DEFAULT_LIVE_MINUTES, STALE_FALLBACK_SECS};
use crate::{Configuration, SigningContext};

/// Signs and verifies requests for one credential pair and one request
/// timestamp.
#[derive(Debug, Clone)]
pub struct SignatureEngine {
  live_minutes: i64,
  access_key: String,
  secret_key: String,
  access_ts: String,
}

impl SignatureEngine {
  pub fn new(
    access_key: impl Into<String>,
    secret_key: impl Into<String>,
    access_ts: impl Into<String>,
  ) -> Self {
    Self {
      live_minutes: DEFAULT_LIVE_MINUTES,
      access_key: access_key.into(),
      secret_key: secret_key.into(),
      access_ts: access_ts.into(),
    }
  }

  pub fn from_configuration(conf: &Configuration, access_ts: impl Into<String>) -> Self {
    Self::new(conf.access_key.clone(), conf.secret_key.clone(), access_ts)
      .with_live_minutes(conf.live_minutes)
  }

  /// Set the liveness window used by [`SignatureEngine::is_expired`].
  pub fn with_live_minutes(mut self, live_minutes: i64) -> Self {
    self.live_minutes = live_minutes;
    self
  }

  pub fn live_minutes(&self) -> i64 {
    self.live_minutes
  }

  /// The canonical string that [`SignatureEngine::sign`] digests. Request
  /// parameter names are raw bytes, so this is not always UTF-8.
  pub fn string_to_sign(&self, ctx: &SigningContext<'_>) -> Vec<u8> {
    let mut params = BTreeMap::new();
    params.insert(AK.as_bytes().to_vec(), self.access_key.as_bytes().to_vec());
    params.insert(ACCESS_TS.as_bytes().to_vec(), self.access_ts.as_bytes().to_vec());

    // request parameters win over ak/accessTs on a name clash
    for (k, v) in ctx.params() {
      if k.is_empty() || v.is_empty() {
        continue;
      }
      params.insert(k.clone(), v.clone());
    }

    let body_digest = ctx.digestible_body().map(upper_md5);

    build_string_to_sign(&params, body_digest.as_deref(), &self.secret_key)
  }

  /// 32 character uppercase hex signature of `ctx`.
  pub fn sign(&self, ctx: &SigningContext<'_>) -> String {
    let string_to_sign = self.string_to_sign(ctx);
    // the canonical string carries the secret digest and stays out of logs
    debug!(params = ctx.params().len(), "built string to sign");
    upper_md5(&string_to_sign)
  }

  pub fn verify(&self, ctx: &SigningContext<'_>, candidate: &str) -> bool {
    let expected = self.sign(ctx);
    let ok: bool = expected.as_bytes().ct_eq(candidate.as_bytes()).into();

    if ok {
      debug!(access_key = %self.access_key, "signature verified");
    } else {
      debug!(
        access_key = %self.access_key,
        provided = %candidate,
        "signature mismatch"
      );
    }

    ok
  }

  #[cfg(feature = "http")]
  pub fn sign_request<T>(&self, req: &Request<T>) -> String
  where
    T: AsRef<[u8]>,
  {
    self.sign(&SigningContext::from_request(req))
  }

  #[cfg(feature = "http")]
  pub fn verify_request<T>(&self, req: &Request<T>, candidate: &str) -> bool
  where
    T: AsRef<[u8]>,
  {
    self.verify(&SigningContext::from_request(req), candidate)
  }

  /// Whether `access_ts` is older than the liveness window, measured against
  /// `now` (unix seconds).
  ///
  /// Elapsed minutes are truncated toward zero, so a timestamp exactly at the
  /// window edge is still live. Timestamps that do not parse are treated as
  /// seven days old.
  pub fn is_expired_at(&self, access_ts: &str, now: i64) -> bool {
    let ts = access_ts.parse::<i64>().unwrap_or_else(|_| {
      warn!(access_ts = %access_ts, "unparseable timestamp, treating as stale");
      now.saturating_sub(STALE_FALLBACK_SECS)
    });

    let elapsed_minutes = now.saturating_sub(ts) / 60;
    elapsed_minutes > self.live_minutes
  }

  #[cfg(feature = "time")]
  pub fn is_expired(&self, access_ts: &str) -> bool {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    self.is_expired_at(access_ts, now)
  }
}
