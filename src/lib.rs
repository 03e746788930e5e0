//! Symmetric API request signing.
//!
//! A client and a server that share a secret key both compute
//!
//! ```text
//! UPPERMD5(k1=enc(v1)&k2=enc(v2)&...&UPPERMD5(body)&secret=UPPERMD5(secret_key))
//! ```
//!
//! over the request's parameters plus `ak` (access key) and `accessTs` (unix
//! seconds), with keys sorted byte-wise. [`SignatureEngine::is_expired`] checks
//! that `accessTs` is inside a liveness window.
//!
//! ```
//! use apisign::{Extraction, SignatureEngine, SigningContext};
//!
//! let engine = SignatureEngine::new("AK1", "SK1", "1700000000");
//! let ctx = SigningContext::new(Extraction::Query).param("b", "2").param("a", "1");
//! let sig = engine.sign(&ctx);
//! assert_eq!(sig, "717064BB1D5CC6747330F9D09FC7EE32");
//! assert!(engine.verify(&ctx, &sig));
//! ```

#[cfg(feature = "http")]
mod body;
mod canonical;
mod configs;
mod consts;
mod context;
mod sign;

#[cfg(feature = "http")]
pub use body::buffer_body;
pub use canonical::{build_string_to_sign, query_escape, query_unescape, upper_md5};
pub use configs::Configuration;
pub use context::{Extraction, SigningContext};
pub use sign::SignatureEngine;
