use std::io::Cursor;

use anyhow::Result;
use http::Request;
use time::OffsetDateTime;

use apisign::{buffer_body, Configuration, SignatureEngine};

fn main() -> Result<()> {
  let conf = Configuration::auto()?;
  let access_ts = OffsetDateTime::now_utc().unix_timestamp().to_string();
  let engine = SignatureEngine::from_configuration(&conf, access_ts.clone());

  let req = Request::post(format!(
    "http://localhost/api/orders?ak={}&accessTs={}",
    conf.access_key, access_ts
  ))
  .header("content-type", "application/json")
  .body(Cursor::new(br#"{"item":"book","qty":1}"#.to_vec()))?;
  let req = buffer_body(req);

  let sig = engine.sign_request(&req);
  println!("sign = {}", sig);
  println!("verified = {}", engine.verify_request(&req, &sig));
  println!("expired = {}", engine.is_expired(&access_ts));
  Ok(())
}
