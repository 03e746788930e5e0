use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::env::var;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use crate::consts::DEFAULT_LIVE_MINUTES;

const CRED_KEY: &str = "access_key";
const CRED_SECRET: &str = "secret_key";
const CRED_LIVE: &str = "live_minutes";

const ENV_KEY: &str = "APISIGN_ACCESS_KEY";
const ENV_SECRET: &str = "APISIGN_SECRET_KEY";
const ENV_LIVE: &str = "APISIGN_LIVE_MINUTES";
const ENV_PROFILE: &str = "APISIGN_PROFILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
  pub access_key: String,
  pub secret_key: String,
  pub live_minutes: i64,
}

impl Configuration {
  pub fn from_static(access_key: String, secret_key: String) -> Self {
    Self {
      access_key,
      secret_key,
      live_minutes: DEFAULT_LIVE_MINUTES,
    }
  }

  pub fn live_minutes(mut self, live_minutes: i64) -> Self {
    self.live_minutes = live_minutes;
    self
  }

  /// Precedence:
  ///   env vars (APISIGN_ACCESS_KEY, APISIGN_SECRET_KEY) (APISIGN_LIVE_MINUTES)
  ///   profile (APISIGN_PROFILE)
  ///   default profile
  pub fn auto() -> Result<Self> {
    if let Ok(c) = Self::from_env() {
      Ok(c)
    } else if let Ok(c) = Self::from_profile_env() {
      Ok(c)
    } else if let Ok(c) = Self::from_profile_static("default") {
      Ok(c)
    } else {
      Err(anyhow!("failed to find configuration automatically"))
    }
  }

  pub fn from_env() -> Result<Self> {
    let c = Self {
      access_key: var(ENV_KEY)?,
      secret_key: var(ENV_SECRET)?,
      live_minutes: match var(ENV_LIVE) {
        Ok(v) => parse_live_minutes(&v)?,
        Err(_) => DEFAULT_LIVE_MINUTES,
      },
    };

    Ok(c)
  }

  pub fn from_profile_static(profile: &str) -> Result<Self> {
    Self::from_file(&credentials_path()?, profile)
  }

  pub fn from_profile_env() -> Result<Self> {
    let p = var(ENV_PROFILE)?;
    Self::from_profile_static(&p)
  }

  /// Load `profile` from an INI-style credentials file:
  ///
  /// ```text
  /// [default]
  /// access_key = AK1
  /// secret_key = SK1
  /// live_minutes = 5
  /// ```
  pub fn from_file(path: &Path, profile: &str) -> Result<Self> {
    let raw = read_to_string(path)
      .with_context(|| format!("failed to read credentials file {}", path.display()))?;
    let mut entries = read_profile(&raw, profile)?;

    Ok(Self {
      access_key: entries
        .remove(CRED_KEY)
        .ok_or_else(|| anyhow!("access_key not found for profile {}", profile))?,
      secret_key: entries
        .remove(CRED_SECRET)
        .ok_or_else(|| anyhow!("secret_key not found for profile {}", profile))?,
      live_minutes: match entries.remove(CRED_LIVE) {
        Some(v) => parse_live_minutes(&v)?,
        None => DEFAULT_LIVE_MINUTES,
      },
    })
  }
}

fn parse_live_minutes(raw: &str) -> Result<i64> {
  raw
    .trim()
    .parse()
    .with_context(|| format!("invalid live_minutes: {:?}", raw))
}

fn read_profile(raw: &str, profile: &str) -> Result<HashMap<String, String>> {
  let profile_line = format!("[{}]", profile);
  let mut profile_found = false;
  let mut entries = HashMap::new();

  for line in raw.lines().map(str::trim) {
    if line.starts_with('[') {
      if profile_found {
        // profile header should only appear once
        break;
      }

      if line == profile_line {
        profile_found = true;
      }
      continue;
    }

    if profile_found {
      if let Some((k, v)) = line.split_once('=') {
        entries.insert(k.trim().to_owned(), v.trim().to_owned());
      }
    }
  }

  if !profile_found {
    return Err(anyhow!("profile {} not found in credentials", profile));
  }

  Ok(entries)
}

#[cfg(target_os = "windows")]
fn credentials_path() -> Result<PathBuf> {
  let mut cred = PathBuf::from(var("HOMEPATH")?);
  cred.push(".apisign");
  cred.push("credentials");

  Ok(cred)
}

#[cfg(not(target_os = "windows"))]
fn credentials_path() -> Result<PathBuf> {
  let mut cred = PathBuf::from(var("HOME")?);
  cred.push(".apisign");
  cred.push("credentials");

  Ok(cred)
}
