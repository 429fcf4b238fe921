//! AWS Signature Version 4 request signing.
//!
//! Only what the JSON protocol clients in this crate need: header-based
//! signing of a fully buffered payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::aws::AwsCredentials;
use crate::error::TaskError;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Inputs to a signature besides the request itself.
pub struct SigningParams<'a> {
  pub credentials: &'a AwsCredentials,
  pub region: &'a str,
  pub service: &'a str,
  pub time: DateTime<Utc>,
}

/// Sign a request in place.
///
/// `headers` must use lowercase names. `host`, `x-amz-date` and, for
/// temporary credentials, `x-amz-security-token` are added before signing.
/// `authorization` is added last.
pub fn sign(
  params: &SigningParams<'_>,
  method: &str,
  url: &Url,
  headers: &mut BTreeMap<String, String>,
  payload: &[u8],
) -> Result<(), TaskError> {
  let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
  let date = params.time.format("%Y%m%d").to_string();

  headers.insert("host".to_string(), host_header(url));
  headers.insert("x-amz-date".to_string(), amz_date.clone());
  if let Some(token) = &params.credentials.session_token {
    headers.insert("x-amz-security-token".to_string(), token.clone());
  }

  let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
  let canonical_headers: String = headers
    .iter()
    .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
    .collect();

  let canonical_request = format!(
    "{}\n{}\n{}\n{}\n{}\n{}",
    method,
    canonical_uri(url),
    canonical_query(url),
    canonical_headers,
    signed_headers,
    sha256_hex(payload)
  );

  let scope = format!("{}/{}/{}/aws4_request", date, params.region, params.service);
  let string_to_sign = format!(
    "{}\n{}\n{}\n{}",
    ALGORITHM,
    amz_date,
    scope,
    sha256_hex(canonical_request.as_bytes())
  );

  let key = signing_key(
    &params.credentials.secret_access_key,
    &date,
    params.region,
    params.service,
  )?;
  let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

  headers.insert(
    "authorization".to_string(),
    format!(
      "{} Credential={}/{}, SignedHeaders={}, Signature={}",
      ALGORITHM, params.credentials.access_key, scope, signed_headers, signature
    ),
  );
  Ok(())
}

/// Derive the signing key for a date, region and service.
pub fn signing_key(
  secret: &str,
  date: &str,
  region: &str,
  service: &str,
) -> Result<Vec<u8>, TaskError> {
  let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
  let k_region = hmac_sha256(&k_date, region.as_bytes())?;
  let k_service = hmac_sha256(&k_region, service.as_bytes())?;
  hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, TaskError> {
  let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
    .map_err(|e| TaskError::Signing(e.to_string()))?;
  mac.update(data);
  Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
  hex::encode(Sha256::digest(data))
}

fn host_header(url: &Url) -> String {
  let host = url.host_str().unwrap_or_default();
  match url.port() {
    Some(port) => format!("{}:{}", host, port),
    None => host.to_string(),
  }
}

fn canonical_uri(url: &Url) -> String {
  match url.path() {
    "" => "/".to_string(),
    path => path.to_string(),
  }
}

fn canonical_query(url: &Url) -> String {
  let mut pairs: Vec<(String, String)> = url
    .query_pairs()
    .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
    .collect();
  pairs.sort();
  pairs
    .iter()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join("&")
}

fn uri_encode(value: &str) -> String {
  let mut encoded = String::with_capacity(value.len());
  for byte in value.bytes() {
    match byte {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
        encoded.push(byte as char)
      }
      _ => encoded.push_str(&format!("%{:02X}", byte)),
    }
  }
  encoded
}
