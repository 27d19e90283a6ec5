//! HMAC-SHA256 helpers shared by payment verification and session tokens.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, data: &[u8]) -> HmacSha256 {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .expect("HMAC can take key of any size");
  mac.update(data);
  mac
}

pub fn sign_hex(secret: &str, data: &[u8]) -> String {
  hex::encode(mac(secret, data).finalize().into_bytes())
}

/// Constant-time check of a hex signature. Anything that is not valid hex
/// is a mismatch.
pub fn verify_hex(secret: &str, data: &[u8], signature: &str) -> bool {
  let Ok(expected) = hex::decode(signature.trim()) else {
    return false;
  };
  mac(secret, data).verify_slice(&expected).is_ok()
}
