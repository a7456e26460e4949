//! Cryptographically random tokens for demo flows.

use rand::rngs::OsRng;
use rand::RngCore;

/// Random 128-bit value rendered as 32 lowercase hex characters.
///
/// For demo flows only; the value authenticates nothing.
pub fn generate_demo_token() -> String {
    let mut buf = [0u8; 16];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
