//! RFC 6238 time-based one-time passwords (SHA-1, 6 digits, 30 s period).

use data_encoding::{Encoding, BASE32};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::{Result, ZvaultError};

pub const PERIOD_SECS: i64 = 30;
const DIGITS: usize = 6;
const MODULUS: u32 = 1_000_000;

type HmacSha1 = Hmac<Sha1>;

/// Generated code and the seconds left in its window (1..=30).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TotpCode {
    pub code: String,
    pub remaining: u32,
}

pub fn generate(secret: &str, unix_time: i64) -> Result<TotpCode> {
    let key = decode_secret(secret)?;
    let counter = unix_time.div_euclid(PERIOD_SECS) as u64;
    let remaining = (PERIOD_SECS - unix_time.rem_euclid(PERIOD_SECS)) as u32;
    Ok(TotpCode {
        code: hotp(&key, counter)?,
        remaining,
    })
}

fn lenient_base32() -> Result<Encoding> {
    let mut spec = BASE32.specification();
    spec.check_trailing_bits = false;
    spec.encoding()
        .map_err(|e| ZvaultError::InvalidTotpSecret(e.to_string()))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let mut normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let rem = normalized.len() % 8;
    if rem != 0 {
        normalized.push_str(&"=".repeat(8 - rem));
    }
    lenient_base32()?
        .decode(normalized.as_bytes())
        .map_err(|e| ZvaultError::InvalidTotpSecret(e.to_string()))
}

/// RFC 4226 HOTP with dynamic truncation.
fn hotp(key: &[u8], counter: u64) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| ZvaultError::InvalidTotpSecret(e.to_string()))?;
    mac.update(&counter.to_be_bytes());
    let sum = mac.finalize().into_bytes();

    let offset = (sum[sum.len() - 1] & 0x0f) as usize;
    let truncated = u32::from_be_bytes([
        sum[offset],
        sum[offset + 1],
        sum[offset + 2],
        sum[offset + 3],
    ]) & 0x7fff_ffff;

    Ok(format!("{:0width$}", truncated % MODULUS, width = DIGITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_secret_at_epoch() {
        let code = generate("JBSWY3DPEHPK3PXP", 0).unwrap();
        assert_eq!(code.code, "282760");
        assert_eq!(code.remaining, 30);
    }

    #[test]
    fn rfc6238_sha1_vector() {
        let secret = BASE32.encode(b"12345678901234567890");
        let code = generate(&secret, 59).unwrap();
        assert_eq!(code.code, "287082");
        assert_eq!(code.remaining, 1);
    }

    #[test]
    fn normalizes_spaces_and_case() {
        let spaced = generate("jbsw y3dp ehpk 3pxp", 0).unwrap();
        assert_eq!(spaced.code, "282760");
    }

    #[test]
    fn unpadded_secret_is_padded() {
        // 10 chars decodes only once padded to 16
        assert!(generate("JBSWY3DPEH", 0).is_ok());
    }

    #[test]
    fn remaining_counts_down_within_window() {
        assert_eq!(generate("JBSWY3DPEHPK3PXP", 31).unwrap().remaining, 29);
        assert_eq!(generate("JBSWY3DPEHPK3PXP", 29).unwrap().remaining, 1);
    }

    #[test]
    fn same_window_same_code() {
        let a = generate("JBSWY3DPEHPK3PXP", 30).unwrap();
        let b = generate("JBSWY3DPEHPK3PXP", 59).unwrap();
        assert_eq!(a.code, b.code);
    }

    #[test]
    fn rejects_non_base32() {
        let err = generate("not*base32!", 0).unwrap_err();
        assert!(matches!(err, ZvaultError::InvalidTotpSecret(_)));
    }
}
