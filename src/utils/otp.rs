use rand::Rng;
use sha2::{Digest, Sha256};

pub const OTP_LENGTH: u32 = 4;

/// Generate a uniformly random numeric code of the given length, with no
/// leading zero (a 4-digit code lies in [1000, 9999]).
pub fn generate_numeric_otp(length: u32) -> String {
    let min = 10u32.pow(length - 1);
    let max = 10u32.pow(length) - 1;
    rand::thread_rng().gen_range(min..=max).to_string()
}

/// One-way digest used for both OTP codes and reset tokens. Only the digest
/// is ever persisted.
pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_has_requested_length_and_is_numeric() {
        for _ in 0..100 {
            let code = generate_numeric_otp(OTP_LENGTH);
            assert_eq!(code.len(), 4);
            let value: u32 = code.parse().unwrap();
            assert!((1000..=9999).contains(&value));
        }
    }

    #[test]
    fn digest_is_deterministic_and_hex_encoded() {
        let a = sha256_hex("1234");
        let b = sha256_hex("1234");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, sha256_hex("1235"));
    }
}
