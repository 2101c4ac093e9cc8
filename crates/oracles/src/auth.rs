use hmac::{Hmac, Mac};
use sha2::Sha256;

// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

/// Creates an HMAC-SHA256 signature over a request payload.
///
/// The payload is the full query string (timestamp included), followed by the raw
/// request body for requests that carry one.
///
/// # Returns
///
/// A lowercase hexadecimal string representation of the signature.
pub fn sign_request(secret: &str, payload: &str) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");

    mac.update(payload.as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_hmac_sha256_vector() {
        let signature = sign_request("key", "The quick brown fox jumps over the lazy dog");
        assert_eq!(
            signature,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn signature_depends_on_payload() {
        assert_ne!(
            sign_request("secret", "timestamp=1"),
            sign_request("secret", "timestamp=2")
        );
    }
}
