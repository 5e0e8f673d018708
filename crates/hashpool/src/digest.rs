//! Fixed-output digest functions rendered as lowercase hex.
//!
//! Every supported algorithm produces 256 bits, so a rendered digest is always
//! [`DIGEST_HEX_LEN`] characters long. Digests are pure functions of their
//! input: no salt, no randomness.

use crate::error::UnknownDigestAlg;
use core::{fmt, str::FromStr};
use sha2::Sha256;
use sha3::{Digest as _, Sha3_256};

/// Length of a rendered digest (two hex characters per output byte).
pub const DIGEST_HEX_LEN: usize = 64;

/// Digest algorithms a [`HashPool`](crate::HashPool) can be configured with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DigestAlg {
    /// SHA3-256 (Keccak). The default.
    #[default]
    Sha3_256,
    /// SHA-256 (SHA-2 family).
    Sha256,
}

impl DigestAlg {
    /// Hashes the UTF-8 bytes of `value` and renders the result as lowercase
    /// hex.
    #[inline]
    pub fn digest_hex(&self, value: &str) -> String {
        match self {
            Self::Sha3_256 => hex::encode(Sha3_256::digest(value.as_bytes())),
            Self::Sha256 => hex::encode(Sha256::digest(value.as_bytes())),
        }
    }

    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha3_256 => "sha3-256",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for DigestAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlg {
    type Err = UnknownDigestAlg;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha3-256" | "sha3_256" | "sha3" => Ok(Self::Sha3_256),
            "sha256" | "sha-256" | "sha2-256" => Ok(Self::Sha256),
            _ => Err(UnknownDigestAlg(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha3_256_known_vectors() {
        assert_eq!(
            DigestAlg::Sha3_256.digest_hex(""),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
        assert_eq!(
            DigestAlg::Sha3_256.digest_hex("abc"),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn sha256_known_vectors() {
        assert_eq!(
            DigestAlg::Sha256.digest_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            DigestAlg::Sha256.digest_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_is_fixed_length_lowercase_hex() {
        for alg in [DigestAlg::Sha3_256, DigestAlg::Sha256] {
            let long = "x".repeat(10_000);
            for input in ["", "a", "hello", "世界", long.as_str()] {
                let digest = alg.digest_hex(input);
                assert_eq!(digest.len(), DIGEST_HEX_LEN);
                assert!(
                    digest
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)),
                    "{alg}: {digest}"
                );
            }
        }
    }

    #[test]
    fn distinct_inputs_distinct_digests() {
        let alg = DigestAlg::default();
        let a = alg.digest_hex("a");
        let b = alg.digest_hex("b");
        let world = alg.digest_hex("world");
        assert_ne!(a, b);
        assert_ne!(a, world);
        assert_ne!(b, world);
        assert_eq!(a, alg.digest_hex("a"));
    }

    #[test]
    fn algorithms_disagree() {
        assert_ne!(
            DigestAlg::Sha3_256.digest_hex("abc"),
            DigestAlg::Sha256.digest_hex("abc")
        );
    }

    #[test]
    fn parse_names() {
        assert_eq!("sha3-256".parse::<DigestAlg>(), Ok(DigestAlg::Sha3_256));
        assert_eq!("SHA3_256".parse::<DigestAlg>(), Ok(DigestAlg::Sha3_256));
        assert_eq!(" sha256 ".parse::<DigestAlg>(), Ok(DigestAlg::Sha256));
        assert_eq!(
            "md5".parse::<DigestAlg>(),
            Err(UnknownDigestAlg("md5".to_string()))
        );
        for alg in [DigestAlg::Sha3_256, DigestAlg::Sha256] {
            assert_eq!(alg.to_string().parse::<DigestAlg>(), Ok(alg));
        }
    }
}
