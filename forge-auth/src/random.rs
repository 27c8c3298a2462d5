//! Random token generation for state values and session tokens.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, ErrorKind, SessionErrorKind};

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

// Largest multiple of the alphabet size that fits in a byte; bytes at or above it
// are rejected to keep the distribution uniform.
const REJECTION_BOUND: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Generate an alphanumeric string of `len` characters from the OS random source.
///
/// Fails only if the operating system cannot provide randomness.
pub fn random_string(len: usize) -> Result<String, Error> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while out.len() < len {
        OsRng.try_fill_bytes(&mut buf).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Session(SessionErrorKind::TokenGeneration),
        })?;

        for byte in buf.iter().copied().filter(|b| *b < REJECTION_BOUND) {
            if out.len() == len {
                break;
            }
            out.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_length() {
        assert_eq!(random_string(32).unwrap().len(), 32);
        assert_eq!(random_string(0).unwrap().len(), 0);
        assert_eq!(random_string(100).unwrap().len(), 100);
    }

    #[test]
    fn test_random_string_is_alphanumeric() {
        let value = random_string(256).unwrap();
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_strings_differ() {
        assert_ne!(random_string(32).unwrap(), random_string(32).unwrap());
    }
}
