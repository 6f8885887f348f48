//! # Person Identifier Codec
//!
//! Stored documents are keyed by a fixed-width 12-byte identifier generated by
//! the store at insert time. RPC messages never carry those bytes directly:
//! the canonical external form is the 24 character hexadecimal string.
//!
//! [`PersonId`] is the opaque internal value handed between the handler set
//! and the store adapters. Handlers only ever see wire strings and
//! `PersonId`s; store-native identifier types stay inside each adapter.
//!
//! - [`PersonId::decode`] - wire string to identifier, rejecting anything
//!   that is not exactly [`WIRE_ID_LEN`] hex characters.
//! - [`PersonId::encode`] - identifier to lower-case wire string. Never fails.

use crate::{Error, Result};
use core::{fmt, str::FromStr};

/// Number of bytes in a stored document identifier.
pub const PERSON_ID_SIZE: usize = 12;

/// Number of characters in the wire form of a [`PersonId`].
pub const WIRE_ID_LEN: usize = PERSON_ID_SIZE * 2;

/// Store-generated identifier of a single Person document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonId([u8; PERSON_ID_SIZE]);

impl PersonId {
    /// Wraps raw identifier bytes obtained from the store.
    pub const fn from_bytes(bytes: [u8; PERSON_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw identifier bytes.
    pub const fn to_bytes(self) -> [u8; PERSON_ID_SIZE] {
        self.0
    }

    /// Parses the wire form of an identifier.
    ///
    /// Upper- and lower-case hex digits are both accepted. Any other length or
    /// character set yields [`Error::InvalidIdentifier`].
    pub fn decode(wire: &str) -> Result<Self> {
        if wire.len() != WIRE_ID_LEN {
            return Err(Error::InvalidIdentifier {
                value: wire.to_string(),
            });
        }
        let mut bytes = [0u8; PERSON_ID_SIZE];
        hex::decode_to_slice(wire, &mut bytes).map_err(|_| Error::InvalidIdentifier {
            value: wire.to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// Renders the identifier as 24 lower-case hex characters.
    pub fn encode(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for PersonId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PersonId").field(&self.encode()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRE: &str = "5f1d7a3c9b1e8a0012345678";

    #[test]
    fn decodes_canonical_wire_form() {
        let id = PersonId::decode(WIRE).unwrap();
        assert_eq!(
            id.to_bytes(),
            [0x5f, 0x1d, 0x7a, 0x3c, 0x9b, 0x1e, 0x8a, 0x00, 0x12, 0x34, 0x56, 0x78]
        );
        assert_eq!(id.encode(), WIRE);
        assert_eq!(id.to_string(), WIRE);
    }

    #[test]
    fn upper_case_input_encodes_lower_case() {
        let id: PersonId = WIRE.to_ascii_uppercase().parse().unwrap();
        assert_eq!(id.encode(), WIRE);
    }

    #[test]
    fn rejects_wrong_length() {
        for wire in ["", "1dgghd", "5f1d7a3c9b1e8a001234567", "5f1d7a3c9b1e8a00123456789"] {
            assert_eq!(
                PersonId::decode(wire),
                Err(Error::InvalidIdentifier {
                    value: wire.to_string()
                }),
                "{wire:?} should not decode"
            );
        }
    }

    #[test]
    fn rejects_non_hex_characters() {
        assert!(PersonId::decode("5f1d7a3c9b1e8a001234567z").is_err());
        assert!(PersonId::decode("5f1d7a3c 9b1e8a00123456").is_err());
        // 24 bytes, but not 24 characters
        assert!(PersonId::decode("5f1d7a3c9b1e8a00123456é").is_err());
    }

    #[test]
    fn all_zero_identifier_is_well_formed() {
        let id = PersonId::from_bytes([0; PERSON_ID_SIZE]);
        assert_eq!(id.encode(), "0".repeat(WIRE_ID_LEN));
        assert_eq!(PersonId::decode(&id.encode()).unwrap(), id);
    }
}
