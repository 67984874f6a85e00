//! Hardware address normalization
//!
//! Addresses arrive in many shapes (`aa:bb:cc:dd:ee:ff`, `AA-BB-...`,
//! `0xaabbccddeeff`). Everything is compared in one canonical form:
//! ASCII alphanumerics only, a leading `0x` collapsed to `0`, uppercased.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of characters in a canonical hardware address
pub const ADDRESS_LEN: usize = 12;

/// Canonical device address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Canonicalize a raw address string. Never fails; the result may still be invalid.
    pub fn normalize(raw: &str) -> Self {
        let stripped: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        let collapsed = match stripped.strip_prefix("0x") {
            Some(rest) => format!("0{}", rest),
            None => stripped,
        };
        Self(collapsed.to_ascii_uppercase())
    }

    /// Normalize and reject addresses that fail [`is_valid_address`]
    pub fn parse(raw: &str) -> Result<Self> {
        let address = Self::normalize(raw);
        if address.is_valid() {
            Ok(address)
        } else {
            Err(Error::InvalidAddress(raw.to_string()))
        }
    }

    /// Whether the canonical form looks like a hardware address
    pub fn is_valid(&self) -> bool {
        is_valid_address(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check that a string contains a run of 12 hex characters.
///
/// `X` is accepted as a filler character, and the match is not anchored,
/// so longer identifiers that embed a hardware address also pass.
pub fn is_valid_address(candidate: &str) -> bool {
    candidate
        .as_bytes()
        .windows(ADDRESS_LEN)
        .any(|run| run.iter().all(|b| is_address_char(*b)))
}

fn is_address_char(b: u8) -> bool {
    b.is_ascii_hexdigit() || b == b'X' || b == b'x'
}

/// Normalize a list of raw addresses, keeping those accepted by `keep`
pub fn normalize_all<I, S>(raws: I, keep: Option<&dyn Fn(&Address) -> bool>) -> Vec<Address>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raws.into_iter()
        .map(|raw| Address::normalize(raw.as_ref()))
        .filter(|address| keep.map_or(true, |keep| keep(address)))
        .collect()
}

/// Parse a comma-separated caller address header.
///
/// Whitespace is ignored, invalid entries are dropped, and at least one
/// valid address is required.
pub fn parse_address_list(header: &str) -> Result<Vec<Address>> {
    let compact: String = header.chars().filter(|c| *c != ' ').collect();
    if compact.is_empty() {
        return Err(Error::MissingField("mac_address"));
    }

    let valid = normalize_all(compact.split(','), Some(&|a: &Address| a.is_valid()));
    if valid.is_empty() {
        return Err(Error::InvalidAddress(header.to_string()));
    }
    Ok(valid)
}
