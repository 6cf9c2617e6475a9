use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Which used-set an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    SerialNumber,
    MacAddress,
}

impl IdentifierKind {
    /// Key used for this namespace in snapshots and fixture headers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SerialNumber => "deviceSerialNumber",
            Self::MacAddress => "mac",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialNumber => write!(f, "serial number"),
            Self::MacAddress => write!(f, "MAC address"),
        }
    }
}

/// Manufacturer code leading every serial number, stored uppercased
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BrandCode(String);

impl BrandCode {
    pub const MAX_LEN: usize = 6;
    pub const DEFAULT: &'static str = "DEVGEN";

    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty()
            || code.len() > Self::MAX_LEN
            || !code.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(Error::InvalidBrandCode(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BrandCode {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for BrandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BrandCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for BrandCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl From<BrandCode> for String {
    fn from(code: BrandCode) -> Self {
        code.0
    }
}

/// Vendor prefix forming the first three octets of generated MACs.
///
/// Any three octets are accepted. The default sets the locally
/// administered bit so generated addresses never collide with real
/// IEEE-assigned hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OuiPrefix([u8; 3]);

impl OuiPrefix {
    pub const DEFAULT: [u8; 3] = [0x02, 0x00, 0x00];

    pub fn from_octets(octets: [u8; 3]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 3] {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidOuiPrefix(s.to_string());
        let mut octets = [0u8; 3];
        let mut groups = s.trim().split(':');

        for octet in octets.iter_mut() {
            let group = groups.next().ok_or_else(invalid)?;
            if group.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }

        if groups.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

impl Default for OuiPrefix {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for OuiPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:02X}:{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl std::str::FromStr for OuiPrefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OuiPrefix {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<OuiPrefix> for String {
    fn from(prefix: OuiPrefix) -> Self {
        prefix.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerialNumber(pub String);

impl SerialNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SerialNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(pub String);

impl MacAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MacAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One synthetic device handed to the fixture writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "deviceSerialNumber")]
    pub serial_number: SerialNumber,
    #[serde(rename = "mac")]
    pub mac_address: MacAddress,
}
