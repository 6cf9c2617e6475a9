use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

use super::types::{BrandCode, MacAddress, OuiPrefix, SerialNumber};

static SERIAL_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,6}\d{4}\d{6}[0-9A-F]$").expect("valid regex"));

static STANDARD_SERIAL_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{6}\d{4}\d{6}[0-9A-F]$").expect("valid regex"));

static MAC_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9A-F]{2}:){5}[0-9A-F]{2}$").expect("valid regex"));

/// First hex character of the uppercased digest over `brand || year || sequence`
pub fn checksum(brand: &str, year: &str, sequence: &str) -> char {
    let mut hasher = Sha256::new();
    hasher.update(brand.as_bytes());
    hasher.update(year.as_bytes());
    hasher.update(sequence.as_bytes());
    let digest = hasher.finalize();

    hex::encode_upper(&digest[..1])
        .chars()
        .next()
        .unwrap_or('0')
}

/// Build `<brand><year:4><sequence:width><checksum>`
pub fn compose_serial_number(
    brand: &BrandCode,
    year: i32,
    sequence: u32,
    sequence_digits: u32,
) -> SerialNumber {
    let width = sequence_digits as usize;
    let year = format!("{:04}", year);
    let sequence = format!("{:0width$}", sequence, width = width);
    let check = checksum(brand.as_str(), &year, &sequence);

    SerialNumber(format!("{}{}{}{}", brand, year, sequence, check))
}

/// Append a 24-bit suffix to the vendor prefix
pub fn compose_mac_address(prefix: &OuiPrefix, suffix: u32) -> MacAddress {
    let [a, b, c] = prefix.octets();
    let [_, d, e, f] = suffix.to_be_bytes();

    MacAddress(format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        a, b, c, d, e, f
    ))
}

/// Accepts any brand code length `BrandCode` allows, so `ROBOT` serials are
/// 16 characters. Use [`is_standard_serial_number`] for the fixed 17-character form.
pub fn is_valid_serial_number(value: &str) -> bool {
    SERIAL_NUMBER_RE.is_match(value)
}

/// Six-letter brand, four-digit year, six-digit sequence, one hex checksum
pub fn is_standard_serial_number(value: &str) -> bool {
    STANDARD_SERIAL_NUMBER_RE.is_match(value)
}

pub fn is_valid_mac_address(value: &str) -> bool {
    MAC_ADDRESS_RE.is_match(value)
}
