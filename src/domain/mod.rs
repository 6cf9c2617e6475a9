pub mod format;
pub mod types;

pub use format::{
    checksum, compose_mac_address, compose_serial_number, is_standard_serial_number,
    is_valid_mac_address, is_valid_serial_number,
};
pub use types::{BrandCode, Device, IdentifierKind, MacAddress, OuiPrefix, SerialNumber};
