pub mod batch;

pub use batch::{BatchOutcome, BatchRequest};

use chrono::{Datelike, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::warn;

use crate::domain::{
    compose_mac_address, compose_serial_number, BrandCode, Device, IdentifierKind, MacAddress,
    OuiPrefix, SerialNumber,
};
use crate::error::{Error, Result};
use crate::registry::Registry;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Size of the random portion of each identifier.
///
/// Production fixtures use the defaults; tests shrink the space so that
/// collisions and exhaustion become observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyspace {
    sequence_digits: u32,
    mac_suffix_space: u32,
}

impl Keyspace {
    pub const MAX_SEQUENCE_DIGITS: u32 = 9;
    pub const MAC_SUFFIX_SPACE: u32 = 1 << 24;

    pub fn new(sequence_digits: u32, mac_suffix_space: u32) -> Self {
        Self {
            sequence_digits: sequence_digits.clamp(1, Self::MAX_SEQUENCE_DIGITS),
            mac_suffix_space: mac_suffix_space.clamp(1, Self::MAC_SUFFIX_SPACE),
        }
    }

    pub fn sequence_digits(&self) -> u32 {
        self.sequence_digits
    }

    /// Number of distinct sequences per brand and year
    pub fn sequence_space(&self) -> u32 {
        10u32.pow(self.sequence_digits)
    }

    /// Number of distinct MAC suffixes per prefix
    pub fn mac_suffix_space(&self) -> u32 {
        self.mac_suffix_space
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new(6, Self::MAC_SUFFIX_SPACE)
    }
}

/// Issues serial numbers and MAC addresses absent from a shared [`Registry`].
///
/// Cloning is cheap; clones share the registry, so they can be handed to
/// concurrent workers.
#[derive(Debug, Clone)]
pub struct Generator {
    registry: Arc<Registry>,
    keyspace: Keyspace,
    year: Option<i32>,
}

impl Generator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            keyspace: Keyspace::default(),
            year: None,
        }
    }

    pub fn with_keyspace(mut self, keyspace: Keyspace) -> Self {
        self.keyspace = keyspace;
        self
    }

    /// Stamp every serial number with `year` instead of the current UTC year
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn keyspace(&self) -> Keyspace {
        self.keyspace
    }

    pub fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }

    pub fn generate_serial_number(
        &self,
        brand: &BrandCode,
        max_attempts: u32,
    ) -> Result<SerialNumber> {
        self.generate_serial_number_with(&mut rand::rng(), brand, max_attempts)
    }

    pub fn generate_serial_number_with<R: Rng>(
        &self,
        rng: &mut R,
        brand: &BrandCode,
        max_attempts: u32,
    ) -> Result<SerialNumber> {
        let year = self.year();
        let digits = self.keyspace.sequence_digits();
        let space = self.keyspace.sequence_space();

        self.sample(IdentifierKind::SerialNumber, max_attempts, || {
            compose_serial_number(brand, year, rng.random_range(0..space), digits)
        })
    }

    pub fn generate_mac_address(&self, prefix: &OuiPrefix, max_attempts: u32) -> Result<MacAddress> {
        self.generate_mac_address_with(&mut rand::rng(), prefix, max_attempts)
    }

    pub fn generate_mac_address_with<R: Rng>(
        &self,
        rng: &mut R,
        prefix: &OuiPrefix,
        max_attempts: u32,
    ) -> Result<MacAddress> {
        let space = self.keyspace.mac_suffix_space();

        self.sample(IdentifierKind::MacAddress, max_attempts, || {
            compose_mac_address(prefix, rng.random_range(0..space))
        })
    }

    /// Issue one serial number and one MAC address.
    ///
    /// If the MAC address is exhausted the serial number stays claimed;
    /// issued identifiers are never returned to the registry.
    pub fn generate_device_with<R: Rng>(
        &self,
        rng: &mut R,
        brand: &BrandCode,
        prefix: &OuiPrefix,
        max_attempts: u32,
    ) -> Result<Device> {
        let serial_number = self.generate_serial_number_with(rng, brand, max_attempts)?;
        let mac_address = self.generate_mac_address_with(rng, prefix, max_attempts)?;
        Ok(Device {
            serial_number,
            mac_address,
        })
    }

    /// Rejection sampling: draw until the registry accepts a candidate or attempts run out
    fn sample<T, F>(&self, kind: IdentifierKind, max_attempts: u32, mut draw: F) -> Result<T>
    where
        T: AsRef<str>,
        F: FnMut() -> T,
    {
        for _ in 0..max_attempts {
            let candidate = draw();
            if self.registry.claim(kind, candidate.as_ref()) {
                return Ok(candidate);
            }
        }

        warn!("No unused {} after {} attempts", kind, max_attempts);
        Err(Error::GenerationExhausted {
            kind,
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{is_valid_mac_address, is_valid_serial_number};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn generator() -> Generator {
        Generator::new(Arc::new(Registry::new()))
    }

    fn tiny_generator(sequence_digits: u32, mac_suffix_space: u32) -> Generator {
        generator()
            .with_keyspace(Keyspace::new(sequence_digits, mac_suffix_space))
            .with_year(2026)
    }

    #[test]
    fn test_keyspace_defaults() {
        let keyspace = Keyspace::default();
        assert_eq!(keyspace.sequence_digits(), 6);
        assert_eq!(keyspace.sequence_space(), 1_000_000);
        assert_eq!(keyspace.mac_suffix_space(), 16_777_216);
    }

    #[test]
    fn test_keyspace_clamps() {
        let keyspace = Keyspace::new(0, 0);
        assert_eq!(keyspace.sequence_digits(), 1);
        assert_eq!(keyspace.mac_suffix_space(), 1);

        let keyspace = Keyspace::new(12, u32::MAX);
        assert_eq!(keyspace.sequence_digits(), 9);
        assert_eq!(keyspace.mac_suffix_space(), Keyspace::MAC_SUFFIX_SPACE);
    }

    #[test]
    fn test_serial_number_format() {
        let gen = generator();
        let brand = BrandCode::default();
        let year = Utc::now().year();

        for _ in 0..500 {
            let sn = gen.generate_serial_number(&brand, DEFAULT_MAX_ATTEMPTS).unwrap();
            assert_eq!(sn.as_str().len(), 17);
            assert!(sn.as_str().starts_with(&format!("DEVGEN{}", year)));
            assert!(is_valid_serial_number(sn.as_str()));
        }
    }

    #[test]
    fn test_serial_numbers_unique_and_registered() {
        let gen = generator();
        let brand = BrandCode::default();
        let mut seen = HashSet::new();

        for _ in 0..2_000 {
            let sn = gen.generate_serial_number(&brand, DEFAULT_MAX_ATTEMPTS).unwrap();
            assert!(seen.insert(sn.clone()), "duplicate {}", sn);
            assert!(gen.registry().contains(IdentifierKind::SerialNumber, sn.as_str()));
        }
        assert_eq!(gen.registry().len(IdentifierKind::SerialNumber), 2_000);
    }

    #[test]
    fn test_two_robot_serials_in_succession() {
        let gen = generator();
        let brand = BrandCode::new("ROBOT").unwrap();
        let prefix = format!("ROBOT{}", Utc::now().year());

        let first = gen.generate_serial_number(&brand, DEFAULT_MAX_ATTEMPTS).unwrap();
        let second = gen.generate_serial_number(&brand, DEFAULT_MAX_ATTEMPTS).unwrap();

        assert!(first.as_str().starts_with(&prefix));
        assert!(second.as_str().starts_with(&prefix));
        assert_ne!(first, second);
        assert!(gen.registry().contains(IdentifierKind::SerialNumber, first.as_str()));
        assert!(gen.registry().contains(IdentifierKind::SerialNumber, second.as_str()));
    }

    #[test]
    fn test_pinned_year() {
        let gen = generator().with_year(1999);
        let sn = gen
            .generate_serial_number(&BrandCode::default(), DEFAULT_MAX_ATTEMPTS)
            .unwrap();
        assert!(sn.as_str().starts_with("DEVGEN1999"));
    }

    #[test]
    fn test_mac_address_format_and_prefix() {
        let gen = generator();
        let prefix = OuiPrefix::parse("A4:5E:60").unwrap();
        let mut seen = HashSet::new();

        for _ in 0..1_000 {
            let mac = gen.generate_mac_address(&prefix, DEFAULT_MAX_ATTEMPTS).unwrap();
            assert!(is_valid_mac_address(mac.as_str()));
            assert!(mac.as_str().starts_with("A4:5E:60:"));
            assert!(seen.insert(mac));
        }
    }

    #[test]
    fn test_serial_exhaustion_leaves_registry_untouched() {
        let gen = tiny_generator(2, 16);
        let brand = BrandCode::default();
        for seq in 0..100 {
            let sn = compose_serial_number(&brand, 2026, seq, 2);
            assert!(gen.registry().claim(IdentifierKind::SerialNumber, sn.as_str()));
        }
        let before = gen.registry().issued(IdentifierKind::SerialNumber);

        let err = gen.generate_serial_number(&brand, 10).unwrap_err();
        assert!(matches!(
            err,
            Error::GenerationExhausted {
                kind: IdentifierKind::SerialNumber,
                attempts: 10
            }
        ));
        assert_eq!(gen.registry().issued(IdentifierKind::SerialNumber), before);
    }

    #[test]
    fn test_mac_exhaustion() {
        let gen = tiny_generator(6, 4);
        let prefix = OuiPrefix::default();

        let mut rng = StdRng::seed_from_u64(7);
        let mut issued = 0;
        while gen.generate_mac_address_with(&mut rng, &prefix, 1_000).is_ok() {
            issued += 1;
        }
        assert_eq!(issued, 4);
        assert_eq!(gen.registry().len(IdentifierKind::MacAddress), 4);
    }

    #[test]
    fn test_zero_attempts_always_exhausts() {
        let gen = generator();
        let err = gen.generate_serial_number(&BrandCode::default(), 0).unwrap_err();
        assert!(err.is_exhausted());
        assert!(gen.registry().is_empty());
    }

    #[test]
    fn test_preloaded_values_are_never_reissued() {
        let gen = tiny_generator(1, 16);
        let brand = BrandCode::default();
        for seq in 0..9 {
            let sn = compose_serial_number(&brand, 2026, seq, 1);
            gen.registry().claim(IdentifierKind::SerialNumber, sn.as_str());
        }

        let sn = gen.generate_serial_number(&brand, 10_000).unwrap();
        assert_eq!(sn, compose_serial_number(&brand, 2026, 9, 1));
    }

    #[test]
    fn test_device_namespaces_independent() {
        let gen = tiny_generator(6, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let brand = BrandCode::default();
        let prefix = OuiPrefix::default();

        let device = gen.generate_device_with(&mut rng, &brand, &prefix, 10).unwrap();
        assert_eq!(device.mac_address.as_str(), "02:00:00:00:00:00");

        // MAC space is spent; the serial drawn for the second device stays claimed.
        let err = gen.generate_device_with(&mut rng, &brand, &prefix, 10).unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(gen.registry().len(IdentifierKind::SerialNumber), 2);
        assert_eq!(gen.registry().len(IdentifierKind::MacAddress), 1);
    }

    #[test]
    fn test_slow_claims_never_share_a_serial() {
        use std::thread;
        use std::time::Duration;

        let registry = Registry::new().with_claim_delay(Duration::from_millis(2));
        let gen = Generator::new(Arc::new(registry))
            .with_keyspace(Keyspace::new(1, Keyspace::MAC_SUFFIX_SPACE))
            .with_year(2026);
        let brand = BrandCode::default();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let gen = gen.clone();
                let brand = brand.clone();
                thread::spawn(move || gen.generate_serial_number(&brand, 100_000).unwrap())
            })
            .collect();

        let issued: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(issued.len(), 10);
        assert_eq!(gen.registry().len(IdentifierKind::SerialNumber), 10);
    }
}
