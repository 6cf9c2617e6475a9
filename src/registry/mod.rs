pub mod snapshot;

pub use snapshot::{Snapshot, UsedDevices};

use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::domain::IdentifierKind;
use crate::error::Result;

/// Identifiers issued in one namespace, remembering issuance order.
///
/// `retired` holds snapshot entries older than the history window. They are
/// not checked on claim but are written back ahead of `order` on persist.
#[derive(Debug, Default)]
struct UsedSet {
    members: HashSet<String>,
    order: Vec<String>,
    retired: Vec<String>,
}

impl UsedSet {
    fn from_history(history: Vec<String>) -> (Self, usize) {
        let mut set = Self::default();
        let mut duplicates = 0;
        for value in history {
            if !set.claim(&value) {
                duplicates += 1;
            }
        }
        (set, duplicates)
    }

    /// Check-then-insert; callers must hold the namespace lock
    fn claim(&mut self, value: &str) -> bool {
        if self.members.contains(value) {
            return false;
        }
        self.insert(value);
        true
    }

    fn insert(&mut self, value: &str) {
        self.members.insert(value.to_string());
        self.order.push(value.to_string());
    }

    /// Full history for persisting, oldest first
    fn history(&self) -> Vec<String> {
        self.retired.iter().chain(&self.order).cloned().collect()
    }
}

/// Split `history` into (retired, kept) so that `kept` holds at most `window` entries
fn split_window(
    mut history: Vec<String>,
    window: Option<usize>,
    kind: IdentifierKind,
) -> (Vec<String>, Vec<String>) {
    let Some(window) = window else {
        return (Vec::new(), history);
    };

    let excess = history.len().saturating_sub(window);
    if excess == 0 {
        return (Vec::new(), history);
    }

    warn!(
        "Not checking {} oldest {} entries outside history window of {}",
        excess, kind, window
    );
    let kept = history.split_off(excess);
    (history, kept)
}

/// Every identifier issued so far, one exclusively-locked set per namespace.
///
/// Identifiers are only ever added. All mutation goes through [`Registry::claim`],
/// which tests membership and inserts under the same lock, so two workers can
/// never both be granted the same value.
#[derive(Debug, Default)]
pub struct Registry {
    serial_numbers: Mutex<UsedSet>,
    mac_addresses: Mutex<UsedSet>,
    #[cfg(test)]
    claim_delay: Option<std::time::Duration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the full history stored at `path`; a missing file yields an empty registry
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_window(path, None)
    }

    /// Load history, keeping only the `window` most recent entries per namespace.
    ///
    /// With a window, uniqueness holds only against the retained entries.
    pub fn load_with_window(path: &Path, window: Option<usize>) -> Result<Self> {
        let Some(snapshot) = Snapshot::read(path)? else {
            info!("No snapshot at {}, starting with empty registry", path.display());
            return Ok(Self::new());
        };

        let (sn_retired, serial_numbers) = split_window(
            snapshot.used_devices.serial_numbers,
            window,
            IdentifierKind::SerialNumber,
        );
        let (mac_retired, mac_addresses) = split_window(
            snapshot.used_devices.mac_addresses,
            window,
            IdentifierKind::MacAddress,
        );

        let (mut serial_numbers, sn_duplicates) = UsedSet::from_history(serial_numbers);
        let (mut mac_addresses, mac_duplicates) = UsedSet::from_history(mac_addresses);
        serial_numbers.retired = sn_retired;
        mac_addresses.retired = mac_retired;
        if sn_duplicates + mac_duplicates > 0 {
            warn!(
                "Snapshot {} contained {} duplicate serial numbers and {} duplicate MAC addresses",
                path.display(),
                sn_duplicates,
                mac_duplicates
            );
        }

        info!(
            "Loaded {} serial numbers and {} MAC addresses from {} (last updated: {})",
            serial_numbers.order.len(),
            mac_addresses.order.len(),
            path.display(),
            snapshot
                .last_updated
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        );

        Ok(Self {
            serial_numbers: Mutex::new(serial_numbers),
            mac_addresses: Mutex::new(mac_addresses),
            #[cfg(test)]
            claim_delay: None,
        })
    }

    fn set(&self, kind: IdentifierKind) -> MutexGuard<'_, UsedSet> {
        let lock = match kind {
            IdentifierKind::SerialNumber => &self.serial_numbers,
            IdentifierKind::MacAddress => &self.mac_addresses,
        };
        // UsedSet::insert cannot panic between its two pushes, so a poisoned
        // lock still guards a consistent set.
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically record `value` as issued. Returns false if it was already taken.
    pub fn claim(&self, kind: IdentifierKind, value: &str) -> bool {
        let mut set = self.set(kind);
        if set.members.contains(value) {
            return false;
        }

        #[cfg(test)]
        if let Some(delay) = self.claim_delay {
            std::thread::sleep(delay);
        }

        set.insert(value);
        true
    }

    /// Sleep between the membership check and the insert of every claim
    #[cfg(test)]
    pub(crate) fn with_claim_delay(mut self, delay: std::time::Duration) -> Self {
        self.claim_delay = Some(delay);
        self
    }

    pub fn contains(&self, kind: IdentifierKind, value: &str) -> bool {
        self.set(kind).members.contains(value)
    }

    pub fn len(&self, kind: IdentifierKind) -> usize {
        self.set(kind).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len(IdentifierKind::SerialNumber) == 0 && self.len(IdentifierKind::MacAddress) == 0
    }

    /// Copy of the checked entries of one namespace in issuance order
    pub fn issued(&self, kind: IdentifierKind) -> Vec<String> {
        self.set(kind).order.clone()
    }

    /// Entries loaded from the snapshot but left outside the history window
    pub fn retired(&self, kind: IdentifierKind) -> usize {
        self.set(kind).retired.len()
    }

    /// Everything to write back, retired entries included
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            used_devices: UsedDevices {
                serial_numbers: self.set(IdentifierKind::SerialNumber).history(),
                mac_addresses: self.set(IdentifierKind::MacAddress).history(),
            },
            last_updated: Some(Utc::now()),
        }
    }

    /// Overwrite the snapshot at `path` with the current registry contents
    pub fn persist(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        snapshot.write(path)?;
        debug!(
            "Persisted {} serial numbers and {} MAC addresses to {}",
            snapshot.used_devices.serial_numbers.len(),
            snapshot.used_devices.mac_addresses.len(),
            path.display()
        );
        Ok(())
    }
}
