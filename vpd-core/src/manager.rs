// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::checksum::Checksum;
use crate::fmt::Debug2Format;
use crate::record::{DEFAULT_RECORD, VPD_ADDR, VPD_SIZE, VPD_TOKEN, VpdRecord};
use crate::storage::VpdStorage;

/// Progress of [`VpdManager::initialize`]. `Done` is terminal for the life of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VpdState {
    Uninitialized,
    Reading,
    Valid,
    Invalid,
    Repairing,
    Done,
}

/// What initialisation found in storage. Informational only, the live record is usable either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitOutcome {
    /// The stored record passed validation and was kept.
    Loaded,
    /// The stored record failed validation and the defaults were written over it.
    DefaultsRestored,
}

/// True when the record's terminated token is exactly [`VPD_TOKEN`]. A token that is a prefix
/// of the expected one, or runs past it, does not match.
pub fn token_matches(record: &VpdRecord) -> bool {
    record.token_bytes() == VPD_TOKEN.as_bytes()
}

/// Owns the live VPD record and keeps it, and the stored copy, either valid or equal to the
/// defaults.
pub struct VpdManager<S, C> {
    storage: S,
    checksum: C,
    record: VpdRecord,
    defaults: VpdRecord,
    state: VpdState,
    outcome: Option<InitOutcome>,
    #[cfg(test)]
    transitions: Vec<VpdState>,
}

impl<S, C> VpdManager<S, C>
where
    S: VpdStorage,
    C: Checksum,
{
    pub fn new(storage: S, checksum: C) -> Self {
        Self {
            storage,
            checksum,
            record: VpdRecord::EMPTY,
            defaults: DEFAULT_RECORD,
            state: VpdState::Uninitialized,
            outcome: None,
            #[cfg(test)]
            transitions: Vec::new(),
        }
    }

    /// Replaces the compiled in defaults for this instance. The checksum byte is recomputed when
    /// they are written.
    pub fn with_defaults(mut self, defaults: VpdRecord) -> Self {
        self.defaults = defaults;
        self
    }

    /// Token and checksum are both checked, every time, and both must pass.
    pub fn is_valid(&self, record: &VpdRecord) -> bool {
        let token_ok = token_matches(record);
        let checksum_ok = self.checksum.is_valid(record.as_bytes());

        if !token_ok {
            debug!("VPD token mismatch");
        }
        if !checksum_ok {
            debug!("VPD checksum mismatch");
        }

        token_ok && checksum_ok
    }

    /// Fills in the checksum of the defaults and writes them to storage. The live record is left
    /// alone. A failed write is logged and otherwise ignored.
    pub fn write_defaults(&mut self) {
        self.checksum.update(self.defaults.as_bytes_mut());
        debug!(
            "Writing default VPD, checksum 0x{:x}",
            self.defaults.checksum()
        );

        if let Err(e) = self.storage.write_bytes(VPD_ADDR, self.defaults.as_bytes()) {
            warn!("Unable to write default VPD. Error: {:?}", Debug2Format(&e));
        }
    }

    /// Loads the record from storage, repairing it with the defaults when it fails validation.
    ///
    /// Spins until the storage reports idle, with no timeout. After a repair the record is read
    /// back but not validated again, so a write that silently failed goes unnoticed here;
    /// [`VpdManager::verify`] can be used to check afterwards. Calling this again once done
    /// does no I/O and returns the first outcome.
    pub fn initialize(&mut self) -> InitOutcome {
        if let Some(outcome) = self.outcome {
            debug!("VPD already initialised");
            return outcome;
        }

        self.wait_for_storage();

        self.enter(VpdState::Reading);
        self.read_record();

        let outcome = if self.is_valid(&self.record) {
            self.enter(VpdState::Valid);
            InitOutcome::Loaded
        } else {
            self.enter(VpdState::Invalid);
            warn!("Stored VPD invalid, restoring defaults");

            self.enter(VpdState::Repairing);
            self.write_defaults();

            self.enter(VpdState::Reading);
            if !self.read_record() {
                error!("Default VPD could not be read back, live record is not trusted");
            }
            InitOutcome::DefaultsRestored
        };

        self.enter(VpdState::Done);
        self.outcome = Some(outcome);
        info!("VPD initialised: {:?}", outcome);
        outcome
    }

    /// Re-checks the live record.
    pub fn verify(&self) -> bool {
        self.is_valid(&self.record)
    }

    pub fn record(&self) -> &VpdRecord {
        &self.record
    }

    pub fn defaults(&self) -> &VpdRecord {
        &self.defaults
    }

    pub fn state(&self) -> VpdState {
        self.state
    }

    pub fn outcome(&self) -> Option<InitOutcome> {
        self.outcome
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_parts(self) -> (S, C, VpdRecord) {
        (self.storage, self.checksum, self.record)
    }

    fn wait_for_storage(&mut self) {
        trace!("Waiting for VPD storage");
        let mut polls: u32 = 0;
        while self.storage.is_busy() {
            polls = polls.wrapping_add(1);
            core::hint::spin_loop();
        }
        trace!("VPD storage ready after {} polls", polls);
    }

    fn enter(&mut self, state: VpdState) {
        trace!("VPD state {:?} -> {:?}", self.state, state);
        self.state = state;
        #[cfg(test)]
        self.transitions.push(state);
    }

    /// False when the storage reported an error, the live record then holds whatever the driver
    /// left in it.
    fn read_record(&mut self) -> bool {
        if let Err(e) = self
            .storage
            .read_bytes(VPD_ADDR, self.record.as_bytes_mut())
        {
            warn!("Unable to read VPD. Error: {:?}", Debug2Format(&e));
            return false;
        }
        trace!("Read {} VPD bytes from 0x{:x}", VPD_SIZE, VPD_ADDR);
        true
    }
}
