#![cfg_attr(not(test), no_std)]
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

//! Vital product data (VPD) for microcontroller non-volatile storage.
//!
//! A 55 byte record holding a format token, product identity fields, a MAC address and a
//! checksum. [`VpdManager::initialize`] reads it at boot and, when the token or the checksum is
//! wrong, overwrites it with [`DEFAULT_RECORD`] and reads it back.

mod fmt;

pub mod checksum;
pub mod manager;
pub mod record;
pub mod storage;

pub use checksum::{Checksum, Crc8Checksum, ZeroSumChecksum};
pub use manager::{InitOutcome, VpdManager, VpdState, token_matches};
pub use record::{DEFAULT_RECORD, MacAddress, VPD_ADDR, VPD_SIZE, VPD_TOKEN, VpdRecord};
pub use storage::{StorageDriver, StorageDriverError, VpdStorage};
