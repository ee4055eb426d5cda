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

use core::cell::RefCell;
use defmt::debug;
use embassy_embedded_hal::flash::partition::BlockingPartition;
use embassy_rp::Peri;
use embassy_rp::flash::{Blocking, ERASE_SIZE, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_storage::nor_flash::RmwNorFlashStorage;
use static_cell::StaticCell;
use vpd_core::StorageDriver;

pub type BlockingFlash = Flash<'static, FLASH, Blocking, { crate::FLASH_SIZE }>;

pub type FlashMutex = Mutex<CriticalSectionRawMutex, RefCell<BlockingFlash>>;

pub type VpdPartition = BlockingPartition<'static, CriticalSectionRawMutex, BlockingFlash>;

pub type VpdStorageDriver = StorageDriver<RmwNorFlashStorage<'static, VpdPartition>, fn() -> bool>;

/// The last sector of flash, kept out of the program image by `memory.x`.
pub const VPD_PARTITION_OFFSET: u32 = (crate::FLASH_SIZE - ERASE_SIZE) as u32;
pub const VPD_PARTITION_SIZE: u32 = ERASE_SIZE as u32;

static FLASH_MUTEX: StaticCell<FlashMutex> = StaticCell::new();
static MERGE_BUFFER: StaticCell<[u8; ERASE_SIZE]> = StaticCell::new();

/// Wraps the VPD partition as byte addressed storage. A write reads back the whole sector,
/// erases it and programs the merged contents.
///
/// Blocking flash operations only return once the flash is idle again, so the driver never
/// reports busy.
pub fn mount_vpd_storage(flash: Peri<'static, FLASH>) -> VpdStorageDriver {
    let flash_mutex = FLASH_MUTEX.init(Mutex::new(RefCell::new(Flash::new_blocking(flash))));
    let partition = BlockingPartition::new(flash_mutex, VPD_PARTITION_OFFSET, VPD_PARTITION_SIZE);
    debug!(
        "VPD partition: 0x{:x} to 0x{:x}",
        VPD_PARTITION_OFFSET,
        VPD_PARTITION_OFFSET + VPD_PARTITION_SIZE
    );

    let merge_buffer = MERGE_BUFFER.init([0; ERASE_SIZE]);
    StorageDriver::without_busy_signal(RmwNorFlashStorage::new(partition, merge_buffer), 0)
}
