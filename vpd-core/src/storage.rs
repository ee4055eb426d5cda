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

use core::fmt::Debug;
use embedded_storage::{ReadStorage, Storage};

/// Byte addressed non-volatile storage holding the VPD record.
pub trait VpdStorage {
    type Error: Debug;

    /// Copies `buffer.len()` bytes starting at `address` into `buffer`.
    fn read_bytes(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Copies `buffer` into storage starting at `address`.
    fn write_bytes(&mut self, address: u32, buffer: &[u8]) -> Result<(), Self::Error>;

    /// True while a previous write is still in progress.
    fn is_busy(&mut self) -> bool;
}

impl<T: VpdStorage + ?Sized> VpdStorage for &mut T {
    type Error = T::Error;

    fn read_bytes(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_bytes(address, buffer)
    }

    fn write_bytes(&mut self, address: u32, buffer: &[u8]) -> Result<(), Self::Error> {
        (**self).write_bytes(address, buffer)
    }

    fn is_busy(&mut self) -> bool {
        (**self).is_busy()
    }
}

/// [`VpdStorage`] over any `embedded-storage` device, placed at `base_offset` within it.
///
/// `embedded-storage` has no notion of an in-flight write, so the busy state comes from a
/// separate predicate, typically a status register read on the device.
pub struct StorageDriver<S, B> {
    storage: S,
    base_offset: u32,
    busy: B,
}

fn never_busy() -> bool {
    false
}

impl<S> StorageDriver<S, fn() -> bool>
where
    S: Storage,
{
    /// For drivers that only return once a write has completed.
    pub fn without_busy_signal(storage: S, base_offset: u32) -> Self {
        Self::new(storage, base_offset, never_busy as fn() -> bool)
    }
}

impl<S, B> StorageDriver<S, B>
where
    S: Storage,
    B: FnMut() -> bool,
{
    pub fn new(storage: S, base_offset: u32, busy: B) -> Self {
        Self {
            storage,
            base_offset,
            busy,
        }
    }

    pub fn release(self) -> S {
        self.storage
    }
}

/// Failure of a [`StorageDriver`] transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageDriverError<E> {
    /// Base offset plus address does not fit in the device address space.
    AddressOverflow,
    Device(E),
}

impl<S, B> StorageDriver<S, B> {
    fn device_address(&self, address: u32) -> Option<u32> {
        let device_address = self.base_offset.checked_add(address);
        if device_address.is_none() {
            warn!(
                "VPD address 0x{:x} overflows from base 0x{:x}",
                address,
                self.base_offset
            );
        }
        device_address
    }
}

impl<S, B> VpdStorage for StorageDriver<S, B>
where
    S: Storage,
    <S as ReadStorage>::Error: Debug,
    B: FnMut() -> bool,
{
    type Error = StorageDriverError<<S as ReadStorage>::Error>;

    fn read_bytes(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let Some(device_address) = self.device_address(address) else {
            return Err(StorageDriverError::AddressOverflow);
        };
        trace!("Reading {} bytes at 0x{:x}", buffer.len(), device_address);
        self.storage
            .read(device_address, buffer)
            .map_err(StorageDriverError::Device)
    }

    fn write_bytes(&mut self, address: u32, buffer: &[u8]) -> Result<(), Self::Error> {
        let Some(device_address) = self.device_address(address) else {
            return Err(StorageDriverError::AddressOverflow);
        };
        trace!("Writing {} bytes at 0x{:x}", buffer.len(), device_address);
        self.storage
            .write(device_address, buffer)
            .map_err(StorageDriverError::Device)
    }

    fn is_busy(&mut self) -> bool {
        (self.busy)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Debug, PartialEq)]
    struct OutOfBounds;

    struct ByteStore {
        cells: [u8; 32],
    }

    impl ByteStore {
        fn check(&self, offset: u32, len: usize) -> Result<usize, OutOfBounds> {
            let start = offset as usize;
            if start + len > self.cells.len() {
                return Err(OutOfBounds);
            }
            Ok(start)
        }
    }

    impl ReadStorage for ByteStore {
        type Error = OutOfBounds;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let start = self.check(offset, bytes.len())?;
            bytes.copy_from_slice(&self.cells[start..start + bytes.len()]);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.cells.len()
        }
    }

    impl Storage for ByteStore {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let start = self.check(offset, bytes.len())?;
            self.cells[start..start + bytes.len()].copy_from_slice(bytes);
            Ok(())
        }
    }

    #[test]
    fn addresses_are_relative_to_base_offset() {
        let mut driver = StorageDriver::without_busy_signal(ByteStore { cells: [0; 32] }, 8);
        driver.write_bytes(2, &[0xaa, 0xbb]).unwrap();

        let mut read_back = [0u8; 2];
        driver.read_bytes(2, &mut read_back).unwrap();
        assert_eq!(read_back, [0xaa, 0xbb]);

        let store = driver.release();
        assert_eq!(&store.cells[10..12], &[0xaa, 0xbb]);
        assert_eq!(store.cells[2], 0);
    }

    #[test]
    fn device_errors_are_passed_through() {
        let mut driver = StorageDriver::without_busy_signal(ByteStore { cells: [0; 32] }, 30);

        assert_eq!(
            driver.write_bytes(0, &[1, 2, 3]),
            Err(StorageDriverError::Device(OutOfBounds))
        );
        let mut buffer = [0u8; 4];
        assert_eq!(
            driver.read_bytes(0, &mut buffer),
            Err(StorageDriverError::Device(OutOfBounds))
        );
    }

    #[test]
    fn address_past_u32_range_fails_the_transfer() {
        let mut driver =
            StorageDriver::without_busy_signal(ByteStore { cells: [0; 32] }, u32::MAX - 1);

        assert_eq!(
            driver.write_bytes(2, &[0x55]),
            Err(StorageDriverError::AddressOverflow)
        );
        let mut buffer = [0u8; 1];
        assert_eq!(
            driver.read_bytes(2, &mut buffer),
            Err(StorageDriverError::AddressOverflow)
        );
        assert_eq!(driver.release().cells, [0; 32]);
    }

    #[test]
    fn busy_state_comes_from_predicate() {
        let remaining = Cell::new(2u32);
        let mut driver = StorageDriver::new(ByteStore { cells: [0; 32] }, 0, || {
            let busy = remaining.get() > 0;
            remaining.set(remaining.get().saturating_sub(1));
            busy
        });

        assert!(driver.is_busy());
        assert!(driver.is_busy());
        assert!(!driver.is_busy());
    }

    #[test]
    fn without_busy_signal_is_never_busy() {
        let mut driver = StorageDriver::without_busy_signal(ByteStore { cells: [0; 32] }, 0);

        assert!(!driver.is_busy());
    }
}
