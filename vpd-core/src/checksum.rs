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

use crc::{CRC_8_SMBUS, Crc};

/// Single byte integrity check over a buffer whose last byte holds the checksum.
pub trait Checksum {
    /// True when the relation holds over the whole buffer, checksum byte included.
    fn is_valid(&self, bytes: &[u8]) -> bool;

    /// Rewrites the last byte of `bytes` so that [`Checksum::is_valid`] holds.
    fn update(&self, bytes: &mut [u8]);
}

/// Byte sum modulo 256 over the buffer is zero.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZeroSumChecksum;

impl ZeroSumChecksum {
    fn sum(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
    }
}

impl Checksum for ZeroSumChecksum {
    fn is_valid(&self, bytes: &[u8]) -> bool {
        Self::sum(bytes) == 0
    }

    fn update(&self, bytes: &mut [u8]) {
        if let Some((checksum, body)) = bytes.split_last_mut() {
            *checksum = 0u8.wrapping_sub(Self::sum(body));
        }
    }
}

/// CRC-8/SMBUS. With no reflection and no final xor the CRC over data followed by its own CRC
/// byte is zero, giving the same "whole buffer evaluates to zero" relation as the byte sum.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Crc8Checksum;

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

impl Checksum for Crc8Checksum {
    fn is_valid(&self, bytes: &[u8]) -> bool {
        CRC8.checksum(bytes) == 0
    }

    fn update(&self, bytes: &mut [u8]) {
        if let Some((checksum, body)) = bytes.split_last_mut() {
            *checksum = CRC8.checksum(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sum_checksum_byte() {
        let mut buffer = [1u8, 2, 3, 0];
        ZeroSumChecksum.update(&mut buffer);

        assert_eq!(buffer[3], 0xfa);
        assert!(ZeroSumChecksum.is_valid(&buffer));
    }

    #[test]
    fn zero_sum_wraps() {
        let mut buffer = [0xffu8, 0xff, 0xff, 0];
        ZeroSumChecksum.update(&mut buffer);

        assert_eq!(buffer[3], 0x03);
        assert!(ZeroSumChecksum.is_valid(&buffer));
    }

    #[test]
    fn zero_sum_detects_single_bit_flip() {
        let mut buffer = *b"SER\0some product data\0";
        ZeroSumChecksum.update(&mut buffer);
        buffer[5] ^= 0x10;

        assert!(!ZeroSumChecksum.is_valid(&buffer));
    }

    #[test]
    fn crc8_check_value() {
        let mut buffer = *b"123456789\0";
        Crc8Checksum.update(&mut buffer);

        assert_eq!(buffer[9], 0xf4);
        assert!(Crc8Checksum.is_valid(&buffer));
    }

    #[test]
    fn crc8_detects_single_bit_flip() {
        let mut buffer = *b"SER\0some product data\0";
        Crc8Checksum.update(&mut buffer);
        buffer[0] ^= 0x01;

        assert!(!Crc8Checksum.is_valid(&buffer));
    }

    #[test]
    fn crc8_detects_swapped_bytes() {
        let mut buffer = *b"ab\0";
        Crc8Checksum.update(&mut buffer);
        buffer.swap(0, 1);

        assert!(!Crc8Checksum.is_valid(&buffer));
        // a byte sum cannot see reordering
        let mut buffer = *b"ab\0";
        ZeroSumChecksum.update(&mut buffer);
        buffer.swap(0, 1);
        assert!(ZeroSumChecksum.is_valid(&buffer));
    }

    #[test]
    fn update_on_empty_buffer_is_a_no_op() {
        let mut buffer: [u8; 0] = [];
        ZeroSumChecksum.update(&mut buffer);
        Crc8Checksum.update(&mut buffer);
    }
}
