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

use bytemuck::{Pod, Zeroable};
use core::fmt;

/// Offset of the record within the VPD storage region.
pub const VPD_ADDR: u32 = 0x0000;
/// Size in bytes of the stored record, checksum included.
pub const VPD_SIZE: usize = 55;
/// Token identifying the record format.
pub const VPD_TOKEN: &str = "SER";

pub const TOKEN_LEN: usize = 4;
pub const MODEL_LEN: usize = 12;
pub const MANUFACTURER_LEN: usize = 12;
pub const SERIAL_NUMBER_LEN: usize = 12;
pub const MAC_ADDRESS_LEN: usize = 6;
pub const COUNTRY_OF_ORIGIN_LEN: usize = 4;

/// Record written to storage when the stored one fails validation. The checksum byte is left at
/// zero here and filled in when the defaults are written.
pub const DEFAULT_RECORD: VpdRecord = VpdRecord::new(
    VPD_TOKEN,
    "VPD-1",
    "Unknown",
    "00000000000",
    0,
    MacAddress::derived(*b"vpd-01"),
    "USA",
);

/// Vital product data as laid out in non-volatile storage.
///
/// Text fields are fixed size byte arrays holding NUL terminated text. The manufacture date is a
/// little endian `u32`, zero when unset. The final byte is the checksum over the whole record.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct VpdRecord {
    token: [u8; TOKEN_LEN],
    model: [u8; MODEL_LEN],
    manufacturer: [u8; MANUFACTURER_LEN],
    serial_number: [u8; SERIAL_NUMBER_LEN],
    manufacture_date: [u8; 4],
    mac_address: [u8; MAC_ADDRESS_LEN],
    country_of_origin: [u8; COUNTRY_OF_ORIGIN_LEN],
    checksum: u8,
}

const _: () = assert!(core::mem::size_of::<VpdRecord>() == VPD_SIZE);

impl VpdRecord {
    /// All bytes zero, which never carries a valid token.
    pub const EMPTY: Self = Self {
        token: [0; TOKEN_LEN],
        model: [0; MODEL_LEN],
        manufacturer: [0; MANUFACTURER_LEN],
        serial_number: [0; SERIAL_NUMBER_LEN],
        manufacture_date: [0; 4],
        mac_address: [0; MAC_ADDRESS_LEN],
        country_of_origin: [0; COUNTRY_OF_ORIGIN_LEN],
        checksum: 0,
    };

    /// Builds a record with a zero checksum. Each text must leave room for its terminator, which
    /// is checked at compile time when used in a const context.
    pub const fn new(
        token: &str,
        model: &str,
        manufacturer: &str,
        serial_number: &str,
        manufacture_date: u32,
        mac_address: MacAddress,
        country_of_origin: &str,
    ) -> Self {
        Self {
            token: text_field(token),
            model: text_field(model),
            manufacturer: text_field(manufacturer),
            serial_number: text_field(serial_number),
            manufacture_date: manufacture_date.to_le_bytes(),
            mac_address: mac_address.octets(),
            country_of_origin: text_field(country_of_origin),
            checksum: 0,
        }
    }

    pub fn from_bytes(bytes: &[u8; VPD_SIZE]) -> Self {
        *bytemuck::from_bytes::<Self>(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::bytes_of_mut(self)
    }

    /// Token bytes up to, not including, the terminator.
    pub fn token_bytes(&self) -> &[u8] {
        terminated(&self.token)
    }

    pub fn token(&self) -> Option<&str> {
        text(&self.token)
    }

    pub fn model(&self) -> Option<&str> {
        text(&self.model)
    }

    pub fn manufacturer(&self) -> Option<&str> {
        text(&self.manufacturer)
    }

    pub fn serial_number(&self) -> Option<&str> {
        text(&self.serial_number)
    }

    pub fn manufacture_date(&self) -> u32 {
        u32::from_le_bytes(self.manufacture_date)
    }

    pub fn mac_address(&self) -> MacAddress {
        MacAddress::new(self.mac_address)
    }

    pub fn country_of_origin(&self) -> Option<&str> {
        text(&self.country_of_origin)
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }
}

impl Default for VpdRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for VpdRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VpdRecord")
            .field("token", &self.token().unwrap_or("?"))
            .field("model", &self.model().unwrap_or("?"))
            .field("manufacturer", &self.manufacturer().unwrap_or("?"))
            .field("serial_number", &self.serial_number().unwrap_or("?"))
            .field("manufacture_date", &self.manufacture_date())
            .field("mac_address", &self.mac_address())
            .field("country_of_origin", &self.country_of_origin().unwrap_or("?"))
            .field("checksum", &format_args!("{:#04x}", self.checksum))
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for VpdRecord {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "VpdRecord {{ token: {=str}, model: {=str}, manufacturer: {=str}, serial_number: {=str}, manufacture_date: {=u32}, mac_address: {}, country_of_origin: {=str}, checksum: {=u8:#x} }}",
            self.token().unwrap_or("?"),
            self.model().unwrap_or("?"),
            self.manufacturer().unwrap_or("?"),
            self.serial_number().unwrap_or("?"),
            self.manufacture_date(),
            self.mac_address(),
            self.country_of_origin().unwrap_or("?"),
            self.checksum,
        )
    }
}

/// Hardware address stored in the record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; MAC_ADDRESS_LEN]);

impl MacAddress {
    pub const fn new(octets: [u8; MAC_ADDRESS_LEN]) -> Self {
        Self(octets)
    }

    /// Address from arbitrary seed bytes with the group bit cleared, so it is always unicast.
    pub const fn derived(seed: [u8; MAC_ADDRESS_LEN]) -> Self {
        let mut octets = seed;
        octets[0] &= !0x01;
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; MAC_ADDRESS_LEN] {
        self.0
    }

    pub fn is_unicast(&self) -> bool {
        self.0[0] & 0x01 == 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MacAddress {
    fn format(&self, f: defmt::Formatter) {
        let [a, b, c, d, e, g] = self.0;
        defmt::write!(
            f,
            "{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}",
            a,
            b,
            c,
            d,
            e,
            g
        )
    }
}

const fn text_field<const N: usize>(value: &str) -> [u8; N] {
    let bytes = value.as_bytes();
    assert!(bytes.len() < N, "text does not fit in VPD field");
    let mut field = [0u8; N];
    let mut i = 0;
    while i < bytes.len() {
        field[i] = bytes[i];
        i += 1;
    }
    field
}

fn terminated(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

fn text(field: &[u8]) -> Option<&str> {
    core::str::from_utf8(terminated(field)).ok()
}
