#![no_std]
#![no_main]
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

mod storage;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use vpd_core::{InitOutcome, VpdManager, ZeroSumChecksum};
#[allow(unused_imports)]
use {defmt_rtt as _, panic_probe as _};

pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());

    let dirty_indicator = if built_info::GIT_DIRTY.unwrap_or(true) {
        "+"
    } else {
        ""
    };
    info!(
        "{} v{} {}{} starting",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::GIT_COMMIT_HASH_SHORT.unwrap_or("unknown"),
        dirty_indicator,
    );

    let mut vpd = VpdManager::new(storage::mount_vpd_storage(p.FLASH), ZeroSumChecksum);
    match vpd.initialize() {
        InitOutcome::Loaded => info!("Using stored VPD"),
        InitOutcome::DefaultsRestored => warn!("Stored VPD was invalid, defaults written"),
    }

    let record = vpd.record();
    info!("{}", record);
    info!(
        "Serial number: {}, MAC: {}",
        record.serial_number().unwrap_or("?"),
        record.mac_address()
    );

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
