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

use std::env;
use std::path::PathBuf;
use std::process::Command;

const FIRMWARE_PACKAGE: &str = "vpd-firmware";
const CORE_PACKAGE: &str = "vpd-core";
const FIRMWARE_TARGET: &str = "thumbv6m-none-eabi";

#[derive(Debug, Clone, Copy, PartialEq)]
enum BuildTarget {
    Firmware,
    Core,
    All,
}

#[derive(Debug)]
enum Command_ {
    Build(BuildTarget),
    Flash,
    Run,
    Attach,
    Test,
    Help,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = match parse_command(&args[1..]) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error parsing command: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = execute_command(command) {
        eprintln!("Error executing command: {}", e);
        std::process::exit(1);
    }
}

fn parse_command(args: &[String]) -> Result<Command_, String> {
    if args.is_empty() {
        return Err("No command provided".to_string());
    }

    match args[0].as_str() {
        "build" => {
            let target = if args.len() > 1 {
                parse_build_target(&args[1])?
            } else {
                BuildTarget::All
            };
            Ok(Command_::Build(target))
        }
        "flash" => Ok(Command_::Flash),
        "run" => Ok(Command_::Run),
        "attach" => Ok(Command_::Attach),
        "test" => Ok(Command_::Test),
        "help" => Ok(Command_::Help),
        _ => Err(format!("Unknown command: {}", args[0])),
    }
}

fn parse_build_target(target: &str) -> Result<BuildTarget, String> {
    match target {
        "firmware" => Ok(BuildTarget::Firmware),
        "core" => Ok(BuildTarget::Core),
        "all" => Ok(BuildTarget::All),
        _ => Err(format!("Unknown target: {}", target)),
    }
}

fn execute_command(cmd: Command_) -> Result<(), String> {
    match cmd {
        Command_::Build(target) => build(target),
        Command_::Flash => {
            println!("Building and flashing firmware...");
            run_cargo(&["flash", "--release", "--chip", "RP2040"], FIRMWARE_PACKAGE, true)?;
            println!("✓ Firmware flashed successfully");
            Ok(())
        }
        Command_::Run => {
            println!("Building and running firmware...");
            run_cargo(&["run", "--release"], FIRMWARE_PACKAGE, true)?;
            println!("✓ Firmware run completed");
            Ok(())
        }
        Command_::Attach => run_probe_rs_attach(FIRMWARE_PACKAGE),
        Command_::Test => {
            println!("Running host tests...");
            run_cargo(&["test"], CORE_PACKAGE, false)?;
            println!("✓ Tests passed");
            Ok(())
        }
        Command_::Help => {
            print_usage();
            Ok(())
        }
    }
}

fn build(target: BuildTarget) -> Result<(), String> {
    if target != BuildTarget::Firmware {
        println!("Building {}...", CORE_PACKAGE);
        run_cargo(&["build", "--release"], CORE_PACKAGE, false)?;
        println!("✓ {} built successfully", CORE_PACKAGE);
    }
    if target != BuildTarget::Core {
        println!("Building firmware...");
        run_cargo(&["build", "--release"], FIRMWARE_PACKAGE, true)?;
        generate_bin(FIRMWARE_PACKAGE)?;
        println!("✓ Firmware built successfully");
    }
    Ok(())
}

/// Runs a cargo subcommand for one package, cross compiling for the RP2040 when `cross` is set.
fn run_cargo(subcommand: &[&str], package: &str, cross: bool) -> Result<(), String> {
    let mut cmd = Command::new("cargo");
    cmd.args(subcommand).args(["--package", package]);
    if cross {
        cmd.args(["--target", FIRMWARE_TARGET]);
    }

    let status = cmd
        .status()
        .map_err(|e| format!("Failed to run cargo {}: {}", subcommand[0], e))?;

    if !status.success() {
        return Err(format!("cargo {} failed for {}", subcommand[0], package));
    }

    Ok(())
}

fn elf_path(package: &str) -> PathBuf {
    PathBuf::from(format!("target/{}/release/{}", FIRMWARE_TARGET, package))
}

fn generate_bin(package: &str) -> Result<(), String> {
    let elf_path = elf_path(package);
    let bin_path = elf_path.with_extension("bin");

    if !elf_path.exists() {
        return Err(format!("ELF binary not found at {}", elf_path.display()));
    }

    println!("Generating .bin file for {}...", package);

    let output = Command::new("arm-none-eabi-objcopy")
        .arg("-O")
        .arg("binary")
        .arg(&elf_path)
        .arg(&bin_path)
        .output()
        .map_err(|e| {
            format!(
                "Failed to run arm-none-eabi-objcopy: {}. Make sure arm-none-eabi-objcopy is installed.",
                e
            )
        })?;

    if !output.status.success() {
        return Err(format!(
            "Failed to generate .bin file for {}:\n{}",
            package,
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    println!("✓ Generated {}", bin_path.display());
    Ok(())
}

fn run_probe_rs_attach(package: &str) -> Result<(), String> {
    let elf_path = elf_path(package);

    if !elf_path.exists() {
        return Err(format!(
            "ELF binary not found at {}. Build the project first using 'cargo xtask build'.",
            elf_path.display()
        ));
    }

    let status = Command::new("probe-rs")
        .args(["attach", "--chip", "RP2040"])
        .arg(&elf_path)
        .status()
        .map_err(|e| format!("Failed to run probe-rs attach: {}", e))?;

    if !status.success() {
        return Err(format!("Attach failed for {}", package));
    }

    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: cargo xtask <COMMAND> [TARGET]\n\
         \n\
         Commands:\n\
         \tbuild       Build the specified target or all (generates the firmware .bin file)\n\
         \tflash       Build and flash the firmware\n\
         \trun         Build and run the firmware with probe-rs, streaming defmt logs\n\
         \tattach      Attach to the running firmware with probe-rs\n\
         \ttest        Run the vpd-core host tests\n\
         \thelp        Show this help message\n\
         \n\
         Targets:\n\
         \tfirmware    RP2040 firmware ({FIRMWARE_TARGET})\n\
         \tcore        vpd-core library for the host\n\
         \tall         Both (default)\n\
         \n\
         Examples:\n\
         \tcargo xtask build              # Build everything\n\
         \tcargo xtask build firmware     # Build firmware only with .bin generation\n\
         \tcargo xtask flash              # Flash firmware\n\
         \tcargo xtask test               # Run host tests"
    );
}
