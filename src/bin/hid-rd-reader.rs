// SPDX-License-Identifier: MIT

//! Print a binary HID Report Descriptor in human-readable form.
//!
//! The descriptor is read from the given file or, without a file, from
//! standard input.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use hidrp::DescriptorView;

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    /// Path to the binary report descriptor, e.g.
    /// /sys/class/hidraw/hidraw0/device/report_descriptor
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,
}

fn read_descriptor(path: Option<&PathBuf>) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match path {
        Some(path) => {
            bytes = std::fs::read(path)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut bytes)?;
        }
    }
    Ok(bytes)
}

fn main() -> ExitCode {
    env_logger::init();

    let Args { path } = clap::Parser::parse();

    let bytes = match read_descriptor(path.as_ref()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("read failed: {e}");
            match path {
                Some(path) => eprintln!("Error: Cannot open file {}", path.display()),
                None => eprintln!("Error: Cannot read standard input"),
            }
            return ExitCode::FAILURE;
        }
    };
    log::debug!("read {} bytes", bytes.len());

    print!("{}", DescriptorView::new(&bytes));
    ExitCode::SUCCESS
}
