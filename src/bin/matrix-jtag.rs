use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use matrix_jtag::board::{PinMap, Variant};
use matrix_jtag::cable::cdev;
use matrix_jtag::chain::Chain;
use matrix_jtag::statemachine::JtagSM;

/// JTAG over the MATRIX Creator's GPIO header
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Pin set: original, fast, slow, or an explicit tms,tck,tdi,tdo list
    #[arg(long, env = "MATRIX_JTAG_PINS", default_value = "fast")]
    pins: PinMap,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the pin assignment
    Pins {
        /// List every known board variant instead
        #[arg(long)]
        all: bool,
    },
    /// List the devices on the scan chain
    Scan {
        /// TCK frequency
        #[arg(long, default_value_t = 1000)]
        freq_khz: u32,
        /// GPIO chip carrying the header (gpiochip4 on a Raspberry Pi 5 with older kernels)
        #[arg(long, default_value = cdev::DEFAULT_CHIP)]
        chip: PathBuf,
    },
}

fn scan(pins: &PinMap, freq_khz: u32, chip: PathBuf) -> matrix_jtag::Result<()> {
    let cable = cdev::open(chip, pins, freq_khz)?;
    let mut jtag = JtagSM::new(cable)?;
    let chain = Chain::detect(&mut jtag)?;

    if chain.is_empty() {
        println!("no devices found");
    }
    for (i, device) in chain.devices.iter().enumerate() {
        match device.idcode {
            Some(id) => println!(
                "{}: idcode {} (manufacturer 0x{:03x}, part 0x{:04x}, version {}) irlen {}",
                i,
                id,
                id.manufacturer(),
                id.part(),
                id.version(),
                device.irlen
            ),
            None => println!("{}: no idcode, irlen {}", i, device.irlen),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let result = match args.command {
        Command::Pins { all: false } => {
            println!("{}", args.pins);
            Ok(())
        }
        Command::Pins { all: true } => {
            for variant in Variant::ALL {
                println!("{:<8} {}", variant, variant.pins());
            }
            Ok(())
        }
        Command::Scan { freq_khz, chip } => scan(&args.pins, freq_khz, chip),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
