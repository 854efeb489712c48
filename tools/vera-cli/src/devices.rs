//! Devices command - list audio output devices

use anyhow::{Context, Result};
use clap::Args;
use vera_audio_core::{AudioBackend, CpalBackend, DeviceInfo};

/// Arguments for the devices command
#[derive(Args)]
pub struct DevicesArgs {
    /// Print names only, one per line (for scripts)
    #[arg(long)]
    pub plain: bool,
}

/// Execute the devices command
pub fn execute(args: DevicesArgs) -> Result<()> {
    let devices = CpalBackend::new()
        .list_devices()
        .context("Failed to enumerate audio devices")?;

    if args.plain {
        for device in &devices {
            println!("{}", device.name);
        }
    } else {
        print_devices(&devices);
    }
    Ok(())
}

/// Print the device list the way `vera play` does after a failed open
pub fn print_devices(devices: &[DeviceInfo]) {
    if devices.is_empty() {
        println!("No sound output devices are available.");
        return;
    }
    println!("The following sound output devices are available:");
    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("\t{}{}", device.name, marker);
    }
}

/// Same as [`print_devices`], for names carried by an error
pub fn print_device_names(names: &[String]) {
    let devices: Vec<DeviceInfo> = names
        .iter()
        .map(|name| DeviceInfo {
            name: name.clone(),
            is_default: false,
        })
        .collect();
    print_devices(&devices);
}
