//! Upload a single JPEG file to the projector.
//!
//! Run with: `picoproj-showpic picture.jpg`

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use picoproj::usb::{DeviceId, Endpoint, Interface, UsbBus, DEFAULT_TRANSFER_TIMEOUT};
use picoproj::widget::PictureWidget;
use picoproj::ACER_C110;

#[derive(Parser)]
#[command(name = "picoproj-showpic")]
#[command(about = "Upload one JPEG picture to a USB pico projector")]
struct Args {
    /// JPEG file to display.
    picture: PathBuf,

    /// Override the vendor id, hex (requires --product).
    #[arg(long, value_parser = parse_hex_u16, requires = "product")]
    vendor: Option<u16>,

    /// Override the product id, hex (requires --vendor).
    #[arg(long, value_parser = parse_hex_u16, requires = "vendor")]
    product: Option<u16>,

    /// Dump the matched device's descriptor tree before uploading.
    #[arg(long)]
    verbose: bool,
}

fn parse_hex_u16(value: &str) -> Result<u16, String> {
    let digits = value.trim_start_matches("0x");
    u16::from_str_radix(digits, 16).map_err(|err| err.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let id = match (args.vendor, args.product) {
        (Some(vendor), Some(product)) => DeviceId::new(vendor, product),
        _ => ACER_C110,
    };

    let payload = fs::read(&args.picture)?;

    let bus = UsbBus::new()?;
    let matches = bus.match_ids(&[id]);
    let device = matches
        .first()
        .ok_or_else(|| format!("no device matching {id} attached"))?;

    if args.verbose {
        println!("{device}");
        for configuration in device.configurations() {
            println!("  {configuration}");
            for interface in configuration.interfaces() {
                println!("    {interface}");
                for alt_setting in interface.alt_settings() {
                    println!("      {alt_setting}");
                    for endpoint in alt_setting.endpoints() {
                        println!("        {endpoint}");
                    }
                }
            }
        }
    }

    let configuration = device
        .configurations()
        .first()
        .ok_or("device has no configurations")?;
    let interface = configuration
        .interfaces()
        .first()
        .ok_or("configuration has no interfaces")?;

    interface.claim()?;
    let result = upload(interface, &payload);
    let _ = interface.release();
    result?;

    println!("Uploaded {} ({} bytes)", args.picture.display(), payload.len());
    Ok(())
}

fn upload(interface: &Interface, payload: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let alt_setting = interface
        .alt_settings()
        .first()
        .ok_or("interface has no alt settings")?;
    // Same endpoint choice as the streaming pipeline: the device listens on
    // the second declared endpoint.
    let endpoint: &Endpoint = alt_setting
        .endpoints()
        .get(1)
        .ok_or("first alt setting declares fewer than two endpoints")?;

    let header = PictureWidget::new(payload.len())?;
    write_exact(endpoint, header.as_bytes())?;
    write_exact(endpoint, payload)?;
    Ok(())
}

fn write_exact(endpoint: &Endpoint, data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let written = endpoint.bulk_write(data, DEFAULT_TRANSFER_TIMEOUT)?;
    if written != data.len() {
        return Err(format!("short write: sent {written} of {} bytes", data.len()).into());
    }
    Ok(())
}
