//! NutriScan
//!
//! Scan a product barcode from a still image (or take a manually entered
//! code), look the product up, and print its nutrition facts.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use nutriscan::build_info;
use nutriscan::decode::{self, DecodeError};
use nutriscan::display;
use nutriscan::models::{PixelBuffer, UnitMode};
use nutriscan::nutrition;
use nutriscan::repository::{OpenFoodFactsClient, ProductRepository, DEFAULT_API_BASE};

const USAGE: &str = "usage: nutriscan <image-file | barcode> [--per-serving] [--no-fetch]";

struct CliArgs {
    input: String,
    unit: UnitMode,
    fetch: bool,
}

fn parse_args() -> Option<CliArgs> {
    let mut input = None;
    let mut unit = UnitMode::Per100g;
    let mut fetch = true;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--per-serving" => unit = UnitMode::PerServing,
            "--no-fetch" => fetch = false,
            _ if arg.starts_with("--") => return None,
            _ => {
                if input.replace(arg).is_some() {
                    return None;
                }
            }
        }
    }
    Some(CliArgs {
        input: input?,
        unit,
        fetch,
    })
}

/// Get the product API base URL from environment or use default
fn api_base() -> String {
    std::env::var("NUTRISCAN_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging to stderr so stdout stays clean for the table
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutriscan=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    // An existing file is an image to scan; anything else is treated as a
    // manually entered barcode.
    let code = if Path::new(&args.input).is_file() {
        let img = image::open(&args.input)?;
        let buffer = PixelBuffer::from_image(&img);
        match decode::decode(&buffer) {
            Ok(symbol) => {
                println!("Decoded {} symbol: {}", symbol.format.as_str(), symbol.text);
                symbol.text
            }
            Err(e @ DecodeError::InvalidBuffer { .. }) => return Err(e.into()),
            Err(e) => {
                eprintln!("Scan failed: {e}. Try another image.");
                std::process::exit(1);
            }
        }
    } else {
        args.input.clone()
    };

    if !args.fetch {
        println!("{code}");
        return Ok(());
    }

    let client = OpenFoodFactsClient::with_base_url(api_base())?;
    match client.fetch_product(&code)? {
        Some(raw) => {
            let product = nutrition::normalize(&raw, args.unit);
            print!("{}", display::render_table(&product));
        }
        None => println!("No product found for code {code}"),
    }

    Ok(())
}
