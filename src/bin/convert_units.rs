//! Convert a quantity between units using the configured conversion table
//! Usage: cargo run --bin convert_units -- <quantity> <from_unit> <to_unit>

use std::process::ExitCode;
use std::str::FromStr;

use rust_decimal::Decimal;

use pantry::config::Config;
use pantry::units;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [quantity, from_unit, to_unit] = args.as_slice() else {
        eprintln!("Usage: convert_units <quantity> <from_unit> <to_unit>");
        eprintln!("Example: convert_units 2 latas ml");
        return Ok(ExitCode::from(2));
    };

    let quantity = Decimal::from_str(quantity)
        .map_err(|e| format!("Invalid quantity '{}': {}", quantity, e))?;

    let config = Config::from_env();
    let graph = config.conversion_graph()?;

    match units::convert(quantity, from_unit, to_unit, &graph) {
        Ok(converted) => {
            println!("{} {} = {}", quantity, units::normalize_unit(from_unit), converted);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
