//! Print the JSON Schema of the configuration file.
//!
//! Run with `cargo run --features dev-bins --bin generate_schema > config-schema.json`

use jellypie::config::Config;

fn main() {
    let schema = schemars::schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize schema: {e}");
            std::process::exit(1);
        }
    }
}
