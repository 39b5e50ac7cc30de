use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use hidmap::config::{layout::Layout, sample::SamplePair};
use hidmap::mapping::validator::ValidationResult;
use schemars::{schema::RootSchema, schema_for};

const SCHEMA_DIR: &str = "./schema";

fn write_schema(name: &str, schema: RootSchema) -> Result<(), Box<dyn Error>> {
    let path = Path::new(SCHEMA_DIR).join(name);
    let mut file = File::create(&path)?;
    write!(file, "{}", serde_json::to_string_pretty(&schema)?)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(SCHEMA_DIR)?;
    write_schema("mapping.json", schema_for!(Layout))?;
    write_schema("samples.json", schema_for!(Vec<SamplePair>))?;
    write_schema("validation.json", schema_for!(ValidationResult))?;
    Ok(())
}
