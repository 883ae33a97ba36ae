//! Writes the incubator monitor OpenAPI document.
//!
//!   cargo run --bin generate_openapi                  # to stdout
//!   cargo run --bin generate_openapi -- --output openapi.json

use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use incubator_monitor::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("failed to serialise OpenAPI document")?;

    let mut args = env::args().skip(1);
    let mut output: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        if arg == "--output" {
            let path = args.next().context("--output needs a path")?;
            output = Some(PathBuf::from(path));
        }
    }

    match output {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("OpenAPI document written to {}", path.display());
        }
        None => io::stdout()
            .write_all(json.as_bytes())
            .context("failed to write to stdout")?,
    }
    Ok(())
}
