//! Build command implementation.
//!
//! Reads a build request (JSON) from a file or stdin, runs it through the
//! built-in engine and writes `{document, corrections}` as JSON.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use mapstyle_core::{BuildRequest, CorrectionKind, EngineConfig, StyleEngine};

/// Arguments for the build command
#[derive(Debug)]
pub struct BuildArgs {
    /// Request file; stdin when `None` or `-`
    pub file: Option<String>,
    /// TOML engine configuration
    pub config: Option<String>,
    /// Output file; stdout when `None`
    pub output: Option<String>,
    pub compact: bool,
    pub document_only: bool,
}

/// Execute the build command
pub fn execute(args: BuildArgs) -> Result<()> {
    let input = read_input(args.file.as_deref())?;
    let request: BuildRequest =
        serde_json::from_str(&input).context("Failed to parse build request")?;

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            EngineConfig::from_toml_str(&text)
                .with_context(|| format!("Invalid engine config: {}", path))?
        }
        None => EngineConfig::default(),
    };
    debug!(?config, "Engine configuration");

    let output = StyleEngine::builtin()
        .with_config(config)
        .build(&request)
        .context("Style build failed")?;

    let warnings = output.corrections.count(CorrectionKind::Warning);
    if warnings > 0 {
        warn!(warnings, "Build finished with warnings");
    }

    let json = match (args.document_only, args.compact) {
        (true, true) => serde_json::to_string(&output.document),
        (true, false) => serde_json::to_string_pretty(&output.document),
        (false, true) => serde_json::to_string(&output),
        (false, false) => serde_json::to_string_pretty(&output),
    }
    .context("Failed to serialize style")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write output file: {}", path))?;
            info!(path = %path, "Wrote style");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn read_input(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) if path != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path)),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            Ok(buffer)
        }
    }
}
