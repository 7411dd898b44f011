//! Templates command: list the built-in layer templates.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use mapstyle_catalog::builtin_templates;

/// Execute the templates command
pub fn execute(json: bool) -> Result<()> {
    let registry = builtin_templates();

    if json {
        let by_name: BTreeMap<&str, _> = registry.iter().map(|t| (t.id.as_str(), t)).collect();
        let text = serde_json::to_string_pretty(&by_name).context("Failed to serialize templates")?;
        println!("{}", text);
        return Ok(());
    }

    let width = registry.names().map(str::len).max().unwrap_or(0);
    for template in registry.iter() {
        let source = template.source_layer.as_deref().unwrap_or("-");
        println!(
            "{:width$}  {:14}  {:18}  {}",
            template.id,
            template.drawing_primitive.as_str(),
            source,
            template.description,
            width = width
        );
    }
    Ok(())
}
