//! Attributes command: inspect the built-in attribute catalog.

use anyhow::{Result, bail};

use mapstyle_catalog::{AttributeDomain, Geometry, SourceLayerSchema, streets_v8};
use mapstyle_core::similarity::closest_names;

/// Execute the attributes command
pub fn execute(source_layer: Option<&str>) -> Result<()> {
    let catalog = streets_v8();

    let Some(name) = source_layer else {
        println!("{}", catalog.id);
        for (name, schema) in catalog.source_layers() {
            println!("  {:20} {:8} {}", name, geometry_name(schema.geometry), schema.description);
        }
        return Ok(());
    };

    match catalog.source_layer(name) {
        Some(schema) => {
            print_schema(name, schema);
            Ok(())
        }
        None => {
            let suggestions = closest_names(name, catalog.source_layer_names());
            if suggestions.is_empty() {
                bail!("Unknown source layer '{}'", name);
            }
            bail!(
                "Unknown source layer '{}' (did you mean: {}?)",
                name,
                suggestions.join(", ")
            );
        }
    }
}

fn print_schema(name: &str, schema: &SourceLayerSchema) {
    let extrudable = if schema.extrudable { ", extrudable" } else { "" };
    println!("{} ({}{})", name, geometry_name(schema.geometry), extrudable);
    if !schema.description.is_empty() {
        println!("  {}", schema.description);
    }
    for (attribute, spec) in &schema.attributes {
        let domain = match &spec.domain {
            AttributeDomain::Enumerated(values) => values.join(" | "),
            AttributeDomain::Range { min, max } => format!("{} ..= {}", min, max),
            AttributeDomain::FreeText => "<text>".to_string(),
        };
        println!("  {:16} {}", attribute, domain);
    }
}

fn geometry_name(geometry: Geometry) -> &'static str {
    match geometry {
        Geometry::Point => "point",
        Geometry::Line => "line",
        Geometry::Polygon => "polygon",
    }
}
