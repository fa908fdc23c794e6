//! Fragment encoding and decoding against a schema file.

use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context as _, Result};
use hs_fragments::{
    FieldSpec, FragmentSchema, Fragments, Location, ManualTimer, MemoryLocation, SetOutcome,
};
use serde::Deserialize;

use super::{FragmentArgs, FragmentCommand};
use crate::context::Context;

/// Schema file layout:
///
/// ```toml
/// [[field]]
/// key = "sortBy"
/// default = "popularity"
///
/// [[field]]
/// key = "text"
/// default = ""
/// debounce = true
/// ```
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default, rename = "field")]
    fields: Vec<FieldSpec>,
}

fn parse_schema(content: &str, json: bool) -> Result<FragmentSchema> {
    let file: SchemaFile = if json {
        serde_json::from_str(content).context("Failed to parse JSON schema")?
    } else {
        toml::from_str(content).context("Failed to parse TOML schema")?
    };
    Ok(FragmentSchema::new(file.fields)?)
}

fn load_schema(path: &Path) -> Result<FragmentSchema> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
    let json = path.extension().map_or(false, |ext| ext == "json");
    parse_schema(&content, json).with_context(|| format!("Invalid schema: {}", path.display()))
}

type CliFragments = Fragments<Rc<MemoryLocation>, ManualTimer>;

fn mount(schema: FragmentSchema, url: &str, ctx: &Context) -> (CliFragments, Rc<MemoryLocation>) {
    let location = Rc::new(MemoryLocation::new(url));
    let fragments = Fragments::mount(
        schema,
        Rc::clone(&location),
        ManualTimer::new(),
        &ctx.config.fragments,
    );
    (fragments, location)
}

/// Run the fragment command.
pub fn run(args: FragmentArgs, ctx: &Context) -> Result<()> {
    match args.command {
        FragmentCommand::Encode { schema, url, values } => encode(&schema, &url, &values, ctx),
        FragmentCommand::Decode { schema, input } => decode(&schema, &input, ctx),
    }
}

fn encode(schema_path: &str, url: &str, values: &[String], ctx: &Context) -> Result<()> {
    let schema = load_schema(&ctx.resolve_path(schema_path))?;

    let mut parsed = Vec::with_capacity(values.len());
    for pair in values {
        let Some((key, plain)) = pair.split_once('=') else {
            bail!("Invalid value '{}': expected KEY=VALUE", pair);
        };
        parsed.push((key.to_string(), schema.parse_value(key, plain)?));
    }

    let (fragments, location) = mount(schema, url, ctx);
    for (key, value) in parsed {
        if let SetOutcome::Ignored(reason) = fragments.set(&key, value) {
            ctx.output.warn(&format!("Ignored '{}': {}", key, reason));
        }
    }
    fragments.flush();

    let href = location.href();
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "url": href,
            "hash": location.hash(),
            "writes": location.writes(),
        }));
    } else {
        println!("{}", href);
    }
    Ok(())
}

fn decode(schema_path: &str, input: &str, ctx: &Context) -> Result<()> {
    let schema = load_schema(&ctx.resolve_path(schema_path))?;

    // A bare `key=value&...` string is read as a fragment.
    let url = if input.contains('#') {
        input.to_string()
    } else {
        format!("#{}", input)
    };
    let (fragments, _) = mount(schema, &url, ctx);
    let props = fragments.props();

    if ctx.output.is_json() {
        ctx.output.json(&props);
        return Ok(());
    }

    ctx.output.header("Fragment state");
    for prop in &props {
        let value = serde_json::to_string(&prop.value)?;
        let marker = if prop.custom.is_some() { "" } else { " (default)" };
        ctx.output.kv(&prop.key, &format!("{}{}", value, marker));
    }
    Ok(())
}
