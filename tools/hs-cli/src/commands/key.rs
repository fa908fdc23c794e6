//! Cache key inspection.

use anyhow::Result;
use serde::Serialize;

use super::KeyArgs;
use crate::context::Context;

#[derive(Serialize)]
struct KeyReport {
    key: String,
    url: String,
}

/// Run the key command.
pub fn run(args: KeyArgs, ctx: &Context) -> Result<()> {
    let endpoint = args.request.endpoint();
    let params = args.request.params()?;

    let base = &ctx.config.analytics_base;
    let report = KeyReport {
        key: hs_cache::gen_cache_key(&endpoint.resolve(base), &params).to_string(),
        url: endpoint.url(base, &params),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
    } else {
        ctx.output.kv("key", &report.key);
        ctx.output.kv("url", &report.url);
    }
    Ok(())
}
