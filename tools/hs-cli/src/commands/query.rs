//! Fetch a query through the request cache.

use std::rc::Rc;

use anyhow::{anyhow, Context as _, Result};
use hs_cache::{DataInjector, LoadStatus, QueryOutcome, RequestCache};
use hs_data::{DefaultSleep, HttpTransport, RetryPolicy};
use hs_observability::{MetricsCollector, QueryMetrics};
use serde::Serialize;
use serde_json::Value;

use super::QueryArgs;
use crate::context::Context;
use crate::output::{format_millis, status_badge};

#[derive(Serialize)]
struct QueryReport<'a> {
    status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    metrics: &'a [QueryMetrics],
}

/// Run the query command.
pub async fn run(args: QueryArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(origin) = args.origin {
        config.origin = Some(origin);
    }
    if let Some(retries) = args.retries {
        config.retry.max_retries = retries;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.retry.delay_ms = delay_ms;
    }
    config.validate().context("Invalid configuration")?;

    let endpoint = args.request.endpoint();
    let params = args.request.params()?;

    let mut transport = HttpTransport::new().context("Failed to create HTTP client")?;
    if let Some(origin) = &config.origin {
        transport = transport.with_origin(origin.clone());
    }

    let cache = Rc::new(RequestCache::with_config(transport, &config));
    let metrics = Rc::new(MetricsCollector::new());
    let injector = DataInjector::new(Rc::clone(&cache), DefaultSleep::default())
        .with_policy(RetryPolicy::from_config(&config.retry))
        .with_metrics(Rc::clone(&metrics));

    ctx.output.debug(&format!("GET {}", cache.url_for(&endpoint, &params)));

    let spinner = ctx.output.spinner(&format!("Loading {}", endpoint));
    let mut retries = 0u32;
    let outcome = injector
        .load_with(&endpoint, &params, |status| {
            retries += 1;
            spinner.set_message(format!(
                "{} is {}, retry {}/{} in {}",
                endpoint,
                status,
                retries,
                config.retry.max_retries,
                format_millis(config.retry.delay_ms)
            ));
        })
        .await;
    spinner.finish_and_clear();

    let status = outcome.status();
    let recorded = metrics.queries();

    if ctx.output.is_json() {
        ctx.output.json(&QueryReport {
            status,
            data: if args.status_only { None } else { outcome.value() },
            metrics: &recorded,
        });
    } else {
        ctx.output.kv("status", &status_badge(status));
        if let Some(query) = recorded.last() {
            ctx.output.kv("attempts", &query.attempts.to_string());
        }
        if let (Some(value), false) = (outcome.value(), args.status_only) {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }

    match outcome {
        QueryOutcome::Ready(_) => Ok(()),
        QueryOutcome::Timeout => Err(anyhow!(
            "{} was still processing after {} retries",
            endpoint,
            config.retry.max_retries
        )),
        QueryOutcome::Error(err) => Err(err).with_context(|| format!("Failed to load {}", endpoint)),
    }
}
