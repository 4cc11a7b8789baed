//! Call command handler

use super::utils::split_pair;
use crate::cli::{CallArgs, CallMode};
use crate::config::Config;
use crate::error::{Error, ErrorContext, Result};
use crate::interceptor::ConfigInterceptor;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use netkit_core::delivery::run_blocking;
use netkit_core::{
    call_async, call_boolean_async, ApiResult, Method, NetworkClient, NetworkClientBuilder,
    Request,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Handle the call command
///
/// The client is built on the calling thread; only the call itself runs on
/// a Tokio runtime so that `--timeout` can abandon it.
#[instrument(skip_all, fields(method = %args.method, target = %args.target))]
pub fn handle_call(args: CallArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("call_command", &format!("{} {}", args.method, args.target));

    let client = Arc::new(client_builder(config, args.offline).build()?);
    let request = build_request(&client, &args)?;
    let timeout = args.timeout.map(Duration::from_secs);
    info!(url = %request.url().path(), mode = ?args.mode, "Dispatching call");

    let spinner = output.spinner(&format!("{} {}", request.method(), request.url()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(dispatch(client.clone(), request, args.mode, timeout));
    // An abandoned call must not hold the process open
    runtime.shutdown_background();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    debug!(success = result.is_success(), elapsed_ms = timer.elapsed().as_millis() as u64, "Call finished");
    timer.finish();

    output.api_result(&result)?;
    result.into_result().map(|_| ()).map_err(Error::from)
}

/// Client builder carrying the configured parameters and interceptor
pub fn client_builder(config: &Config, offline: bool) -> NetworkClientBuilder {
    NetworkClient::builder()
        .params(config.network.clone())
        .interceptor(ConfigInterceptor::from_config(config).with_offline(offline))
}

/// Translate the call arguments into a pipeline request
pub fn build_request(client: &NetworkClient, args: &CallArgs) -> Result<Request> {
    let method: Method = args.method.parse()?;
    let mut request = client
        .request(method, &args.target)?
        .with_capabilities(args.capabilities());

    for header in &args.headers {
        let (name, value) = split_pair(header, ':')?;
        request = request.with_header(name, value);
    }
    for pair in &args.query {
        let (name, value) = split_pair(pair, '=')?;
        request = request.with_query(&name, &value);
    }

    if let Some(json) = &args.json {
        let body: Value = serde_json::from_str(json)
            .with_context(|| format!("Invalid --json body for {}", args.target))?;
        request = request.with_json_body(&body);
    } else if !args.form.is_empty() {
        let fields = args
            .form
            .iter()
            .map(|field| split_pair(field, '='))
            .collect::<Result<Vec<_>>>()?;
        request = request.with_form_body(fields);
    }

    if args.allow_stale {
        request = request.allow_stale_cache();
    }

    Ok(request)
}

/// Run the request in the selected mode, widening every payload to JSON
async fn dispatch(
    client: Arc<NetworkClient>,
    request: Request,
    mode: CallMode,
    timeout: Option<Duration>,
) -> ApiResult<Value> {
    match mode {
        CallMode::Envelope => call_async(client, request, timeout).await,
        CallMode::Boolean => call_boolean_async(client, request, timeout)
            .await
            .map(Value::Bool),
        CallMode::Raw => {
            run_blocking(client, timeout, move |client| client.call_raw(request)).await
        }
    }
}
