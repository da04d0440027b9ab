//! # BaSyx CLI
//!
//! Command-line access to identifier encoding, idShort path resolution,
//! cursor pagination and registry redirects.

use anyhow::{bail, Context, Result};
use basyx_client::{decode_id_base64url, encode_id_base64url, BasyxClient};
use basyx_core::{path::resolve_required, ElementNode, PageRequest, PagedResult};
use basyx_registry::{EndpointResolver, Redirector};
use serde_json::Value;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod config;

use config::CliConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    tracing::debug!(command = %args[1], "Running command");

    match args[1].as_str() {
        "encode" => {
            let id = required(&args, 2, "encode <identifier>");
            println!("{}", encode_id_base64url(id));
        }
        "decode" => {
            let encoded = required(&args, 2, "decode <encoded>");
            let decoded = decode_id_base64url(encoded).context("Failed to decode")?;
            println!("{decoded}");
        }
        "resolve-path" => {
            let file = required(&args, 2, "resolve-path <submodel.json> <idShortPath>");
            let path = required(&args, 3, "resolve-path <submodel.json> <idShortPath>");
            let value = resolve_path_in_file(Path::new(file), path)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        "page" => {
            let file = required(&args, 2, "page <items.json> <limit> [cursor]");
            let limit = required(&args, 3, "page <items.json> <limit> [cursor]");
            let limit: i32 = limit.parse().context("Limit must be an integer")?;
            let cursor = args.get(4).map(String::as_str);
            let page = page_file(Path::new(file), limit, cursor)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        "probe" => {
            let host = required(&args, 2, "probe <host>");
            let config = CliConfig::from_env()?;
            let probe = config.probe.build();
            if probe
                .is_reachable(host, Some(config.resolver.probe_timeout))
                .await
            {
                println!("{host} is reachable");
            } else {
                println!("{host} is not reachable");
                std::process::exit(2);
            }
        }
        "redirect" => {
            let usage = "redirect <aas-id> <to-what> [submodel-id]";
            let aas_id = required(&args, 2, usage);
            let to_what = required(&args, 3, usage);
            let config = CliConfig::from_env()?;

            let client =
                BasyxClient::new(config.registry.clone()).context("Failed to create registry client")?;
            tracing::debug!(registry = client.base_url(), "Using registry");
            let resolver = EndpointResolver::new(config.probe.build(), config.resolver.clone());
            let redirector = Redirector::new(client, resolver);

            let target = match args.get(4) {
                Some(submodel_id) => {
                    redirector
                        .redirect_submodel(aas_id, submodel_id, to_what)
                        .await
                }
                None => redirector.redirect(aas_id, to_what).await,
            }
            .with_context(|| format!("Failed to redirect shell {aas_id}"))?;
            println!("{target}");
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn required<'a>(args: &'a [String], index: usize, usage: &str) -> &'a str {
    if let Some(arg) = args.get(index) {
        arg
    } else {
        eprintln!("Usage: basyx {usage}");
        std::process::exit(1);
    }
}

fn load_json(file: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", file.display()))
}

/// Resolve `path` in the submodel stored in `file` and render its value.
fn resolve_path_in_file(file: &Path, path: &str) -> Result<Value> {
    let root = ElementNode::from_json(&load_json(file)?).context("Invalid submodel")?;
    let node = resolve_required(&root, path)?;
    Ok(node.to_value_json()?)
}

/// Page through a JSON array of objects keyed by their `id` field.
fn page_file(file: &Path, limit: i32, cursor: Option<&str>) -> Result<PagedResult<Value>> {
    let Value::Array(items) = load_json(file)? else {
        bail!("{} must contain a JSON array", file.display());
    };

    let keyed = items
        .iter()
        .map(|item| {
            item.get("id")
                .and_then(Value::as_str)
                .map(|id| (id, item))
                .context("Every item needs a string `id`")
        })
        .collect::<Result<Vec<_>>>()?;

    let request = PageRequest::new(limit, cursor)?;
    Ok(request.apply(keyed))
}

fn print_help() {
    println!(
        r#"BaSyx CLI

USAGE:
    basyx <COMMAND> [OPTIONS]

COMMANDS:
    encode <id>                               Encode an identifier to base64url (no padding)
    decode <encoded>                          Decode a base64url-encoded identifier
    resolve-path <submodel.json> <path>       Print the value at an idShort path
    page <items.json> <limit> [cursor]        Print one page of an id-keyed JSON array
    probe <host>                              Check whether a host is reachable
    redirect <aas-id> <to-what> [submodel-id] Print the redirect target for a registered shell
    help                                      Show this help message

ENVIRONMENT:
    BASYX_REGISTRY_URL, BASYX_BEARER_TOKEN, BASYX_PROBE (ping | tcp:<port>),
    BASYX_PROBE_TIMEOUT_MS, BASYX_ROOT_PATH_TOKEN, RUST_LOG

EXAMPLES:
    basyx resolve-path nameplate.json "ContactInformation.Phone[0]"
    basyx page shells.json 2 urn:example:aas:2
    basyx redirect "urn:example:aas:asset1" submodels
"#
    );
}
