use anyhow::Context;
use brrtdispatch::context::BasicContextFactory;
use brrtdispatch::factory::new_handle_mapper;
use brrtdispatch::logging::init_logging;
use brrtdispatch::mapper::HandleMapper;
use brrtdispatch::runtime_config::{RuntimeConfig, ServiceConfig};
use brrtdispatch::server::{DispatchService, HttpServer};
use brrtdispatch::validator::ValidationMode;
use brrtdispatch::{EndpointRegistration, HandlerResponse, ParameterMeta};
use clap::Parser;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

/// Serve a small item API through brrtdispatch.
#[derive(Parser)]
#[command(name = "brrtdispatch-demo", version, about = "brrtdispatch item API demo")]
struct Cli {
    /// Address to listen on (overrides the config file)
    #[arg(long, env = "BRRTR_ADDR")]
    addr: Option<String>,

    /// YAML service configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// strict or lenient (overrides config file and environment)
    #[arg(long)]
    validation_mode: Option<ValidationMode>,

    /// Log the routing table at startup
    #[arg(long, default_value_t = false)]
    dump_routes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Item {
    id: i64,
    name: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Default)]
struct ItemStore {
    next_id: AtomicI64,
    items: RwLock<BTreeMap<i64, Item>>,
}

impl ItemStore {
    fn insert(&self, name: String, tags: Vec<String>) -> anyhow::Result<Item> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let item = Item { id, name, tags };
        self.items
            .write()
            .map_err(|_| anyhow::anyhow!("item store lock poisoned"))?
            .insert(id, item.clone());
        Ok(item)
    }
}

fn register_items(mapper: &mut impl HandleMapper, store: &Arc<ItemStore>) -> anyhow::Result<()> {
    let s = Arc::clone(store);
    mapper.put_handler(
        EndpointRegistration::new(Method::GET, "/items", move |_, req| {
            let limit = req.param_as::<usize>("limit")?.unwrap_or(usize::MAX);
            let tag = req.param_as::<String>("tag")?;
            let items = s
                .items
                .read()
                .map_err(|_| anyhow::anyhow!("item store lock poisoned"))?;
            let listed: Vec<&Item> = items
                .values()
                .filter(|i| tag.as_ref().map_or(true, |t| i.tags.contains(t)))
                .take(limit)
                .collect();
            Ok(HandlerResponse::ok(&listed)?.boxed())
        })
        .operation("list_items")
        .parameter(ParameterMeta::query("limit").schema(json!({"type": "integer", "minimum": 1})))
        .parameter(ParameterMeta::query("tag").schema(json!({"type": "string"}))),
    )?;

    let s = Arc::clone(store);
    mapper.put_handler(
        EndpointRegistration::new(Method::GET, "/items/{id}", move |_, req| {
            let id: i64 = req
                .param_as("id")?
                .context("id is bound for every matched route")?;
            let items = s
                .items
                .read()
                .map_err(|_| anyhow::anyhow!("item store lock poisoned"))?;
            Ok(match items.get(&id) {
                Some(item) => HandlerResponse::ok(item)?.boxed(),
                None => HandlerResponse::error(404, "item not found").boxed(),
            })
        })
        .operation("get_item")
        .parameter(ParameterMeta::path("id").schema(json!({"type": "integer"}))),
    )?;

    let s = Arc::clone(store);
    mapper.put_handler(
        EndpointRegistration::new(Method::POST, "/items", move |_, req| {
            let name: String = req.param_as("name")?.unwrap_or_default();
            let tags: Vec<String> = req.param_as("tags")?.unwrap_or_default();
            let item = s.insert(name, tags)?;
            let mut response = HandlerResponse::json(201, serde_json::to_value(&item)?);
            response.set_header("location", format!("/items/{}", item.id));
            Ok(response.boxed())
        })
        .operation("create_item")
        .parameter(
            ParameterMeta::form_data("name")
                .required(true)
                .schema(json!({"type": "string", "minLength": 1})),
        )
        .parameter(
            ParameterMeta::form_data("tags")
                .schema(json!({"type": "array", "items": {"type": "string"}})),
        ),
    )?;

    let s = Arc::clone(store);
    mapper.put_handler(
        EndpointRegistration::new(Method::DELETE, "/items/{id}", move |_, req| {
            let id: i64 = req
                .param_as("id")?
                .context("id is bound for every matched route")?;
            let removed = s
                .items
                .write()
                .map_err(|_| anyhow::anyhow!("item store lock poisoned"))?
                .remove(&id);
            Ok(match removed {
                Some(_) => HandlerResponse::new(204, Default::default(), serde_json::Value::Null).boxed(),
                None => HandlerResponse::error(404, "item not found").boxed(),
            })
        })
        .operation("delete_item")
        .parameter(ParameterMeta::path("id").schema(json!({"type": "integer"}))),
    )?;

    mapper.put_handler(
        EndpointRegistration::new(Method::GET, "/health", |_, _| {
            Ok(HandlerResponse::ok_json(json!({ "status": "ok" })).boxed())
        })
        .operation("health"),
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let runtime = RuntimeConfig::from_env();
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    }
    .with_runtime_overrides(&runtime);
    if let Some(mode) = cli.validation_mode {
        config.validation.mode = mode;
    }
    if let Some(addr) = cli.addr {
        config.http.addr = addr;
    }

    init_logging(&config.logging)?;
    may::config().set_stack_size(runtime.stack_size);

    let store = Arc::new(ItemStore::default());
    let mut mapper = new_handle_mapper();
    register_items(&mut mapper, &store)?;
    let router = mapper.new_router(BasicContextFactory::with_mode(config.validation.mode));
    if cli.dump_routes {
        router.dump_routes();
    }

    let service = DispatchService::new(router).with_max_body_bytes(config.http.max_body_bytes);
    let handle = HttpServer(service)
        .start(config.http.addr.as_str())
        .with_context(|| format!("Failed to bind {}", config.http.addr))?;
    tracing::info!(
        addr = %handle.addr(),
        validation_mode = %config.validation.mode,
        stack_size = runtime.stack_size,
        "brrtdispatch demo listening"
    );
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))?;
    Ok(())
}
