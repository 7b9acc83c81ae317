//! Standalone JSON-LD context server.
//!
//! Publishes the documents of a contexts file and answers `/health` and
//! `/health/live`. Context routing and `Link` headers come from the library
//! interceptor; this binary only adds process concerns (logging, access
//! spans, CORS, shutdown).
//!
//! ## Configuration
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `JSONLD_CONTEXTS_FILE` | unset | JSON object `{ "key": <context>, ... }` published at startup |
//! | `JSONLD_CONTEXT_BASE_PATH` | `/` | Root for synthesized context paths |
//! | `JSONLD_TRUST_FORWARDED` | `true` | Honor `Forwarded` / `X-Forwarded-*` |
//! | `PORT` | `8080` | Listen port |
//! | `HOST` | `0.0.0.0` | Listen address |
//! | `RUST_LOG` | `info` | `EnvFilter` directives |
//! | `LOG_FORMAT` | `json` | `json` or `pretty` |
//!
//! ```bash
//! JSONLD_CONTEXTS_FILE=contexts.json cargo run --bin jsonld_context_service --features service
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use jsonld_context_link::{create_router, ContextLinkError, JsonLdContextLink};

const REQUEST_ID: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

/// Process settings read from the environment.
#[derive(Debug)]
struct Settings {
    addr: SocketAddr,
    contexts_file: Option<PathBuf>,
    log_format: LogFormat,
}

impl Settings {
    fn from_env() -> Result<Self, ContextLinkError> {
        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ContextLinkError::InvalidConfig(format!("PORT={raw} is not a port")))?,
            Err(_) => 8080,
        };
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let addr = format!("{host}:{port}").parse().map_err(|_| {
            ContextLinkError::InvalidConfig(format!("{host}:{port} is not a socket address"))
        })?;

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Ok(Self {
            addr,
            contexts_file: std::env::var_os("JSONLD_CONTEXTS_FILE").map(PathBuf::from),
            log_format,
        })
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "jsonld_context_service=info,jsonld_context_link=info,tower_http=info".into()
    });

    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Pretty => fmt::layer().with_span_events(FmtSpan::CLOSE).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .flatten_event(true)
            .boxed(),
    };

    tracing_subscriber::registry().with(output).with(filter).init();
}

/// Wraps each request in a span keyed by `X-Request-Id` (generated when
/// absent) and echoes the id on the response.
async fn access_log(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    span.in_scope(|| {
        info!(target: "jsonld_context_service::access", status, latency_ms, "served");
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

/// Read `{ key: context }` pairs from a JSON file.
fn load_contexts(path: &Path) -> Result<Map<String, Value>, ContextLinkError> {
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        other => Err(ContextLinkError::InvalidConfig(format!(
            "{}: expected an object of key -> context, found {}",
            path.display(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn publish(link: &JsonLdContextLink, file: &Path) -> Result<(), ContextLinkError> {
    let contexts = load_contexts(file).map_err(|e| {
        error!(error = %e, file = %file.display(), "contexts file rejected");
        e
    })?;

    for registration in link.registry().register_all(contexts)? {
        info!(path = %registration.path, reused = registration.reused, "published");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "ctrl-c listener unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM listener unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "draining"),
        _ = terminate => info!(signal = "SIGTERM", "draining"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    let link = JsonLdContextLink::from_env()?;
    if let Some(file) = &settings.contexts_file {
        publish(&link, file)?;
    }

    {
        let registry = link.registry();
        let fingerprint = registry.fingerprint()?;
        info!(
            version = env!("CARGO_PKG_VERSION"),
            base_path = %registry.base_path(),
            contexts = registry.len(),
            keys = registry.key_count(),
            fingerprint = %fingerprint,
            "registry ready"
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(link)
        .layer(middleware::from_fn(access_log))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = TcpListener::bind(settings.addr).await?;
    info!(addr = %settings.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("stopped");
    Ok(())
}
