//! Observability wiring for the agent service.
//!
//! # Purpose
//! Initializes tracing (text or JSON output), OpenTelemetry propagation, and
//! the Prometheus metrics recorder.
//!
//! # Notes
//! Initialization is guarded by `OnceLock` to keep startup idempotent in tests.
use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_exporter_prometheus::PrometheusHandle;
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static OBS_INIT: OnceLock<()> = OnceLock::new();
static PROPAGATOR_INIT: OnceLock<()> = OnceLock::new();

pub const AGENTS_BUILT_TOTAL: &str = "agentapi_agents_built_total";
pub const DEVICE_ERRORS_TOTAL: &str = "agentapi_device_errors_total";
pub const DB_MAX_CONNECTIONS: &str = "agentapi_database_max_connections";
pub const DB_TOTAL_CONNECTIONS: &str = "agentapi_database_total_connections";
pub const DB_IDLE_CONNECTIONS: &str = "agentapi_database_idle_connections";

/// Install the global subscriber and metrics recorder.
///
/// `production` switches log output to JSON. Repeated calls return the same
/// metrics handle and leave the first subscriber in place.
pub fn init_observability(service_name: &str, production: bool) -> PrometheusHandle {
    OBS_INIT.get_or_init(|| {
        global::set_text_map_propagator(
            opentelemetry_sdk::propagation::TraceContextPropagator::new(),
        );

        let provider = build_tracer_provider(service_name);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json_layer = production.then(|| tracing_subscriber::fmt::layer().json());
        let text_layer = (!production).then(|| tracing_subscriber::fmt::layer());
        let registry = tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .with(text_layer);
        if let Some(provider) = provider {
            let tracer = provider.tracer(service_name.to_string());
            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            let _ = registry.with(otel_layer).try_init();
        } else {
            let _ = registry.try_init();
        }
    });

    install_metrics_recorder()
}

fn build_tracer_provider(
    service_name: &str,
) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let resource = Resource::builder_empty()
        .with_attributes(resource_attributes(service_name))
        .build();
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    Some(
        opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn resource_attributes(service_name: &str) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new("service.name", service_name.to_string())];
    if let Ok(value) =
        std::env::var("AGENTAPI_INSTANCE_ID").or_else(|_| std::env::var("HOSTNAME"))
    {
        attrs.push(KeyValue::new("service.instance.id", value));
    }
    if let Ok(value) = std::env::var("DEPLOYMENT_ENVIRONMENT") {
        attrs.push(KeyValue::new("deployment.environment", value));
    }
    attrs
}

pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> opentelemetry::Context {
    PROPAGATOR_INIT.get_or_init(|| {
        global::set_text_map_propagator(
            opentelemetry_sdk::propagation::TraceContextPropagator::new(),
        );
    });
    global::get_text_map_propagator(|prop| prop.extract(&HeaderMapExtractor(headers)))
}

struct HeaderMapExtractor<'a>(&'a axum::http::HeaderMap);

impl<'a> Extractor for HeaderMapExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Global Prometheus handle; installs the recorder on first use.
pub fn install_metrics_recorder() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .unwrap_or_else(|err| {
                    // Another recorder is already global; keep a detached one for rendering.
                    tracing::warn!(error = %err, "metrics recorder already installed");
                    PrometheusBuilder::new().build_recorder().handle()
                });
            describe_metrics();
            handle
        })
        .clone()
}

fn describe_metrics() {
    metrics::describe_counter!(AGENTS_BUILT_TOTAL, "User agents returned to clients");
    metrics::describe_counter!(DEVICE_ERRORS_TOTAL, "Failed random device lookups");
    metrics::describe_gauge!(DB_MAX_CONNECTIONS, "Database max connections");
    metrics::describe_gauge!(DB_TOTAL_CONNECTIONS, "Database total connections");
    metrics::describe_gauge!(DB_IDLE_CONNECTIONS, "Database idle connections");
}
