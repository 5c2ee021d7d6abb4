//! Logging, tracing and metrics for the indexing service.
//!
//! Human-readable logs go to the console and are filtered by `RUST_LOG`
//! (`info` when unset). OpenTelemetry export is layered on top per Cargo
//! feature: `tracing` exports the spans around `create_index` and batch
//! fan-out, `metrics` records request and cell counts, and `stdout` prints
//! both every five seconds.
//!
//! The recording helpers at the bottom of this module are always callable;
//! without the `metrics` feature they do nothing.

// Disallow using `stdout` without `tracing` or `metrics`
#[cfg(all(feature = "stdout", not(any(feature = "tracing", feature = "metrics"))))]
compile_error!(
    "The 'stdout' feature requires at least one of 'tracing' or 'metrics' to be enabled."
);

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_sdk::Resource;
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_semantic_conventions as semvcns;

#[cfg(feature = "tracing")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "tracing")]
use opentelemetry_sdk::propagation::TraceContextPropagator;
#[cfg(feature = "tracing")]
use opentelemetry_sdk::trace as sdktrace;

/// Exporter handles that must outlive the server so they can be flushed.
pub struct TelemetryProviders {
    #[cfg(feature = "tracing")]
    pub tracer_provider: sdktrace::SdkTracerProvider,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

impl TelemetryProviders {
    /// Flushes and shuts down the exporters. Errors are reported on stderr
    /// since the subscriber may already be gone.
    pub fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        {
            if let Err(err) = self.tracer_provider.force_flush() {
                eprintln!("Error flushing traces: {err:#?}");
            }
            if let Err(err) = self.tracer_provider.shutdown() {
                eprintln!("Error shutting down tracer: {err:#?}");
            }
        }

        #[cfg(feature = "metrics")]
        {
            if let Err(err) = self.meter_provider.force_flush() {
                eprintln!("Error flushing metrics: {err:#?}");
            }
            if let Err(err) = self.meter_provider.shutdown() {
                eprintln!("Error shutting down meter: {err:#?}");
            }
        }
    }
}

/// Installs the global subscriber and, per enabled feature, the tracer and
/// meter providers.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "tracing")]
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    #[cfg(feature = "tracing")]
    let tracer_provider = init_tracer();

    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics();

    #[cfg(any(feature = "metrics", feature = "tracing"))]
    let scope = InstrumentationScope::builder("hexcover")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semvcns::SCHEMA_URL)
        .build();

    // Console output, independent of the `stdout` exporter.
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        );

    #[cfg(feature = "tracing")]
    let registry = {
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        registry.with(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer_with_scope(scope.clone()))
                .with_error_records_to_exceptions(true),
        )
    };

    #[cfg(feature = "metrics")]
    let registry = {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let meter = opentelemetry::global::meter_with_scope(scope);
        init_metric_handles(meter);

        registry.with(tracing_opentelemetry::MetricsLayer::new(
            meter_provider.clone(),
        ))
    };

    registry.try_init()?;

    Ok(TelemetryProviders {
        #[cfg(feature = "tracing")]
        tracer_provider,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

#[cfg(any(feature = "metrics", feature = "tracing"))]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name("hexcover")
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    builder.build()
}

#[cfg(feature = "tracing")]
fn init_tracer() -> sdktrace::SdkTracerProvider {
    let builder = sdktrace::SdkTracerProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::SpanExporter;
        let exporter = SpanExporter::default();
        let batch = sdktrace::BatchSpanProcessor::builder(exporter)
            .with_batch_config(
                sdktrace::BatchConfigBuilder::default()
                    .with_scheduled_delay(std::time::Duration::from_secs(5))
                    .with_max_queue_size(2048)
                    .build(),
            )
            .build();
        builder.with_span_processor(batch)
    };

    builder.build()
}

#[cfg(feature = "metrics")]
struct Instruments {
    requests: Counter<u64>,
    requests_inflight: UpDownCounter<i64>,
    errors: Counter<u64>,
    request_duration_ms: Histogram<f64>,
    cells_generated: Counter<u64>,
    geometries_per_request: Histogram<f64>,
}

#[cfg(feature = "metrics")]
static INSTRUMENTS: OnceLock<Instruments> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = INSTRUMENTS.set(Instruments {
        requests: meter
            .u64_counter("requests")
            .with_description("Accepted create-index requests")
            .build(),
        requests_inflight: meter
            .i64_up_down_counter("requests_inflight")
            .with_description("Create-index requests currently converting")
            .build(),
        errors: meter
            .u64_counter("errors")
            .with_description("Rejected or failed create-index requests")
            .build(),
        request_duration_ms: meter
            .f64_histogram("request_duration")
            .with_unit("ms")
            .with_description("Time from validation to response")
            .build(),
        cells_generated: meter
            .u64_counter("cells_generated")
            .with_description("H3 cells returned across all geometries")
            .build(),
        geometries_per_request: meter
            .f64_histogram("geometries_per_request")
            .with_description("Batch size of accepted requests")
            .build(),
    });
}

#[cfg(feature = "metrics")]
fn record(f: impl FnOnce(&Instruments)) {
    if let Some(instruments) = INSTRUMENTS.get() {
        f(instruments);
    }
}

pub fn increment_requests() {
    #[cfg(feature = "metrics")]
    record(|i| i.requests.add(1, &[]));
}

pub fn increment_requests_inflight() {
    #[cfg(feature = "metrics")]
    record(|i| i.requests_inflight.add(1, &[]));
}

pub fn decrement_requests_inflight() {
    #[cfg(feature = "metrics")]
    record(|i| i.requests_inflight.add(-1, &[]));
}

pub fn increment_request_errors() {
    #[cfg(feature = "metrics")]
    record(|i| i.errors.add(1, &[]));
}

#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
pub fn record_request_duration(duration_ms: f64) {
    #[cfg(feature = "metrics")]
    record(|i| i.request_duration_ms.record(duration_ms, &[]));
}

#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
pub fn increment_cells_generated(count: u64) {
    #[cfg(feature = "metrics")]
    record(|i| i.cells_generated.add(count, &[]));
}

#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
pub fn record_geometries_per_request(count: f64) {
    #[cfg(feature = "metrics")]
    record(|i| i.geometries_per_request.record(count, &[]));
}
