#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
#[cfg(feature = "metrics")]
use opentelemetry_prometheus::PrometheusExporter;

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<SchemaEditorMetrics> = Lazy::new(SchemaEditorMetrics::init);

#[cfg(feature = "metrics")]
pub struct SchemaEditorMetrics {
    pub exporter: PrometheusExporter,
    pub statements_total: Counter<u64>,
    pub reorgs_total: Counter<u64>,
    pub compensations_total: Counter<u64>,
    pub statement_duration: Histogram<f64>,
}

#[cfg(feature = "metrics")]
impl SchemaEditorMetrics {
    pub fn init() -> Self {
        let exporter = opentelemetry_prometheus::exporter().build().expect("failed to build prometheus exporter");
        let meter = global::meter("lifeguard_db2");

        let statements_total = meter.u64_counter("lifeguard_db2_statements_total")
            .with_description("Total schema statements executed").build();

        let reorgs_total = meter.u64_counter("lifeguard_db2_reorgs_total")
            .with_description("Tables reorganized after DDL").build();

        let compensations_total = meter.u64_counter("lifeguard_db2_compensations_total")
            .with_description("Added columns dropped again after a failed follow-up step").build();

        let statement_duration = meter.f64_histogram("lifeguard_db2_statement_duration_seconds")
            .with_description("Duration of schema statements").build();

        Self {
            exporter,
            statements_total,
            reorgs_total,
            compensations_total,
            statement_duration,
        }
    }

    pub fn record_statement(&self, elapsed: std::time::Duration) {
        self.statements_total.add(1, &[]);
        self.statement_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_reorg(&self) {
        self.reorgs_total.add(1, &[]);
    }

    pub fn record_compensation(&self) {
        self.compensations_total.add(1, &[]);
    }
}

/// Spans entered around schema editor operations
#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use crate::schema::TableName;
    use tracing::{info_span, Span};

    pub fn alter_field_span(table: &TableName, column: &str) -> Span {
        info_span!("lifeguard_db2.alter_field", table = %table, column = column)
    }

    pub fn add_column_span(table: &TableName, column: &str) -> Span {
        info_span!("lifeguard_db2.add_column", table = %table, column = column)
    }

    pub fn alter_relation_span(table: &TableName, column: &str) -> Span {
        info_span!("lifeguard_db2.alter_relation", table = %table, column = column)
    }

    pub fn reorg_span() -> Span {
        info_span!("lifeguard_db2.reorganize_pending")
    }
}
