//! Provider and reader telemetry instruments and recording helpers.

use crate::Error;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct CardinalityInstruments {
    reader_requests: Counter<u64>,
    read_requests: Counter<u64>,
    read_duration_seconds: Histogram<f64>,
    read_partials: Histogram<u64>,
    tables_delivered: Counter<u64>,
}

fn instruments() -> &'static CardinalityInstruments {
    static INSTRUMENTS: OnceLock<CardinalityInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("cardinality_provider");
        CardinalityInstruments {
            reader_requests: meter
                .u64_counter("cardinality.reader.requests")
                .with_description("Series cardinality reader constructions by outcome")
                .init(),
            read_requests: meter
                .u64_counter("cardinality.read.requests")
                .with_description("Series cardinality reads by outcome")
                .init(),
            read_duration_seconds: meter
                .f64_histogram("cardinality.read.duration")
                .with_description("Series cardinality read latency")
                .with_unit("s")
                .init(),
            read_partials: meter
                .u64_histogram("cardinality.read.partials")
                .with_description("Partial counts delivered by the backend per read")
                .init(),
            tables_delivered: meter
                .u64_counter("cardinality.read.tables_delivered")
                .with_description("Tables handed to sinks")
                .init(),
        }
    })
}

fn outcome_attrs(error: Option<&Error>) -> Vec<KeyValue> {
    match error {
        None => vec![KeyValue::new("outcome", "success")],
        Some(error) => vec![
            KeyValue::new("outcome", "error"),
            KeyValue::new("error.class", error.kind().as_str()),
        ],
    }
}

pub fn record_reader_request(error: Option<&Error>) {
    instruments()
        .reader_requests
        .add(1, &outcome_attrs(error));
}

pub struct ReadMetrics {
    pub duration_seconds: f64,
    pub partials: u64,
}

pub fn record_read(error: Option<&Error>, metrics: ReadMetrics) {
    let i = instruments();
    let attrs = outcome_attrs(error);
    i.read_requests.add(1, &attrs);
    i.read_duration_seconds.record(metrics.duration_seconds, &attrs);
    i.read_partials.record(metrics.partials, &attrs);
}

pub fn record_table_delivered() {
    instruments().tables_delivered.add(1, &[]);
}
