use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "beacon.requests",
    metric_type: MetricType::Counter,
    description: "Beacon requests served. Tagged with branch (redirect, page, pixel, badge).",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "beacon.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time to build the beacon response in seconds. Tagged with branch.",
};

pub const CLIENT_IDS: MetricDef = MetricDef {
    name: "beacon.client_ids",
    metric_type: MetricType::Counter,
    description: "Client ids assigned. Tagged with source (cookie, generated, failed).",
};

pub const DELIVERIES: MetricDef = MetricDef {
    name: "collector.deliveries",
    metric_type: MetricType::Counter,
    description: "Pageview hits delivered to the collector. Tagged with outcome (success, failure).",
};

pub const DELIVERIES_INFLIGHT: MetricDef = MetricDef {
    name: "collector.deliveries.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of collector deliveries currently running",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUESTS,
    REQUEST_DURATION,
    CLIENT_IDS,
    DELIVERIES,
    DELIVERIES_INFLIGHT,
];
