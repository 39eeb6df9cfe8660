//! Pool gauges and connection acquisition metrics.

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

lazy_static::lazy_static! {
    /// Connections per pool by state: idle, in_use, max
    static ref POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Database pool connections by state",
        &["service", "state"]
    ).expect("db_pool_connections registration");

    static ref ACQUIRE_SECONDS: HistogramVec = register_histogram_vec!(
        "db_pool_acquire_duration_seconds",
        "Time spent waiting for a pooled connection",
        &["service"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).expect("db_pool_acquire_duration_seconds registration");

    static ref ACQUIRE_ERRORS: IntCounterVec = register_int_counter_vec!(
        "db_pool_connection_errors_total",
        "Failed connection acquisitions",
        &["service", "kind"]
    ).expect("db_pool_connection_errors_total registration");
}

fn error_kind(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::PoolTimedOut => "timeout",
        sqlx::Error::PoolClosed => "closed",
        sqlx::Error::Io(_) => "io",
        sqlx::Error::Tls(_) => "tls",
        _ => "other",
    }
}

pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    let size = i64::from(pool.size());
    let idle = pool.num_idle() as i64;
    let max = i64::from(pool.options().get_max_connections());

    for (state, value) in [("idle", idle), ("in_use", size - idle), ("max", max)] {
        POOL_CONNECTIONS
            .with_label_values(&[service, state])
            .set(value);
    }
}

/// `pool.acquire()` that records wait time and failures under `service`.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let started = Instant::now();
    let result = pool.acquire().await;
    ACQUIRE_SECONDS
        .with_label_values(&[service])
        .observe(started.elapsed().as_secs_f64());

    result.map_err(|err| {
        ACQUIRE_ERRORS
            .with_label_values(&[service, error_kind(&err)])
            .inc();
        err
    })
}
