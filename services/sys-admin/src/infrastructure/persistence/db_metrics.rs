//! 数据库查询监控

use std::time::{Duration, Instant};

use metrics::{counter, histogram};

/// 数据库监控工具
pub struct DbMetrics;

impl DbMetrics {
    /// 记录查询（计时）
    pub fn record_query(elapsed: Duration, table: &'static str, operation: &'static str) {
        histogram!(
            "db_query_duration_ms",
            "table" => table,
            "operation" => operation
        )
        .record(elapsed.as_secs_f64() * 1000.0);

        counter!(
            "db_queries_total",
            "table" => table,
            "operation" => operation
        )
        .increment(1);
    }

    /// 记录查询错误
    pub fn record_error(table: &'static str, operation: &'static str) {
        counter!(
            "db_query_errors_total",
            "table" => table,
            "operation" => operation
        )
        .increment(1);
    }

    /// 记录慢查询
    pub fn record_slow(
        elapsed: Duration,
        table: &'static str,
        operation: &'static str,
        failed: bool,
    ) {
        tracing::warn!(
            table,
            operation,
            duration_ms = elapsed.as_millis() as u64,
            failed,
            "Slow query detected"
        );
        counter!(
            "db_slow_queries_total",
            "table" => table,
            "operation" => operation
        )
        .increment(1);
    }
}

/// 用于计时的守卫结构
pub struct QueryTimer {
    start: Instant,
    table: &'static str,
    operation: &'static str,
    slow_threshold: Duration,
}

impl QueryTimer {
    pub fn new(table: &'static str, operation: &'static str, slow_threshold: Duration) -> Self {
        Self {
            start: Instant::now(),
            table,
            operation,
            slow_threshold,
        }
    }

    pub fn finish(self) {
        self.record(false);
    }

    pub fn finish_with_error(self) {
        DbMetrics::record_error(self.table, self.operation);
        self.record(true);
    }

    /// 按结果记录
    pub fn observe<T, E>(self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.finish(),
            Err(_) => self.finish_with_error(),
        }
    }

    fn record(&self, failed: bool) {
        let elapsed = self.start.elapsed();
        DbMetrics::record_query(elapsed, self.table, self.operation);

        if elapsed > self.slow_threshold {
            DbMetrics::record_slow(elapsed, self.table, self.operation, failed);
        }
    }
}
