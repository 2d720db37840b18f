//! 启动期重试
//!
//! 仅用于建立基础设施连接。业务操作不做自动重试，瞬时错误交由调用方处理。

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier: default_multiplier(),
        }
    }

    /// 两次尝试之间的等待序列，长度为 `max_attempts - 1`
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay,
            max: self.max_delay,
            multiplier: self.multiplier.max(1.0),
            remaining: self.max_attempts.saturating_sub(1),
        }
    }
}

/// 指数退避序列
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: f64,
    remaining: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current = self.next.min(self.max);
        self.next = self.next.mul_f64(self.multiplier).min(self.max);
        Some(current)
    }
}

/// 按退避序列重试 `operation`
///
/// 只有 `retryable` 认可的错误才会重试；其余错误与最后一次失败原样返回。
pub async fn with_retry<F, Fut, T, E, R>(
    config: &RetryConfig,
    operation_name: &str,
    retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut backoff = config.backoff();
    let mut attempt = 1u32;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let delay = match backoff.next() {
            Some(delay) if retryable(&err) => delay,
            _ => {
                warn!(operation = operation_name, attempt, error = %err, "Operation failed, giving up");
                return Err(err);
            }
        };

        warn!(
            operation = operation_name,
            attempt,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "Operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
