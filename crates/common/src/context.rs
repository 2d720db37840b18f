//! 请求上下文
//!
//! 携带调用方的取消信号与截止时间，业务操作在其内执行。

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 操作被中断的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("operation canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// 请求上下文
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定外部取消令牌
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 设置截止时间（取更早者）
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// 设置相对超时
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 取消该上下文下的所有操作
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 当前是否仍可继续执行
    ///
    /// 用于不可中断的步骤（如提交）开始之前。
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// 在上下文内执行 future
    ///
    /// 取消或超时时 future 被直接丢弃，其持有的事务句柄随之回滚。
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Canceled),
            _ = deadline => Err(Interrupted::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_canceled_before_start() {
        let ctx = RequestContext::new();
        ctx.cancel();

        let result = ctx.run(async { 7 }).await;
        assert_eq!(result, Err(Interrupted::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));

        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wins() {
        let ctx = RequestContext::new()
            .with_timeout(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(60));

        let remaining = ctx.deadline().unwrap() - Instant::now();
        assert!(remaining <= Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_reports_state() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        assert_eq!(ctx.check(), Ok(()));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(ctx.check(), Err(Interrupted::DeadlineExceeded));

        ctx.cancel();
        assert_eq!(ctx.check(), Err(Interrupted::Canceled));
    }

    #[tokio::test]
    async fn test_shared_token_cancels_clones() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        let clone = ctx.clone();

        token.cancel();
        assert!(clone.is_canceled());
    }
}
