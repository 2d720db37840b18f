//! Unit of Work 端口
//!
//! 一个 Unit of Work 对应一个数据库事务。`commit`/`rollback` 消费自身，
//! 未显式提交即被丢弃的 Unit of Work 由实现负责回滚。

use async_trait::async_trait;
use futures::future::BoxFuture;
use rbac_errors::{AppError, AppResult};
use tracing::warn;

/// Unit of Work
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// 在事务中执行 `work`
///
/// 成功时提交；失败时回滚并返回 `work` 的原始错误，回滚失败只记录日志。
pub async fn run_in_transaction<U, T, E, F>(uow: Box<U>, work: F) -> Result<T, E>
where
    U: UnitOfWork + ?Sized,
    T: Send,
    E: From<AppError> + Send,
    F: for<'a> FnOnce(&'a U) -> BoxFuture<'a, Result<T, E>> + Send,
{
    let outcome = work(&*uow).await;

    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(err)
        }
    }
}
