//! 表级查询门面
//!
//! 每张表一个 [`QueryFacade`]，提供带过滤的查找、计数、插入、更新与删除。
//! 同一 trait 既可绑定连接池（自动提交），也可绑定事务。

use async_trait::async_trait;
use rbac_errors::AppResult;

use crate::query::{Column, Filter, FindOptions, Value};

/// 表定义
pub trait Table: Send + Sync + 'static {
    /// 列标识
    type Column: Column;
    /// 读出的完整记录
    type Record: Clone + Send + Sync;
    /// 写入的可变字段集合
    type Draft: Send + Sync;

    /// 表名
    const NAME: &'static str;

    /// 软删除时间戳列；为 `None` 时删除为物理删除
    const DELETED_AT: Option<Self::Column>;

    /// 读取记录上的列值
    fn value(record: &Self::Record, column: Self::Column) -> Value;
}

/// 单表查询门面
#[async_trait]
pub trait QueryFacade<T: Table>: Send + Sync {
    /// 按过滤条件查询，排序与窗口由 `options` 指定
    async fn find(
        &self,
        filter: &Filter<T::Column>,
        options: &FindOptions<T::Column>,
    ) -> AppResult<Vec<T::Record>>;

    /// 满足条件的行数
    async fn count(&self, filter: &Filter<T::Column>) -> AppResult<u64>;

    /// 插入一行，返回包含生成列（id、时间戳）的记录
    async fn insert(&self, draft: &T::Draft) -> AppResult<T::Record>;

    /// 用 `draft` 覆盖满足条件的行，返回受影响行数
    async fn update(&self, filter: &Filter<T::Column>, draft: &T::Draft) -> AppResult<u64>;

    /// 删除满足条件的行，返回受影响行数
    ///
    /// 表定义了 `DELETED_AT` 时为软删除，已删除的行不会被再次计数。
    async fn delete(&self, filter: &Filter<T::Column>) -> AppResult<u64>;

    /// 第一条匹配记录
    async fn first(
        &self,
        filter: &Filter<T::Column>,
        options: &FindOptions<T::Column>,
    ) -> AppResult<Option<T::Record>> {
        let options = FindOptions {
            order: options.order.clone(),
            window: Some(crate::query::Window {
                offset: 0,
                limit: 1,
            }),
        };
        Ok(self.find(filter, &options).await?.into_iter().next())
    }

    /// 是否存在匹配记录
    async fn exists(&self, filter: &Filter<T::Column>) -> AppResult<bool> {
        Ok(self.first(filter, &FindOptions::default()).await?.is_some())
    }
}
