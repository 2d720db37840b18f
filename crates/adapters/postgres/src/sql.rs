//! 查询模型到参数化 SQL 的渲染
//!
//! 所有值都通过 `push_bind` 绑定，列名只来自 [`Column::name`]。

use rbac_ports::{Column, Condition, Filter, FindOptions, Value};
use sqlx::{Postgres, QueryBuilder};

/// 转义 LIKE 通配符，使输入按字面匹配
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Null => {
            qb.push("NULL");
        }
        Value::Int(v) => {
            qb.push_bind(*v);
        }
        Value::Text(v) => {
            qb.push_bind(v.clone());
        }
        Value::Timestamp(v) => {
            qb.push_bind(*v);
        }
    }
}

fn push_comparison<C: Column>(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: C,
    op: &str,
    value: &Value,
) {
    // 与 NULL 比较恒为假
    if value.is_null() {
        qb.push("FALSE");
        return;
    }
    qb.push(column.name()).push(" ").push(op).push(" ");
    push_value(qb, value);
}

fn push_condition<C: Column>(qb: &mut QueryBuilder<'_, Postgres>, condition: &Condition<C>) {
    match condition {
        Condition::Eq(column, Value::Null) => {
            qb.push(column.name()).push(" IS NULL");
        }
        Condition::Ne(column, Value::Null) => {
            qb.push(column.name()).push(" IS NOT NULL");
        }
        Condition::Eq(column, value) => push_comparison(qb, *column, "=", value),
        Condition::Ne(column, value) => push_comparison(qb, *column, "<>", value),
        Condition::Gt(column, value) => push_comparison(qb, *column, ">", value),
        Condition::Gte(column, value) => push_comparison(qb, *column, ">=", value),
        Condition::Lt(column, value) => push_comparison(qb, *column, "<", value),
        Condition::Lte(column, value) => push_comparison(qb, *column, "<=", value),
        Condition::In(column, values) => {
            let values: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
            if values.is_empty() {
                qb.push("FALSE");
                return;
            }
            qb.push(column.name()).push(" IN (");
            let mut separated = qb.separated(", ");
            for value in values {
                match value {
                    Value::Int(v) => separated.push_bind(*v),
                    Value::Text(v) => separated.push_bind(v.clone()),
                    Value::Timestamp(v) => separated.push_bind(*v),
                    Value::Null => separated.push("NULL"),
                };
            }
            separated.push_unseparated(")");
        }
        Condition::Contains(column, needle) => {
            qb.push(column.name())
                .push(" LIKE ")
                .push_bind(format!("%{}%", escape_like(needle)))
                .push(" ESCAPE '\\'");
        }
    }
}

/// 追加 WHERE 子句
///
/// `deleted_at` 为表的软删除列；过滤器未显式包含已删除行时追加 `IS NULL` 条件。
pub fn push_where<C: Column>(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &Filter<C>,
    deleted_at: Option<C>,
) {
    let soft_delete = deleted_at.filter(|_| !filter.includes_deleted());
    if filter.conditions().is_empty() && soft_delete.is_none() {
        return;
    }

    qb.push(" WHERE ");
    let mut first = true;
    if let Some(column) = soft_delete {
        qb.push(column.name()).push(" IS NULL");
        first = false;
    }
    for condition in filter.conditions() {
        if !first {
            qb.push(" AND ");
        }
        push_condition(qb, condition);
        first = false;
    }
}

/// 追加 ORDER BY 与 LIMIT/OFFSET
pub fn push_options<C: Column>(qb: &mut QueryBuilder<'_, Postgres>, options: &FindOptions<C>) {
    if !options.order.is_empty() {
        qb.push(" ORDER BY ");
        for (i, order) in options.order.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(order.column.name())
                .push(" ")
                .push(order.direction.as_sql());
        }
    }

    if let Some(window) = options.window {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(window.limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
    }
}
