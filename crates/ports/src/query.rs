//! 通用查询模型
//!
//! 与存储实现无关的过滤、排序与分页描述。Postgres 适配器将其翻译为参数化 SQL，
//! 内存实现直接在记录上求值，两者语义保持一致。

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, Utc};

/// 表的列标识
pub trait Column: Copy + Eq + Debug + Send + Sync + 'static {
    /// 列名
    fn name(&self) -> &'static str;
}

/// 列值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 同类型值之间的比较；NULL 或类型不同时不可比较
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// 排序用的全序：NULL 排在最后（与 Postgres ASC 默认一致）
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// 单个过滤条件
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<C> {
    /// 等于；值为 NULL 时等价于 IS NULL
    Eq(C, Value),
    /// 不等于；值为 NULL 时等价于 IS NOT NULL
    Ne(C, Value),
    Gt(C, Value),
    Gte(C, Value),
    Lt(C, Value),
    Lte(C, Value),
    In(C, Vec<Value>),
    /// 区分大小写的子串匹配，输入中的通配符按字面匹配
    Contains(C, String),
}

impl<C: Column> Condition<C> {
    pub fn column(&self) -> C {
        match self {
            Condition::Eq(c, _)
            | Condition::Ne(c, _)
            | Condition::Gt(c, _)
            | Condition::Gte(c, _)
            | Condition::Lt(c, _)
            | Condition::Lte(c, _)
            | Condition::In(c, _)
            | Condition::Contains(c, _) => *c,
        }
    }

    /// 在给定列值上求值
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Condition::Eq(_, expected) => actual == expected,
            Condition::Ne(_, expected) if expected.is_null() => !actual.is_null(),
            Condition::Ne(_, expected) => {
                !actual.is_null() && actual.compare(expected) != Some(Ordering::Equal)
            }
            Condition::Gt(_, bound) => actual.compare(bound) == Some(Ordering::Greater),
            Condition::Gte(_, bound) => matches!(
                actual.compare(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Lt(_, bound) => actual.compare(bound) == Some(Ordering::Less),
            Condition::Lte(_, bound) => matches!(
                actual.compare(bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::In(_, values) => !actual.is_null() && values.contains(actual),
            Condition::Contains(_, needle) => match actual {
                Value::Text(text) => text.contains(needle.as_str()),
                _ => false,
            },
        }
    }
}

/// 合取（AND）过滤器
///
/// 默认只作用于未软删除的行，`with_deleted` 可显式包含已删除行。
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<C> {
    conditions: Vec<Condition<C>>,
    with_deleted: bool,
}

impl<C> Default for Filter<C> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            with_deleted: false,
        }
    }
}

impl<C: Column> Filter<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, column: C, value: impl Into<Value>) -> Self {
        self.and(Condition::Eq(column, value.into()))
    }

    pub fn ne(self, column: C, value: impl Into<Value>) -> Self {
        self.and(Condition::Ne(column, value.into()))
    }

    pub fn gt(self, column: C, value: impl Into<Value>) -> Self {
        self.and(Condition::Gt(column, value.into()))
    }

    pub fn gte(self, column: C, value: impl Into<Value>) -> Self {
        self.and(Condition::Gte(column, value.into()))
    }

    pub fn lt(self, column: C, value: impl Into<Value>) -> Self {
        self.and(Condition::Lt(column, value.into()))
    }

    pub fn lte(self, column: C, value: impl Into<Value>) -> Self {
        self.and(Condition::Lte(column, value.into()))
    }

    pub fn is_in<V: Into<Value>>(self, column: C, values: impl IntoIterator<Item = V>) -> Self {
        self.and(Condition::In(
            column,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn contains(self, column: C, needle: impl Into<String>) -> Self {
        self.and(Condition::Contains(column, needle.into()))
    }

    /// 包含已软删除的行
    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }

    /// 仅作用于未软删除的行
    pub fn live_only(mut self) -> Self {
        self.with_deleted = false;
        self
    }

    pub fn and(mut self, condition: Condition<C>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// 条件存在时追加
    pub fn and_then<T>(self, value: Option<T>, build: impl FnOnce(Self, T) -> Self) -> Self {
        match value {
            Some(value) => build(self, value),
            None => self,
        }
    }

    pub fn conditions(&self) -> &[Condition<C>] {
        &self.conditions
    }

    pub fn includes_deleted(&self) -> bool {
        self.with_deleted
    }

    /// 在一条记录上求值，`lookup` 返回指定列的值
    pub fn matches(&self, lookup: impl Fn(C) -> Value) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(&lookup(condition.column())))
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// 排序项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy<C> {
    pub column: C,
    pub direction: Direction,
}

impl<C> OrderBy<C> {
    pub fn asc(column: C) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: C) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }
}

/// 结果窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// 查询选项：排序与窗口
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions<C> {
    pub order: Vec<OrderBy<C>>,
    pub window: Option<Window>,
}

impl<C> Default for FindOptions<C> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            window: None,
        }
    }
}

impl<C: Column> FindOptions<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, order: OrderBy<C>) -> Self {
        self.order.push(order);
        self
    }

    pub fn window(mut self, offset: u64, limit: u64) -> Self {
        self.window = Some(Window { offset, limit });
        self
    }

    /// 按排序项比较两条记录
    pub fn compare(&self, lookup_a: impl Fn(C) -> Value, lookup_b: impl Fn(C) -> Value) -> Ordering {
        for order in &self.order {
            let ordering = lookup_a(order.column).sort_cmp(&lookup_b(order.column));
            let ordering = match order.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Col {
        Name,
        Sort,
        Remark,
    }

    impl Column for Col {
        fn name(&self) -> &'static str {
            match self {
                Col::Name => "name",
                Col::Sort => "sort",
                Col::Remark => "remark",
            }
        }
    }

    fn row(name: &str, sort: i64, remark: Option<&str>) -> impl Fn(Col) -> Value {
        let name = name.to_string();
        let remark = remark.map(str::to_string);
        move |col| match col {
            Col::Name => Value::from(name.clone()),
            Col::Sort => Value::from(sort),
            Col::Remark => Value::from(remark.clone()),
        }
    }

    #[test]
    fn test_contains_is_case_sensitive_and_literal() {
        let filter = Filter::new().contains(Col::Name, "Adm");
        assert!(filter.matches(row("SysAdmin", 1, None)));
        assert!(!filter.matches(row("sysadmin", 1, None)));

        let wildcard = Filter::new().contains(Col::Name, "a%b");
        assert!(wildcard.matches(row("xa%by", 1, None)));
        assert!(!wildcard.matches(row("axxb", 1, None)));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let filter = Filter::new()
            .contains(Col::Name, "ops")
            .gte(Col::Sort, 5i64)
            .lt(Col::Sort, 10i64);

        assert!(filter.matches(row("devops", 5, None)));
        assert!(!filter.matches(row("devops", 10, None)));
        assert!(!filter.matches(row("dev", 7, None)));
    }

    #[test]
    fn test_null_semantics() {
        assert!(Filter::new().eq(Col::Remark, Value::Null).matches(row("a", 1, None)));
        assert!(!Filter::new().ne(Col::Remark, Value::Null).matches(row("a", 1, None)));
        assert!(!Filter::new().ne(Col::Remark, "x").matches(row("a", 1, None)));
        assert!(Filter::new().ne(Col::Remark, "x").matches(row("a", 1, Some("y"))));
        assert!(!Filter::new().gt(Col::Remark, "a").matches(row("a", 1, None)));
    }

    #[test]
    fn test_in_and_empty_in() {
        assert!(Filter::new().is_in(Col::Sort, [1i64, 3]).matches(row("a", 3, None)));
        assert!(!Filter::new().is_in(Col::Sort, Vec::<i64>::new()).matches(row("a", 3, None)));
    }

    #[test]
    fn test_and_then_skips_missing_values() {
        let filter = Filter::new()
            .and_then(None::<String>, |f, name| f.contains(Col::Name, name))
            .and_then(Some(2i64), |f, sort| f.eq(Col::Sort, sort));

        assert_eq!(filter.conditions().len(), 1);
        assert!(!filter.includes_deleted());
        assert!(filter.clone().with_deleted().includes_deleted());
    }

    #[test]
    fn test_order_compare_with_tie_break() {
        let options = FindOptions::new()
            .order_by(OrderBy::asc(Col::Sort))
            .order_by(OrderBy::desc(Col::Name));

        assert_eq!(
            options.compare(row("a", 1, None), row("b", 2, None)),
            Ordering::Less
        );
        assert_eq!(
            options.compare(row("a", 1, None), row("b", 1, None)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_nulls_sort_last() {
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Greater);
        assert_eq!(Value::Int(1).sort_cmp(&Value::Null), Ordering::Less);
    }
}
