//! 分页引擎
//!
//! 按页码计算 offset/limit，并在结果页必然是最后一页时省略 COUNT 查询。

use std::future::Future;

use serde::{Deserialize, Serialize};

/// 分页请求（页码从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }

    /// 检查页码与每页数量是否在允许范围内
    pub fn within(&self, min_size: u32, max_size: u32) -> bool {
        self.page >= 1 && (min_size..=max_size).contains(&self.size)
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(list: Vec<T>, total: u64) -> Self {
        Self { list, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            list: self.list.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// 根据本页返回行数推断总数
///
/// 仅当返回行数非零且少于 limit 时本页必为最后一页。空页无法区分
/// "过滤结果为空" 与 "页码越界"，必须走 COUNT。
pub fn derive_total(offset: u64, limit: u64, returned: usize) -> Option<u64> {
    let returned = returned as u64;
    if limit > 0 && returned > 0 && returned < limit {
        Some(offset + returned)
    } else {
        None
    }
}

/// 执行分页查询
///
/// `fetch` 接收 `(offset, limit)` 返回本页数据；`count` 仅在无法推断总数时调用。
pub async fn paginate<T, E, F, FFut, C, CFut>(
    request: PageRequest,
    fetch: F,
    count: C,
) -> Result<Page<T>, E>
where
    F: FnOnce(u64, u64) -> FFut,
    FFut: Future<Output = Result<Vec<T>, E>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<u64, E>>,
{
    let offset = request.offset();
    let limit = request.limit();

    let list = fetch(offset, limit).await?;
    let total = match derive_total(offset, limit, list.len()) {
        Some(total) => total,
        None => count().await?,
    };

    Ok(Page { list, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn run(rows: u64, request: PageRequest, counts: &AtomicU32) -> Page<u64> {
        paginate(
            request,
            |offset, limit| async move {
                Ok::<_, ()>((offset..rows).take(limit as usize).collect())
            },
            || async move {
                counts.fetch_add(1, Ordering::SeqCst);
                Ok(rows)
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
    }

    #[test]
    fn test_within_bounds() {
        assert!(PageRequest::new(1, 10).within(10, 100));
        assert!(PageRequest::new(7, 100).within(10, 100));
        assert!(!PageRequest::new(0, 10).within(10, 100));
        assert!(!PageRequest::new(1, 9).within(10, 100));
        assert!(!PageRequest::new(1, 101).within(10, 100));
    }

    #[test]
    fn test_derive_total() {
        assert_eq!(derive_total(10, 10, 5), Some(15));
        assert_eq!(derive_total(0, 10, 3), Some(3));
        assert_eq!(derive_total(0, 10, 10), None);
        assert_eq!(derive_total(0, 10, 0), None);
        assert_eq!(derive_total(40, 10, 0), None);
    }

    #[tokio::test]
    async fn test_last_page_skips_count() {
        let counts = AtomicU32::new(0);
        let page = run(15, PageRequest::new(2, 10), &counts).await;

        assert_eq!(page.list.len(), 5);
        assert_eq!(page.total, 15);
        assert_eq!(counts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_page_issues_count() {
        let counts = AtomicU32::new(0);
        let page = run(15, PageRequest::new(1, 10), &counts).await;

        assert_eq!(page.list.len(), 10);
        assert_eq!(page.total, 15);
        assert_eq!(counts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_past_end_reports_real_total() {
        let counts = AtomicU32::new(0);
        let page = run(15, PageRequest::new(5, 10), &counts).await;

        assert!(page.list.is_empty());
        assert_eq!(page.total, 15);
        assert_eq!(counts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2], 7).map(|v| v * 10);
        assert_eq!(page, Page::new(vec![10, 20], 7));
    }
}
