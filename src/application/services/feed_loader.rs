use crate::application::ports::feed_transport::FeedTransport;
use crate::domain::entities::Page;
use crate::domain::value_objects::QueryKey;
use crate::infrastructure::cache::{FeedCache, LoadStart};
use crate::shared::error::AppError;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Appended { items: usize, has_more: bool },
    /// 終端ページまで読み込み済み
    Exhausted,
    AlreadyLoading,
    /// 取得中にビューが破棄されたため結果を捨てた
    Discarded,
}

/// 無限スクロールの末尾到達時に次のページを読み込む
#[derive(Clone)]
pub struct FeedLoader {
    cache: FeedCache,
    transport: Arc<dyn FeedTransport>,
}

impl FeedLoader {
    pub fn new(cache: FeedCache, transport: Arc<dyn FeedTransport>) -> Self {
        Self { cache, transport }
    }

    pub async fn load_more(&self, query: &QueryKey) -> Result<LoadOutcome, AppError> {
        let ticket = match self.cache.write(|entries| entries.begin_load(query)).await {
            LoadStart::Ready(ticket) => ticket,
            LoadStart::Exhausted => return Ok(LoadOutcome::Exhausted),
            LoadStart::AlreadyLoading => return Ok(LoadOutcome::AlreadyLoading),
        };

        match self
            .transport
            .fetch_page(query, ticket.cursor.as_ref())
            .await
        {
            Ok(page) => {
                let items = page.items.len();
                let has_more = page.next_cursor.is_some();
                let page: Page = page.into();
                let appended = self
                    .cache
                    .write(|entries| entries.append_if_live(query, ticket.generation, page))
                    .await;
                if !appended {
                    debug!(view = %query, "Dropped page for discarded view");
                    return Ok(LoadOutcome::Discarded);
                }
                debug!(view = %query, items, has_more, "Appended feed page");
                Ok(LoadOutcome::Appended { items, has_more })
            }
            Err(source) => {
                warn!(view = %query, error = %source, "Failed to fetch feed page");
                self.cache
                    .write(|entries| {
                        entries.fail_if_live(query, ticket.generation, source.to_string())
                    })
                    .await;
                Err(AppError::FetchFailed {
                    query: query.clone(),
                    source,
                })
            }
        }
    }

    /// 複数ビューを並行して1ページずつ進める
    pub async fn load_many(&self, queries: &[QueryKey]) -> Vec<Result<LoadOutcome, AppError>> {
        join_all(queries.iter().map(|query| self.load_more(query))).await
    }
}
