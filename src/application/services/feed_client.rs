use super::feed_loader::{FeedLoader, LoadOutcome};
use super::mutation_dispatcher::MutationDispatcher;
use crate::application::ports::feed_transport::{FeedTransport, ToggleLikeResponse};
use crate::application::ports::session_provider::{SessionProvider, SessionState};
use crate::domain::entities::{FeedSnapshot, Item};
use crate::domain::value_objects::{ItemId, QueryKey};
use crate::infrastructure::cache::{CacheEvent, FeedCache};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// 1セッション分のフィードキャッシュと、それに束縛されたローダー・ディスパッチャ
///
/// セッション開始時に生成し、ログアウトでキャッシュを破棄する。
#[derive(Clone)]
pub struct FeedClient {
    cache: FeedCache,
    loader: FeedLoader,
    dispatcher: MutationDispatcher,
    session: Arc<dyn SessionProvider>,
}

impl FeedClient {
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn FeedTransport>,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Configuration)?;

        let cache = FeedCache::new(&config.cache);
        let loader = FeedLoader::new(cache.clone(), Arc::clone(&transport));
        let dispatcher = MutationDispatcher::new(
            cache.clone(),
            transport,
            Arc::clone(&session),
            &config.mutations,
        );

        Ok(Self {
            cache,
            loader,
            dispatcher,
            session,
        })
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn loader(&self) -> &FeedLoader {
        &self.loader
    }

    pub fn dispatcher(&self) -> &MutationDispatcher {
        &self.dispatcher
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    pub async fn session(&self) -> SessionState {
        self.session.current().await
    }

    pub async fn load_more(&self, query: &QueryKey) -> Result<LoadOutcome, AppError> {
        self.loader.load_more(query).await
    }

    pub async fn toggle_like(&self, item_id: ItemId) -> Result<ToggleLikeResponse, AppError> {
        self.dispatcher.toggle_like(item_id).await
    }

    pub async fn create_item(&self, content: impl Into<String>) -> Result<Item, AppError> {
        self.dispatcher.create_item(content).await
    }

    pub async fn snapshot(&self, query: &QueryKey) -> Option<FeedSnapshot> {
        self.cache.snapshot(query).await
    }

    /// ビューのアンマウント。取得中のページは到着しても捨てられる。
    pub async fn unmount(&self, query: &QueryKey) -> bool {
        self.cache.discard(query).await
    }

    pub async fn logout(&self) {
        self.cache.clear().await;
        self.dispatcher.journal().clear().await;
        info!("Feed cache cleared on logout");
    }
}
