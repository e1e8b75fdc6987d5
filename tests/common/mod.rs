#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use feed_cache::application::ports::{
    CreatedItem, FeedPage, FeedTransport, ToggleLikeResponse, Viewer,
};
use feed_cache::domain::entities::Author;
use feed_cache::domain::value_objects::{FeedCursor, ItemId, QueryKey, UserId};
use feed_cache::infrastructure::remote::{InMemoryFeedServer, RemoteOperation};
use feed_cache::infrastructure::session::StaticSession;
use feed_cache::shared::config::{AppConfig, ToggleFailurePolicy};
use feed_cache::shared::error::TransportError;
use feed_cache::FeedClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Semaphore};

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

pub fn viewer(id: &str) -> Viewer {
    Viewer {
        id: user(id),
        name: Some(id.to_string()),
        image: None,
    }
}

/// alice の投稿3件と carol の投稿1件を新しい順に登録し、bob としてサインインする
///
/// 先頭の alice の投稿には他ユーザーからのいいねが2件付いている。
pub async fn seeded_server(page_size: usize) -> (InMemoryFeedServer, Vec<ItemId>) {
    let server = InMemoryFeedServer::new(page_size);
    server
        .register_user(Author::new(user("alice")).with_profile(Some("Alice".to_string()), None))
        .await;

    let now = Utc::now();
    let mut ids = Vec::new();
    for (offset, author) in ["alice", "alice", "carol", "alice"].iter().enumerate() {
        let id = server
            .seed_post(
                user(author),
                format!("{author} post {offset}"),
                now - Duration::minutes(offset as i64),
            )
            .await;
        ids.push(id);
    }
    server.seed_like(ids[0].clone(), user("carol")).await;
    server.seed_like(ids[0].clone(), user("dave")).await;
    server.sign_in(user("bob")).await;
    (server, ids)
}

pub fn client(
    transport: Arc<dyn FeedTransport>,
    session: StaticSession,
    policy: ToggleFailurePolicy,
) -> FeedClient {
    let mut config = AppConfig::default();
    config.mutations.toggle_failure_policy = policy;
    FeedClient::new(&config, transport, Arc::new(session)).expect("valid config")
}

pub fn client_with_config(
    config: &AppConfig,
    transport: Arc<dyn FeedTransport>,
    session: StaticSession,
) -> FeedClient {
    FeedClient::new(config, transport, Arc::new(session)).expect("valid config")
}

pub async fn like_state(client: &FeedClient, query: &QueryKey, item_id: &ItemId) -> Option<(u32, bool)> {
    client
        .snapshot(query)
        .await?
        .items
        .into_iter()
        .find(|item| &item.id == item_id)
        .map(|item| (item.like_count, item.liked_by_me))
}

/// リモート呼び出しを任意の時点まで止めておけるトランスポート
///
/// 呼び出しが届くと `wait_for` に通知し、`release` で許可されるまで
/// 内側のサーバーへ転送しない。許可は到着順に与えられる。
pub struct GatedTransport {
    inner: InMemoryFeedServer,
    gates: HashMap<RemoteOperation, Arc<Semaphore>>,
    arrivals_tx: mpsc::UnboundedSender<RemoteOperation>,
    arrivals_rx: Mutex<mpsc::UnboundedReceiver<RemoteOperation>>,
}

impl GatedTransport {
    pub fn new(inner: InMemoryFeedServer, gated: &[RemoteOperation]) -> Self {
        let (arrivals_tx, arrivals_rx) = mpsc::unbounded_channel();
        let gates = gated
            .iter()
            .map(|operation| (*operation, Arc::new(Semaphore::new(0))))
            .collect();
        Self {
            inner,
            gates,
            arrivals_tx,
            arrivals_rx: Mutex::new(arrivals_rx),
        }
    }

    /// `operation` の呼び出しが届くまで待つ
    pub async fn wait_for(&self, operation: RemoteOperation) {
        let mut arrivals = self.arrivals_rx.lock().await;
        loop {
            match arrivals.recv().await {
                Some(arrived) if arrived == operation => return,
                Some(_) => continue,
                None => panic!("transport dropped while waiting for {operation:?}"),
            }
        }
    }

    pub fn release(&self, operation: RemoteOperation, count: usize) {
        if let Some(gate) = self.gates.get(&operation) {
            gate.add_permits(count);
        }
    }

    async fn pass(&self, operation: RemoteOperation) {
        let _ = self.arrivals_tx.send(operation);
        if let Some(gate) = self.gates.get(&operation) {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

#[async_trait]
impl FeedTransport for GatedTransport {
    async fn fetch_page(
        &self,
        query: &QueryKey,
        cursor: Option<&FeedCursor>,
    ) -> Result<FeedPage, TransportError> {
        self.pass(RemoteOperation::FetchPage).await;
        self.inner.fetch_page(query, cursor).await
    }

    async fn request_toggle_like(
        &self,
        item_id: &ItemId,
    ) -> Result<ToggleLikeResponse, TransportError> {
        self.pass(RemoteOperation::ToggleLike).await;
        self.inner.request_toggle_like(item_id).await
    }

    async fn request_create_item(&self, content: &str) -> Result<CreatedItem, TransportError> {
        self.pass(RemoteOperation::CreateItem).await;
        self.inner.request_create_item(content).await
    }
}

/// 呼び出しは到着順にサーバーへ転送し、いいね応答だけを個別に返せるトランスポート
///
/// `release_toggle_response(n)` で n 番目に届いた応答を呼び出し元へ返す。
pub struct HeldResponseTransport {
    inner: InMemoryFeedServer,
    held: Mutex<Vec<Arc<Semaphore>>>,
    arrivals_tx: mpsc::UnboundedSender<usize>,
    arrivals_rx: Mutex<mpsc::UnboundedReceiver<usize>>,
}

impl HeldResponseTransport {
    pub fn new(inner: InMemoryFeedServer) -> Self {
        let (arrivals_tx, arrivals_rx) = mpsc::unbounded_channel();
        Self {
            inner,
            held: Mutex::new(Vec::new()),
            arrivals_tx,
            arrivals_rx: Mutex::new(arrivals_rx),
        }
    }

    /// サーバーが処理を終えた応答が1件保留されるまで待ち、その番号を返す
    pub async fn wait_for_toggle_response(&self) -> usize {
        self.arrivals_rx
            .lock()
            .await
            .recv()
            .await
            .expect("transport dropped")
    }

    pub async fn release_toggle_response(&self, index: usize) {
        self.held.lock().await[index].add_permits(1);
    }
}

#[async_trait]
impl FeedTransport for HeldResponseTransport {
    async fn fetch_page(
        &self,
        query: &QueryKey,
        cursor: Option<&FeedCursor>,
    ) -> Result<FeedPage, TransportError> {
        self.inner.fetch_page(query, cursor).await
    }

    async fn request_toggle_like(
        &self,
        item_id: &ItemId,
    ) -> Result<ToggleLikeResponse, TransportError> {
        let response = self.inner.request_toggle_like(item_id).await;
        let gate = Arc::new(Semaphore::new(0));
        let index = {
            let mut held = self.held.lock().await;
            held.push(Arc::clone(&gate));
            held.len() - 1
        };
        let _ = self.arrivals_tx.send(index);
        gate.acquire().await.expect("gate closed").forget();
        response
    }

    async fn request_create_item(&self, content: &str) -> Result<CreatedItem, TransportError> {
        self.inner.request_create_item(content).await
    }
}
