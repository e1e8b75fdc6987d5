use crate::application::ports::session_provider::{SessionProvider, SessionState, Viewer};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// プロセス内で保持するセッション
#[derive(Clone)]
pub struct StaticSession {
    state: Arc<RwLock<SessionState>>,
}

impl StaticSession {
    pub fn new(state: SessionState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn authenticated(viewer: Viewer) -> Self {
        Self::new(SessionState::Authenticated(viewer))
    }

    pub fn unauthenticated() -> Self {
        Self::new(SessionState::Unauthenticated)
    }

    pub async fn sign_in(&self, viewer: Viewer) {
        info!(viewer = %viewer.id, "Session authenticated");
        *self.state.write().await = SessionState::Authenticated(viewer);
    }

    pub async fn sign_out(&self) {
        info!("Session signed out");
        *self.state.write().await = SessionState::Unauthenticated;
    }
}

impl Default for StaticSession {
    fn default() -> Self {
        Self::new(SessionState::Loading)
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current(&self) -> SessionState {
        self.state.read().await.clone()
    }
}
