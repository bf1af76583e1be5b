//! 会话管理
//!
//! 每个会话一个 ConversationEngine，各自放在独立的互斥锁里：
//! 同一会话的一整轮（抽取 → 判定 → 组装 → 调用模型 → 写日志）是一个临界区，不同会话完全并行。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::core::EngineFactory;
use crate::dialogue::{ConversationEngine, EngineSnapshot};

/// 会话 ID（由前端提供，或由 [`SessionManager::new_session_id`] 生成）
pub type SessionId = String;

/// 单个会话：引擎 + 最后活跃时间
pub struct Session {
    pub id: SessionId,
    engine: ConversationEngine,
    last_active: Instant,
}

impl Session {
    fn new(id: SessionId, engine: ConversationEngine) -> Self {
        Self {
            id,
            engine,
            last_active: Instant::now(),
        }
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_active.elapsed() > timeout
    }
}

/// 会话管理器
pub struct SessionManager {
    factory: EngineFactory,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    session_timeout: Duration,
}

impl SessionManager {
    pub fn new(factory: EngineFactory, session_timeout_secs: u64) -> Self {
        Self {
            factory,
            sessions: RwLock::new(HashMap::new()),
            session_timeout: Duration::from_secs(session_timeout_secs),
        }
    }

    pub fn new_session_id() -> SessionId {
        format!("session_{}", uuid::Uuid::new_v4())
    }

    /// 获取或创建会话
    async fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return session.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(session = %id, "session created");
                Arc::new(Mutex::new(Session::new(id.to_string(), self.factory.create())))
            })
            .clone()
    }

    /// 在会话内处理一条输入；同一会话的并发请求按到达顺序串行执行
    pub async fn handle_turn(&self, id: &str, text: &str) -> String {
        let session = self.get_or_create(id).await;
        let mut session = session.lock().await;
        session.last_active = Instant::now();
        session.engine.handle_turn(text).await
    }

    pub async fn snapshot(&self, id: &str) -> Option<EngineSnapshot> {
        let session = self.sessions.read().await.get(id).cloned()?;
        let session = session.lock().await;
        Some(session.engine.snapshot())
    }

    /// 清空会话的槽位与日志；会话不存在时返回 false
    pub async fn reset(&self, id: &str) -> bool {
        let Some(session) = self.sessions.read().await.get(id).cloned() else {
            return false;
        };
        session.lock().await.engine.reset();
        true
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// 移除闲置超时的会话，返回移除数量；正在处理中的会话（锁被占用）跳过
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let timeout = self.session_timeout;
        sessions.retain(|_, s| match s.try_lock() {
            Ok(s) => !s.is_expired(timeout),
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, "expired sessions cleaned up");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dialogue::Slot;
    use crate::llm::MockLlmClient;

    fn manager(timeout_secs: u64) -> SessionManager {
        let cfg = AppConfig::default();
        let factory = EngineFactory::new(Arc::new(MockLlmClient::new()), None, &cfg);
        SessionManager::new(factory, timeout_secs)
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let mgr = manager(60);
        for (id, destination) in [("alice", "Bali"), ("bob", "Lisbon")] {
            mgr.handle_turn(id, "Planning a trip").await;
            mgr.handle_turn(id, destination).await;
        }

        let alice = mgr.snapshot("alice").await.unwrap();
        let bob = mgr.snapshot("bob").await.unwrap();
        assert_eq!(alice.slots.get(Slot::Destination), Some("Bali"));
        assert_eq!(bob.slots.get(Slot::Destination), Some("Lisbon"));
        assert_eq!(mgr.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_one_session_are_serialized() {
        let mgr = Arc::new(manager(60));
        let mut handles = Vec::new();
        for text in ["Bali", "$2000", "June", "2 people"] {
            let mgr = mgr.clone();
            handles.push(tokio::spawn(async move {
                mgr.handle_turn("shared", text).await
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let snap = mgr.snapshot("shared").await.unwrap();
        assert_eq!(snap.log.len(), 8);
    }

    #[tokio::test]
    async fn test_reset_and_remove() {
        let mgr = manager(60);
        assert!(!mgr.reset("ghost").await);

        mgr.handle_turn("carol", "Bali").await;
        assert!(mgr.reset("carol").await);
        let snap = mgr.snapshot("carol").await.unwrap();
        assert!(snap.log.is_empty());
        assert_eq!(snap.missing.len(), 6);

        assert!(mgr.remove("carol").await);
        assert!(mgr.snapshot("carol").await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let mgr = manager(0);
        mgr.handle_turn("dave", "Bali").await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(mgr.cleanup_expired().await, 1);
        assert_eq!(mgr.session_count().await, 0);
    }
}
