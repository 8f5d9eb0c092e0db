//! Connection Resilience Manager
//!
//! 持有唯一的数据库连接句柄，在瞬时故障中保持可用：
//!
//! - [`ConnectionManager::test_connection`] - 有界退避重试的连接验证
//! - [`ConnectionManager::acquire`] - 获取当前句柄 (不存在时建立)
//! - [`ConnectionManager::health_check`] - 健康探测
//! - [`ConnectionManager::spawn_reconnect_loop`] - 后台静默重连 (best-effort)
//!
//! 管理器是显式构造、显式注入的实例；建立/重连在内部串行化，
//! 并发 `acquire()` 不会各自触发独立的重试风暴。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::schema;

/// 连接层错误
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("datastore connection failed: {0}")]
    Connect(#[from] surrealdb::Error),

    #[error("datastore unreachable after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: surrealdb::Error,
    },
}

/// 连接管理器设置
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// 数据库端点 (`mem://`、`rocksdb://path` 等)
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    /// 重试次数上限
    pub max_retries: u32,
    /// 退避基础延迟，第 n 次失败后等待 n × base
    pub retry_base: Duration,
    /// 后台重连检查间隔
    pub reconnect_interval: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "storefront".to_string(),
            database: "storefront".to_string(),
            max_retries: 5,
            retry_base: Duration::from_millis(2000),
            reconnect_interval: Duration::from_secs(30),
        }
    }
}

/// 弹性连接管理器 — 唯一的数据库句柄所有者
pub struct ConnectionManager {
    settings: ConnectionSettings,
    /// 当前句柄；断开后保留旧句柄，重建时整体替换
    handle: RwLock<Option<Surreal<Any>>>,
    connected: AtomicBool,
    /// 串行化建立/重连，防止并发重试风暴
    establish_lock: Mutex<()>,
}

impl ConnectionManager {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            handle: RwLock::new(None),
            connected: AtomicBool::new(false),
            establish_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// 管理器当前是否认为连接可用
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// 标记连接断开 (下次 acquire / 后台循环会重建)
    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }

    /// 建立连接：connect → use_ns/use_db → 应用 schema → 替换句柄
    async fn establish(&self) -> Result<Surreal<Any>, ConnectionError> {
        let db = connect(self.settings.endpoint.as_str()).await?;
        db.use_ns(self.settings.namespace.as_str())
            .use_db(self.settings.database.as_str())
            .await?;
        schema::apply(&db).await?;

        *self.handle.write().await = Some(db.clone());
        self.connected.store(true, Ordering::Relaxed);
        tracing::info!(endpoint = %self.settings.endpoint, "Datastore connection established");
        Ok(db)
    }

    /// 获取当前句柄；不存在时建立一个
    ///
    /// 请求路径上只做单次建立尝试 (不重试)，建立过程串行化，
    /// 并发调用共享同一次尝试的结果。
    pub async fn acquire(&self) -> Result<Surreal<Any>, ConnectionError> {
        if self.is_connected()
            && let Some(db) = self.handle.read().await.clone()
        {
            return Ok(db);
        }

        let _guard = self.establish_lock.lock().await;
        // Double-check: another caller may have reconnected while we waited
        if self.is_connected()
            && let Some(db) = self.handle.read().await.clone()
        {
            return Ok(db);
        }
        self.establish().await
    }

    /// 执行一次连接 + 活性探测 (不重试)
    async fn probe(&self) -> Result<(), surrealdb::Error> {
        let db = match self.acquire().await {
            Ok(db) => db,
            Err(ConnectionError::Connect(e)) => return Err(e),
            Err(ConnectionError::RetriesExhausted { last, .. }) => return Err(last),
        };
        if let Err(e) = db.query("RETURN 1").await.and_then(|r| r.check()) {
            self.mark_disconnected();
            return Err(e);
        }
        Ok(())
    }

    /// 验证连接：建立 + 活性查询，失败时有界退避重试
    ///
    /// 第 n 次失败后等待 `retry_base × n`，最多 `max_retries` 次；
    /// 耗尽后返回 [`ConnectionError::RetriesExhausted`]。
    /// 启动时该错误为致命错误，请求路径上映射为 503。
    pub async fn test_connection(&self) -> Result<(), ConnectionError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.probe().await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Datastore connection verified after retry");
                    }
                    return Ok(());
                }
                Err(err) => {
                    if attempt >= self.settings.max_retries {
                        tracing::error!(
                            attempts = attempt,
                            error = %err,
                            "Datastore unreachable, retries exhausted"
                        );
                        return Err(ConnectionError::RetriesExhausted {
                            attempts: attempt,
                            last: err,
                        });
                    }
                    let delay = self.settings.retry_base * attempt;
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Datastore connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// 健康检查：true 当且仅当句柄存活
    ///
    /// 若当前标记为断开，先做一次静默重建再探测；否则只探测。
    pub async fn health_check(&self) -> bool {
        if !self.is_connected() {
            let _guard = self.establish_lock.lock().await;
            if !self.is_connected() && self.establish().await.is_err() {
                return false;
            }
        }
        self.probe().await.is_ok()
    }

    /// 有序关闭：清空句柄，后续 `acquire()` 会重新建立
    pub async fn shutdown(&self) {
        self.handle.write().await.take();
        self.connected.store(false, Ordering::Relaxed);
        tracing::info!("Datastore connection closed");
    }

    /// 启动后台重连循环
    ///
    /// 固定间隔检查，断开时静默重连；失败只记录日志，不向外传播。
    /// 任务随 [`BackgroundTasks`] 的 shutdown 令牌干净退出。
    pub fn spawn_reconnect_loop(self: &Arc<Self>, tasks: &mut BackgroundTasks) {
        let manager = Arc::clone(self);
        let token = tasks.shutdown_token();
        tasks.spawn("datastore_reconnect", TaskKind::Periodic, async move {
            let mut ticker = tokio::time::interval(manager.settings.reconnect_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick fires immediately; skip it so the loop waits a full interval
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if manager.is_connected() {
                            continue;
                        }
                        let _guard = manager.establish_lock.lock().await;
                        if manager.is_connected() {
                            continue;
                        }
                        match manager.establish().await {
                            Ok(_) => tracing::info!("Datastore connection restored"),
                            Err(err) => {
                                tracing::warn!(error = %err, "Background reconnect attempt failed");
                            }
                        }
                    }
                }
            }
        });
    }
}
