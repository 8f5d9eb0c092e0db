use std::sync::Arc;

use crate::core::Config;
use crate::core::tasks::BackgroundTasks;
use crate::db::{ConnectionError, ConnectionManager};
use crate::orders::OrderEngine;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 连接管理器是显式构造并注入的实例 (而非全局单例)，
/// 订单引擎和库存账本通过它访问数据库。
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | conn | Arc<ConnectionManager> | 弹性数据库连接管理器 |
/// | orders | OrderEngine | 订单事务引擎 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 弹性数据库连接管理器
    pub conn: Arc<ConnectionManager>,
    /// 订单事务引擎
    pub orders: OrderEngine,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 连接管理器，并以有界退避重试验证连接（耗尽重试则视为致命错误）
    /// 2. 订单引擎（内部构建仓储和库存账本）
    pub async fn initialize(config: &Config) -> Result<Self, ConnectionError> {
        let conn = Arc::new(ConnectionManager::new(config.connection_settings()));
        conn.test_connection().await?;

        let orders = OrderEngine::new(Arc::clone(&conn));

        Ok(Self {
            config: config.clone(),
            conn,
            orders,
        })
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 中调用
    ///
    /// 启动的任务：
    /// - 数据库后台重连循环 (best-effort 自愈)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        self.conn.spawn_reconnect_loop(tasks);
    }

    /// 获取连接管理器
    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.conn
    }
}
