//! Storefront Server - 在线商店订单处理后端
//!
//! # 架构概述
//!
//! 核心是订单履约事务引擎及其库存一致性保证，以及所有事务操作依赖的
//! 弹性数据库连接管理器：
//!
//! - **连接管理** (`db::connection`): 有界线性退避重连、健康探测、后台自愈
//! - **库存账本** (`inventory`): 原子条件扣减，库存永不为负
//! - **订单引擎** (`orders`): 校验、定价、编号、单事务提交与取消
//! - **HTTP API** (`api`): RESTful 接口 (薄封装)
//!
//! # 模块结构
//!
//! ```text
//! src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── db/            # 连接管理、schema、模型、仓储
//! ├── inventory/     # 库存账本
//! ├── orders/        # 订单事务引擎、定价、状态机
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误处理、日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use core::{BackgroundTasks, Config, Server, ServerState, TaskKind};
pub use db::{ConnectionError, ConnectionManager, ConnectionSettings};
pub use inventory::{InventoryLedger, LedgerError};
pub use orders::{OrderEngine, OrderError, OrderResult};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
