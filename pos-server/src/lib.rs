//! Cutting Chai POS Server - 多门店奶茶连锁收银后端
//!
//! # 架构概述
//!
//! - **订单号** (`orders::sequence`): 按 (门店, 营业日) 原子递增的订单序号
//! - **订单生命周期** (`orders::controller`): ongoing → completed | cancelled，按门店限定可见范围
//! - **实时推送** (`realtime`): `branch:<code>` / `admins` 房间，WebSocket 传输
//! - **小票打印** (`printing`): 原始 TCP 9100，失败降级为 202，不影响订单
//! - **数据库** (`db`): SQLite (sqlx)，嵌入式迁移
//! - **认证** (`auth`): JWT + Argon2
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/          # 配置、状态、错误、HTTP 服务器
//! ├── auth/          # JWT 认证、中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 连接池与仓储
//! ├── orders/        # 订单号、订单存储、生命周期控制
//! ├── printing/      # 小票格式化与打印服务
//! ├── realtime/      # 房间 hub 与 WebSocket
//! └── utils/         # 日志、时区、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod printing;
pub mod realtime;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderController, OrderSequence};
pub use realtime::RealtimeHub;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境: 加载 .env，初始化日志
///
/// 日志相关环境变量 (`LOG_LEVEL`, `LOG_DIR`, `LOG_JSON`) 在 [`Config`] 之前读取，
/// 保证配置加载阶段的告警也能输出。
pub fn setup_environment() -> anyhow::Result<()> {
    if let Err(e) = dotenv::dotenv() {
        // .env 可选
        eprintln!("No .env file loaded: {e}");
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty());
    let json = std::env::var("LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    init_logger_with_file(log_level.as_deref(), json, log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ________          _
  / ____/ /_  ____ _(_)
 / /   / __ \/ __ `/ /
/ /___/ / / / /_/ / /
\____/_/ /_/\__,_/_/
    ____  ____  _____
   / __ \/ __ \/ ___/
  / /_/ / / / /\__ \
 / ____/ /_/ /___/ /
/_/    \____//____/
    "#
    );
}
