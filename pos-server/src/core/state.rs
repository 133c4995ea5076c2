use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::orders::{OrderController, OrderSequence, SqliteOrderStore};
use crate::printing::{PrintService, ReceiptFormatter};
use crate::realtime::RealtimeHub;
use crate::utils::time::{Clock, SystemClock};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，每个请求 clone 一次。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | clock | Arc<dyn Clock> | 时钟 (测试可固定) |
/// | hub | Arc<RealtimeHub> | 实时事件房间 |
/// | orders | Arc<OrderController> | 订单生命周期 |
/// | printing | Arc<PrintService> | 小票打印 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 时钟
    pub clock: Arc<dyn Clock>,
    /// 实时事件 hub (WS 连接与订单控制器共享同一实例)
    pub hub: Arc<RealtimeHub>,
    /// 订单控制器
    pub orders: Arc<OrderController>,
    /// 打印服务
    pub printing: Arc<PrintService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录
    /// 2. 打开数据库并执行迁移
    /// 3. 组装服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir()?;
        let db = DbService::new(&config.database_url).await?;
        Ok(Self::build(config.clone(), db.pool, Arc::new(SystemClock)))
    }

    /// 用现成的连接池和时钟组装服务 (测试可注入固定时钟)
    pub fn build(config: Config, pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let hub = Arc::new(RealtimeHub::new(config.realtime_queue_capacity));

        let sequence = OrderSequence::new(clock.clone(), config.timezone);
        let store = Arc::new(SqliteOrderStore::new(pool.clone(), sequence, clock.clone()));

        let orders = Arc::new(OrderController::new(
            store.clone(),
            hub.clone(),
            config.timezone,
        ));
        let printing = Arc::new(PrintService::new(
            store,
            pool.clone(),
            ReceiptFormatter::new(config.store_name.clone(), config.timezone),
            config.printer_port,
            config.printer_timeout(),
        ));

        Self {
            config,
            pool,
            jwt_service,
            clock,
            hub,
            orders,
            printing,
        }
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 当前 Unix millis
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }
}
