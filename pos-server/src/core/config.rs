use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::auth::JwtConfig;
use crate::utils::time::{DEFAULT_TIMEZONE, parse_timezone};

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | DATABASE_URL | sqlite:{WORK_DIR}/pos.db | SQLite 连接串 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_SECRET | (随机) | JWT 密钥，至少 32 字符 |
/// | JWT_EXPIRATION_MINUTES | 480 | 令牌有效期 |
/// | BUSINESS_TIMEZONE | Asia/Kolkata | 业务时区 (订单号日期、按日查询) |
/// | PRINTER_PORT | 9100 | 小票打印机端口 |
/// | PRINTER_TIMEOUT_MS | 5000 | 打印机连接/空闲超时 |
/// | STORE_NAME | THE CUTTING CHAI | 小票抬头 |
/// | CORS_ORIGIN | (任意) | 允许的前端来源 |
/// | REALTIME_QUEUE_CAPACITY | 64 | 每个实时连接的队列容量 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录，不设置则只输出到 stdout |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/chai HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 连接串
    pub database_url: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 业务时区
    pub timezone: Tz,
    /// 打印机端口
    pub printer_port: u16,
    /// 打印机超时 (毫秒)
    pub printer_timeout_ms: u64,
    /// 小票抬头
    pub store_name: String,
    /// CORS 来源，`None` 表示允许任意来源
    pub cors_origin: Option<String>,
    /// 实时连接队列容量
    pub realtime_queue_capacity: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let database_url = env_opt("DATABASE_URL").unwrap_or_else(|| {
            format!(
                "sqlite:{}",
                PathBuf::from(&work_dir).join("pos.db").display()
            )
        });

        Self {
            http_port: env_or("HTTP_PORT", 5000),
            database_url,
            jwt: JwtConfig::from_env(environment == "production"),
            timezone: env_opt("BUSINESS_TIMEZONE")
                .map(|name| parse_timezone(&name))
                .unwrap_or(DEFAULT_TIMEZONE),
            printer_port: env_or("PRINTER_PORT", chai_printer::DEFAULT_PORT),
            printer_timeout_ms: env_or("PRINTER_TIMEOUT_MS", 5000),
            store_name: env_opt("STORE_NAME").unwrap_or_else(|| "THE CUTTING CHAI".into()),
            cors_origin: env_opt("CORS_ORIGIN"),
            realtime_queue_capacity: env_or(
                "REALTIME_QUEUE_CAPACITY",
                crate::realtime::hub::DEFAULT_QUEUE_CAPACITY,
            ),
            work_dir,
            environment,
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.database_url = format!(
            "sqlite:{}",
            PathBuf::from(&config.work_dir).join("pos.db").display()
        );
        config
    }

    /// 打印机超时
    pub fn printer_timeout(&self) -> Duration {
        Duration::from_millis(self.printer_timeout_ms)
    }

    /// 确保工作目录存在
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
