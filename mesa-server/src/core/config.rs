use std::path::PathBuf;

use chrono_tz::Tz;

/// 服务器配置 - 预订引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/mesa | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | TIMEZONE | Europe/Madrid | 业务时区 |
/// | ENVIRONMENT | development | 运行环境 |
/// | SLOT_GRANULARITY_MINUTES | 30 | 时段粒度 |
/// | MAX_ALTERNATIVE_SLOTS | 3 | 拒绝时返回的替代时段数 |
/// | LOCK_WAIT_MS | 3000 | 时段锁最大等待 (毫秒) |
/// | DURATION_SMALL_MINUTES | 90 | ≤4人默认用餐时长 |
/// | DURATION_LARGE_MINUTES | 120 | >4人默认用餐时长 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/mesa HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 业务时区 (营业时间、时段生成均按此时区)
    pub timezone: Tz,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 预订引擎配置 ===
    /// 时段粒度 (分钟)，营业区间按此量化为可订时段
    pub slot_granularity_minutes: i64,
    /// NoCapacity 拒绝时返回的同日替代时段上限
    pub max_alternative_slots: usize,
    /// 时段锁最大等待时间 (毫秒)，超时返回 Busy
    pub lock_wait_ms: u64,
    /// 小桌默认用餐时长 (分钟)，party_size ≤ large_party_threshold
    pub duration_small_minutes: i64,
    /// 大桌默认用餐时长 (分钟)
    pub duration_large_minutes: i64,
    /// 大小桌分界 (人数)
    pub large_party_threshold: i32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/mesa".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(chrono_tz::Europe::Madrid),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            slot_granularity_minutes: std::env::var("SLOT_GRANULARITY_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            max_alternative_slots: std::env::var("MAX_ALTERNATIVE_SLOTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            lock_wait_ms: std::env::var("LOCK_WAIT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            duration_small_minutes: std::env::var("DURATION_SMALL_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(90),
            duration_large_minutes: std::env::var("DURATION_LARGE_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(120),
            large_party_threshold: std::env::var("LARGE_PARTY_THRESHOLD")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 默认用餐时长 (分钟)，按人数分桶
    pub fn duration_for_party(&self, party_size: i32) -> i64 {
        if party_size <= self.large_party_threshold {
            self.duration_small_minutes
        } else {
            self.duration_large_minutes
        }
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
