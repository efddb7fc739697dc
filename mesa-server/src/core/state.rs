use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use crate::booking::BookingCoordinator;
use crate::core::Config;
use crate::db::DbService;
use crate::floor::{FloorRepository, FloorService};
use crate::reservations::{ReservationStorage, ReservationsManager};
use crate::schedule::{ScheduleRepository, ScheduleService};
use crate::utils::AppResult;

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增。
///
/// 配置资源 (桌台、区域、营业时间) 每次变更递增版本号，
/// 客户端可通过版本号判断本地缓存是否过期。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号，不存在返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是预订引擎的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Arc<Config> | 配置项 (不可变) |
/// | db | DbService | 嵌入式数据库 |
/// | floor | Arc<FloorService> | 桌台/区域 + 缓存楼面模型 |
/// | schedule | Arc<ScheduleService> | 营业时间表 |
/// | manager | Arc<ReservationsManager> | 预订事件溯源 |
/// | coordinator | Arc<BookingCoordinator> | 准入并发边界 |
/// | resource_versions | Arc<ResourceVersions> | 配置资源版本 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: DbService,
    pub floor: Arc<FloorService>,
    pub schedule: Arc<ScheduleService>,
    pub manager: Arc<ReservationsManager>,
    pub coordinator: Arc<BookingCoordinator>,
    pub resource_versions: Arc<ResourceVersions>,
    pub started_at: Instant,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/mesa.db)
    /// 3. 各仓库与服务 (Floor, Schedule, Reservations)
    /// 4. 预订协调器
    pub fn initialize(config: &Config) -> AppResult<Self> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| crate::utils::AppError::internal(format!("work dir: {e}")))?;

        let db_path = config.database_dir().join("mesa.db");
        let db = DbService::new(&db_path)?;

        Self::initialize_with_db(config, db)
    }

    /// 在给定数据库上装配全部服务 (测试注入内存库)
    pub fn initialize_with_db(config: &Config, db: DbService) -> AppResult<Self> {
        let config = Arc::new(config.clone());

        let floor = Arc::new(FloorService::new(FloorRepository::new(db.database())?));
        let schedule = Arc::new(ScheduleService::new(ScheduleRepository::new(
            db.database(),
        )?));
        let storage = ReservationStorage::new(db.database())?;
        let manager = Arc::new(ReservationsManager::new(storage, config.timezone));

        let coordinator = Arc::new(BookingCoordinator::new(
            config.clone(),
            floor.clone(),
            schedule.clone(),
            manager.clone(),
        ));

        tracing::info!(
            tz = %config.timezone,
            granularity = config.slot_granularity_minutes,
            "Server state initialized"
        );

        Ok(Self {
            config,
            db,
            floor,
            schedule,
            manager,
            coordinator,
            resource_versions: Arc::new(ResourceVersions::new()),
            started_at: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
