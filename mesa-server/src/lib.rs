//! Mesa Server - 餐厅预订准入与排桌引擎
//!
//! # 架构概述
//!
//! 本模块是 Mesa Server 的主入口，提供以下核心功能：
//!
//! - **楼面模型** (`floor`): 桌台、区域与可组合桌对
//! - **营业时间表** (`schedule`): 每周开放区间
//! - **可订性计算** (`availability`): 时段量化与替代时段
//! - **预订生命周期** (`reservations`): 事件溯源状态机
//! - **准入协调** (`booking`): 时段锁 + 排桌求解
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! mesa-server/src/
//! ├── core/          # 配置、状态、HTTP 服务
//! ├── db/            # 嵌入式 redb 存储
//! ├── floor/         # 楼面模型与桌台仓库
//! ├── schedule/      # 营业时间表
//! ├── availability/  # 可订性计算 (只读)
//! ├── reservations/  # 预订事件溯源
//! ├── booking/       # 准入协调与时段锁
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志、时间、校验
//! ```

pub mod api;
pub mod availability;
pub mod booking;
pub mod core;
pub mod db;
pub mod floor;
pub mod reservations;
pub mod schedule;
pub mod utils;

// Re-export 公共类型
pub use booking::BookingCoordinator;
pub use core::{Config, Server, ServerState};
pub use reservations::{ReservationStorage, ReservationsManager};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    __  ___
   /  |/  /__  _________ _
  / /|_/ / _ \/ ___/ __ `/
 / /  / /  __(__  ) /_/ /
/_/  /_/\___/____/\__,_/
    "#
    );
}

/// 设置运行环境: dotenv、工作目录、日志
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_dir();
    let log_level = std::env::var("LOG_LEVEL").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.to_str());

    Ok(())
}
