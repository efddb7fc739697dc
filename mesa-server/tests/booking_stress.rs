//! 预订压力测试 - 并发准入不重订
//!
//! 使用 ServerState::initialize_with_db 完整装配，内存数据库。
//! 大量并发请求打同一晚的少量桌台，验证准入后的不变量：
//! 任意桌台在任意时刻最多被一个持有容量的预订占用。

use mesa_server::core::Config;
use mesa_server::db::DbService;
use mesa_server::utils::AppError;
use mesa_server::ServerState;
use shared::models::{DiningTableCreate, OpenInterval, OperatingSchedule, ZoneCreate};
use shared::reservation::{BookingRequest, Customer, ReservationSource};

const TZ: chrono_tz::Tz = chrono_tz::Europe::Madrid;
const DAY: &str = "2031-06-13";

fn test_config() -> Config {
    Config {
        work_dir: String::new(),
        http_port: 0,
        timezone: TZ,
        environment: "test".into(),
        slot_granularity_minutes: 30,
        max_alternative_slots: 3,
        lock_wait_ms: 10_000,
        duration_small_minutes: 90,
        duration_large_minutes: 120,
        large_party_threshold: 4,
    }
}

/// 装配内存状态并种入 `table_count` 张同容量桌台
fn seeded_state(table_count: usize, capacity: i32) -> ServerState {
    let config = test_config();
    let db = DbService::in_memory().expect("in-memory db");
    let state = ServerState::initialize_with_db(&config, db).expect("state");

    let zone = state
        .floor
        .repository()
        .create_zone(ZoneCreate {
            name: "Main".into(),
            description: None,
        })
        .expect("zone");
    for i in 0..table_count {
        state
            .floor
            .repository()
            .create_table(DiningTableCreate {
                name: format!("T{i}"),
                zone_id: zone.id,
                capacity: Some(capacity),
                min_capacity: None,
                combinable_with: None,
            })
            .expect("table");
    }

    state
        .schedule
        .update(OperatingSchedule::uniform(vec![OpenInterval::new(
            "12:00", "23:30",
        )]))
        .expect("schedule");

    state
}

fn booking(time: &str, party_size: i32) -> BookingRequest {
    BookingRequest {
        customer: Customer {
            name: "Stress".into(),
            phone: "+34600999888".into(),
            email: None,
        },
        party_size,
        date: DAY.into(),
        time: time.into(),
        source: ReservationSource::Online,
        zone_id: None,
        preferred_table_id: None,
        special_requests: None,
        command_id: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_admission_never_overbooks() {
    let state = seeded_state(3, 4);
    let slots = ["13:00", "14:00", "20:00", "21:00"];

    // 64 个并发请求随机打 4 个时段，每个时段最多容纳 3 桌
    let mut handles = Vec::new();
    for i in 0..64 {
        let coordinator = state.coordinator.clone();
        let time = slots[i % slots.len()];
        handles.push(tokio::spawn(async move {
            coordinator.book(booking(time, 4)).await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(_) => admitted += 1,
            Err(AppError::NoCapacity { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // 时段互不重叠 (90 分钟时长, 时段间隔 60 分钟 -> 13:00 与 14:00 重叠)
    // 不依赖精确数目，但上限是确定的: 任一时刻 3 张桌
    assert!(admitted >= 4, "at least one admission per empty hour");

    // 核心不变量: 重放当日所有预订，任何桌台无重叠占用
    let reservations = state.manager.find_by_day(DAY).expect("list");
    for a in &reservations {
        for b in &reservations {
            if a.id >= b.id || !a.status.holds_capacity() || !b.status.holds_capacity() {
                continue;
            }
            let windows_overlap = a.requested_at < b.ends_at() && b.requested_at < a.ends_at();
            if windows_overlap {
                for table in &a.assigned_table_ids {
                    assert!(
                        !b.assigned_table_ids.contains(table),
                        "table {table} double-booked by {} and {}",
                        a.reservation_number,
                        b.reservation_number
                    );
                }
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn one_table_one_winner_per_slot() {
    let state = seeded_state(1, 4);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let coordinator = state.coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator.book(booking("20:00", 4)).await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.expect("task").is_ok() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn state_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("mesa.db");
    let config = test_config();

    let (id, number) = {
        let db = DbService::new(&db_path).expect("db");
        let state = ServerState::initialize_with_db(&config, db).expect("state");
        let zone = state
            .floor
            .repository()
            .create_zone(ZoneCreate {
                name: "Main".into(),
                description: None,
            })
            .expect("zone");
        state
            .floor
            .repository()
            .create_table(DiningTableCreate {
                name: "T0".into(),
                zone_id: zone.id,
                capacity: Some(4),
                min_capacity: None,
                combinable_with: None,
            })
            .expect("table");
        state
            .schedule
            .update(OperatingSchedule::uniform(vec![OpenInterval::new(
                "12:00", "23:30",
            )]))
            .expect("schedule");

        let r = state
            .coordinator
            .book(booking("20:00", 2))
            .await
            .expect("book");
        (r.id, r.reservation_number.clone())
        // state (and the open database) dropped here
    };

    let db = DbService::new(&db_path).expect("reopen");
    let state = ServerState::initialize_with_db(&config, db).expect("state");

    let restored = state.manager.get(id).expect("restored");
    assert_eq!(restored.reservation_number, number);

    // 同日再订延续每日计数器，而不是从 0001 重来
    let next = state
        .coordinator
        .book(booking("13:00", 2))
        .await
        .expect("book after restart");
    assert!(next.reservation_number > number);

    // 重启后原时段仍被占
    let report = state
        .coordinator
        .check_availability(DAY, "20:00", 2, None)
        .expect("check");
    assert!(!report.available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_and_rebook_interleaved() {
    let state = seeded_state(1, 4);

    for round in 0..10 {
        let r = state
            .coordinator
            .book(booking("20:00", 2))
            .await
            .unwrap_or_else(|e| panic!("round {round}: {e:?}"));
        state
            .coordinator
            .cancel(r.id, Some("making room".into()))
            .expect("cancel");
    }

    // 10 次取消后时段仍然可订
    let report = state
        .coordinator
        .check_availability(DAY, "20:00", 2, None)
        .expect("check");
    assert!(report.available);

    // 事件流完整保留：每轮 1 创建 + 1 取消
    let all = state.manager.find_by_day(DAY).expect("list");
    assert_eq!(all.len(), 10);
    for r in &all {
        let events = state
            .manager
            .storage()
            .events_for_reservation(r.id)
            .expect("events");
        assert_eq!(events.len(), 2);
    }
}
