//! Operating Schedule API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/schedule | GET | 当前每周营业时间表 |
//! | /api/schedule | PUT | 整表替换 (校验后生效) |

use axum::{Json, Router, extract::State, routing::get};
use shared::models::OperatingSchedule;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "operating_schedule";

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/schedule", get(get_schedule).put(put_schedule))
}

/// GET /api/schedule
pub async fn get_schedule(
    State(state): State<ServerState>,
) -> AppResult<Json<OperatingSchedule>> {
    let schedule = state.schedule.schedule()?;
    Ok(Json((*schedule).clone()))
}

/// PUT /api/schedule - 整表替换
pub async fn put_schedule(
    State(state): State<ServerState>,
    Json(payload): Json<OperatingSchedule>,
) -> AppResult<Json<OperatingSchedule>> {
    validate_schedule(&payload)?;
    let schedule = state.schedule.update(payload)?;

    let version = state.resource_versions.increment(RESOURCE);
    tracing::info!(version, "Operating schedule replaced");
    Ok(Json((*schedule).clone()))
}

/// 每个区间必须是合法 `HH:MM` 且 open < close；区间不得互相重叠
fn validate_schedule(schedule: &OperatingSchedule) -> AppResult<()> {
    for (day, intervals) in schedule.days.iter().enumerate() {
        let mut parsed = Vec::with_capacity(intervals.len());
        for interval in intervals {
            let open = interval.open_time().ok_or_else(|| {
                AppError::validation(format!("Day {day}: invalid open time '{}'", interval.open))
            })?;
            let close = interval.close_time().ok_or_else(|| {
                AppError::validation(format!(
                    "Day {day}: invalid close time '{}'",
                    interval.close
                ))
            })?;
            if open >= close {
                return Err(AppError::validation(format!(
                    "Day {day}: interval {}-{} is empty or inverted",
                    interval.open, interval.close
                )));
            }
            parsed.push((open, close));
        }
        parsed.sort();
        for pair in parsed.windows(2) {
            if pair[1].0 < pair[0].1 {
                return Err(AppError::validation(format!(
                    "Day {day}: open intervals overlap"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::OpenInterval;

    #[test]
    fn accepts_split_service_days() {
        let schedule = OperatingSchedule::uniform(vec![
            OpenInterval::new("12:00", "14:30"),
            OpenInterval::new("19:00", "22:30"),
        ]);
        assert!(validate_schedule(&schedule).is_ok());
    }

    #[test]
    fn rejects_inverted_and_overlapping_intervals() {
        let inverted = OperatingSchedule::uniform(vec![OpenInterval::new("14:00", "12:00")]);
        assert!(validate_schedule(&inverted).is_err());

        let overlapping = OperatingSchedule::uniform(vec![
            OpenInterval::new("12:00", "16:00"),
            OpenInterval::new("15:00", "22:00"),
        ]);
        assert!(validate_schedule(&overlapping).is_err());
    }

    #[test]
    fn rejects_malformed_times() {
        let bad = OperatingSchedule::uniform(vec![OpenInterval::new("noon", "22:00")]);
        assert!(validate_schedule(&bad).is_err());
    }
}
