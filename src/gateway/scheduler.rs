//! Cron-driven pass scheduling.

use super::Gateway;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use croner::Cron;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Next firing of `cron` strictly after `after`, in `tz`.
pub fn next_run(cron: &Cron, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Tz>> {
    cron.find_next_occurrence(&after.with_timezone(&tz), false)
        .ok()
}

impl Gateway {
    /// Background task: run a pass at every cron firing.
    pub async fn scheduler_loop(self: Arc<Self>, cron: Cron, expression: String) {
        let tz = self.timezone();
        info!("scheduler: started with cron '{expression}' in timezone '{tz}'");

        loop {
            let now = Utc::now();
            let Some(next) = next_run(&cron, tz, now) else {
                error!("scheduler: cron '{expression}' has no future occurrence, stopping");
                return;
            };
            info!("scheduler: next pass at {}", next.format("%Y-%m-%d %H:%M %Z"));

            let wait = (next.with_timezone(&Utc) - now)
                .to_std()
                .unwrap_or_default();
            tokio::time::sleep(wait).await;

            info!("scheduler: running scheduled pass");
            let report = self.run_pass(None).await;
            if !report.success() {
                warn!("scheduler: pass {} had problems: {:?}", report.id, report.errors);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use planner_core::config::parse_cron;

    #[test]
    fn test_next_run_in_zone() {
        let cron = parse_cron("00 8 * * *").unwrap();
        let tz: Tz = "Asia/Dhaka".parse().unwrap();
        // 2026-02-20 01:00 UTC is 07:00 in Dhaka.
        let after = Utc.with_ymd_and_hms(2026, 2, 20, 1, 0, 0).unwrap();
        let next = next_run(&cron, tz, after).unwrap();
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2026-02-20 08:00");
        assert_eq!(next.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 2, 20, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_rolls_to_next_day() {
        let cron = parse_cron("00 8 * * *").unwrap();
        let tz: Tz = "Asia/Dhaka".parse().unwrap();
        let after = Utc.with_ymd_and_hms(2026, 2, 20, 2, 0, 0).unwrap();
        let next = next_run(&cron, tz, after).unwrap();
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2026-02-21 08:00");
    }

    #[test]
    fn test_next_run_skips_to_next_weekday() {
        let cron = parse_cron("00 8 * * 1-5").unwrap();
        let tz: Tz = "Asia/Dhaka".parse().unwrap();
        // Friday 08:00 Dhaka has just passed.
        let after = Utc.with_ymd_and_hms(2026, 2, 20, 2, 0, 0).unwrap();
        let next = next_run(&cron, tz, after).unwrap();
        assert_eq!(next.format("%Y-%m-%d %H:%M").to_string(), "2026-02-23 08:00");
    }
}
