//! Production credited for time spent away.

use crate::error::ActionError;
use rust_decimal::Decimal;
use sim_core::config::OfflineTuning;
use sim_core::number::{per_elapsed, saturating_mul};
use sim_core::{Amount, Millis, Player};
use tracing::info;

#[derive(Clone, Debug, PartialEq)]
pub struct OfflineReport {
    pub elapsed_ms: Millis,
    /// Elapsed time after the cap.
    pub credited_ms: Millis,
    pub earned: Amount,
}

/// `rate × min(elapsed, cap) × efficiency`. Clock skew (negative elapsed)
/// earns nothing.
pub fn offline_earnings(rate: Amount, elapsed_ms: Millis, tuning: &OfflineTuning) -> OfflineReport {
    let credited_ms = elapsed_ms.clamp(0, tuning.cap_ms.max(0));
    let credited = per_elapsed(rate.max(Decimal::ZERO), credited_ms);
    let earned = saturating_mul(credited, tuning.efficiency).max(Decimal::ZERO);
    OfflineReport {
        elapsed_ms,
        credited_ms,
        earned,
    }
}

/// Credit the player for the time between `saved_at` and `now`.
pub fn apply_offline(
    player: &mut Player,
    rate: Amount,
    saved_at: Millis,
    now: Millis,
    tuning: &OfflineTuning,
) -> Result<OfflineReport, ActionError> {
    let report = offline_earnings(rate, now.saturating_sub(saved_at), tuning);
    if report.earned > Decimal::ZERO {
        player.earn(report.earned)?;
        info!(elapsed_ms = report.elapsed_ms, earned = %report.earned, "offline progress credited");
    }
    Ok(report)
}
