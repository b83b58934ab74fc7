//! Random events and player choices.

use crate::error::ActionError;
use catalog::{Catalog, ChoiceEffect};
use rust_decimal::Decimal;
use sim_core::config::EventTuning;
use sim_core::number::{from_count, saturating_mul};
use sim_core::{Amount, EventEffect, GameEvent, GameSession, Millis};
use sim_research::RollSource;
use tracing::{debug, info};

/// What an event roll produced.
#[derive(Clone, Debug, PartialEq)]
pub enum EventRoll {
    /// A timed multiplier, already started.
    Timed(GameEvent),
    /// A choice event waiting for the player; carries its id.
    Choice(String),
}

/// Result of resolving a choice.
#[derive(Clone, Debug, PartialEq)]
pub enum ChoiceOutcome {
    Coins(Amount),
    Event(GameEvent),
    Nothing,
}

/// Start catalog event `id` at `now`.
pub fn start_event(catalog: &Catalog, id: &str, now: Millis) -> Option<GameEvent> {
    let def = catalog.event(id)?;
    let effect = EventEffect {
        multiplier: def.multiplier,
        duration_ms: def.duration_ms,
    };
    Some(GameEvent::starting(def.id.clone(), def.name.clone(), effect, now))
}

/// Add `event` to the session. A running event with the same id is replaced,
/// which restarts its timer.
pub fn activate(session: &mut GameSession, event: GameEvent) {
    session.active_events.retain(|e| e.id != event.id);
    info!(event = %event.id, ends_at = event.ends_at, "event started");
    session.active_events.push(event);
}

/// Roll for a new event.
///
/// Nothing happens while `max_active` events are running or when the first
/// roll misses `chance`. Otherwise one candidate is picked by weight among
/// timed events not already running and choice events (weight 1 each).
pub fn roll_event<R>(
    catalog: &Catalog,
    tuning: &EventTuning,
    active: &[GameEvent],
    now: Millis,
    roll: &mut R,
) -> Option<EventRoll>
where
    R: RollSource + ?Sized,
{
    let running: Vec<&str> = active
        .iter()
        .filter(|e| e.is_active(now))
        .map(|e| e.id.as_str())
        .collect();
    if running.len() >= tuning.max_active {
        return None;
    }
    if roll.roll() >= tuning.chance {
        return None;
    }

    let mut candidates: Vec<(u32, EventRoll)> = Vec::new();
    for def in catalog.events().filter(|d| d.weight > 0 && !running.contains(&d.id.as_str())) {
        if let Some(event) = start_event(catalog, &def.id, now) {
            candidates.push((def.weight, EventRoll::Timed(event)));
        }
    }
    for def in catalog.choice_events() {
        candidates.push((1, EventRoll::Choice(def.id.clone())));
    }
    let total: u32 = candidates.iter().map(|(w, _)| *w).sum();
    if total == 0 {
        return None;
    }
    let mut target = ((roll.roll() * f64::from(total)) as u32).min(total - 1);
    for (weight, candidate) in candidates {
        if target < weight {
            debug!(?candidate, "event rolled");
            return Some(candidate);
        }
        target -= weight;
    }
    None
}

/// Apply choice `index` of choice event `event_id`.
///
/// `rate` is the current effective production, used by choices that pay out
/// seconds of production.
pub fn resolve_choice(
    session: &mut GameSession,
    catalog: &Catalog,
    event_id: &str,
    index: usize,
    rate: Amount,
    now: Millis,
) -> Result<ChoiceOutcome, ActionError> {
    let def = catalog
        .choice_event(event_id)
        .ok_or_else(|| ActionError::UnknownEvent(event_id.to_string()))?;
    let choice = def.choices.get(index).ok_or_else(|| ActionError::UnknownChoice {
        event: event_id.to_string(),
        index,
    })?;
    let outcome = match &choice.effect {
        ChoiceEffect::Coins { amount } => {
            session.player.earn(*amount)?;
            ChoiceOutcome::Coins(*amount)
        }
        ChoiceEffect::ProductionSeconds { seconds } => {
            let amount = saturating_mul(rate.max(Decimal::ZERO), from_count(*seconds));
            session.player.earn(amount)?;
            ChoiceOutcome::Coins(amount)
        }
        ChoiceEffect::Event { event } => {
            let started = start_event(catalog, event, now)
                .ok_or_else(|| ActionError::UnknownEvent(event.clone()))?;
            activate(session, started.clone());
            ChoiceOutcome::Event(started)
        }
        ChoiceEffect::Nothing => ChoiceOutcome::Nothing,
    };
    debug!(event = event_id, choice = %choice.label, "choice resolved");
    Ok(outcome)
}
