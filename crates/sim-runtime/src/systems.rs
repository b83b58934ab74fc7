//! Tick systems, run in order by [`tick_schedule`].
//!
//! Each system reads the tick time from [`Clock`]. Errors from the rules
//! are logged and skipped; a tick never aborts halfway.

use crate::notice::{Notice, Notices};
use crate::resources::{Autosave, Clock, Dice, Game, Rules, Saves};
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rust_decimal::Decimal;
use sim_core::number::{from_count, per_elapsed, saturating_mul};
use sim_core::CrewRole;
use sim_econ::{actions, events, expedition, production, EventRoll, ProgressSnapshot};
use tracing::{debug, warn};

/// The per-tick pipeline.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            finish_timers,
            return_expeditions,
            expire_events,
            accrue_production,
            roll_events,
            track_progress,
            autosave,
        )
            .chain(),
    );
    schedule
}

pub fn finish_timers(
    mut game: ResMut<Game>,
    rules: Res<Rules>,
    clock: Res<Clock>,
    mut notices: ResMut<Notices>,
    mut save: ResMut<Autosave>,
) {
    let player = &mut game.session.player;
    let report = match actions::complete_timers(player, &rules.tuning, clock.now) {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "timer completion failed");
            return;
        }
    };
    if report.is_empty() {
        return;
    }
    for (planet, upgrade) in report.installed {
        notices.push(Notice::UpgradeInstalled { planet, upgrade });
    }
    for (planet, upgrade) in report.removed {
        notices.push(Notice::UpgradeRemoved { planet, upgrade });
    }
    if report.refunded > Decimal::ZERO {
        notices.push(Notice::Refunded(report.refunded));
    }
    save.dirty = true;
}

pub fn return_expeditions(
    mut game: ResMut<Game>,
    rules: Res<Rules>,
    clock: Res<Clock>,
    mut dice: ResMut<Dice>,
    mut notices: ResMut<Notices>,
    mut save: ResMut<Autosave>,
) {
    match expedition::resolve_expedition(
        &mut game.session.player,
        &rules.tuning.expedition,
        clock.now,
        &mut dice.0,
    ) {
        Ok(Some(report)) => {
            notices.push(Notice::ExpeditionReturned(report));
            save.dirty = true;
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "expedition could not return"),
    }
}

pub fn expire_events(
    mut game: ResMut<Game>,
    clock: Res<Clock>,
    mut notices: ResMut<Notices>,
    mut save: ResMut<Autosave>,
) {
    let ended = game.session.expire_events(clock.now);
    if ended.is_empty() {
        return;
    }
    for event in ended {
        debug!(event = %event.id, "event ended");
        notices.push(Notice::EventEnded { id: event.id });
    }
    save.dirty = true;
}

/// Credit coins at the effective rate, and research data from scientists,
/// for the time since the last tick.
pub fn accrue_production(
    mut game: ResMut<Game>,
    rules: Res<Rules>,
    mut clock: ResMut<Clock>,
    mut save: ResMut<Autosave>,
) {
    let elapsed = clock.now.saturating_sub(clock.last_tick);
    clock.last_tick = clock.now;
    if elapsed <= 0 {
        return;
    }
    let game = &mut *game;
    let rate = production::session_breakdown(
        &game.session,
        &game.research,
        &rules.catalog,
        &rules.tuning,
        clock.now,
    )
    .effective;
    match actions::accrue(&mut game.session.player, rate, elapsed) {
        Ok(earned) if earned > Decimal::ZERO => save.dirty = true,
        Ok(_) => {}
        Err(e) => warn!(error = %e, "production could not be credited"),
    }

    let scientists = game.session.player.crew().get(CrewRole::Scientist);
    if scientists > 0 {
        let per_scientist = rules.tuning.research.data_per_scientist;
        let data_rate = saturating_mul(per_scientist, from_count(scientists));
        let data = per_elapsed(data_rate, elapsed);
        if data > Decimal::ZERO {
            game.research.add_data(data);
            save.dirty = true;
        }
    }
}

/// Roll for an event once per roll interval. No roll happens while a choice
/// is waiting for an answer.
pub fn roll_events(
    mut game: ResMut<Game>,
    rules: Res<Rules>,
    mut clock: ResMut<Clock>,
    mut dice: ResMut<Dice>,
    mut notices: ResMut<Notices>,
    mut save: ResMut<Autosave>,
) {
    if clock.now < clock.next_event_roll {
        return;
    }
    clock.next_event_roll = clock
        .now
        .saturating_add(rules.tuning.events.roll_interval_ms.max(1));
    if game.pending_choice.is_some() {
        return;
    }
    let rolled = events::roll_event(
        &rules.catalog,
        &rules.tuning.events,
        &game.session.active_events,
        clock.now,
        &mut dice.0,
    );
    match rolled {
        Some(EventRoll::Timed(event)) => {
            events::activate(&mut game.session, event.clone());
            notices.push(Notice::EventStarted(event));
            save.dirty = true;
        }
        Some(EventRoll::Choice(id)) => {
            game.pending_choice = Some(id.clone());
            notices.push(Notice::ChoiceOffered { id });
        }
        None => {}
    }
}

pub fn track_progress(
    mut game: ResMut<Game>,
    rules: Res<Rules>,
    clock: Res<Clock>,
    mut notices: ResMut<Notices>,
    mut save: ResMut<Autosave>,
) {
    let game = &mut *game;
    let snapshot = ProgressSnapshot::of(&game.session.player, &game.research);
    let unlocked = game.progress.evaluate(&rules.catalog, &snapshot, clock.now);
    let sighted = game.progress.observe(&game.session.player);
    if unlocked.is_empty() && sighted.is_empty() {
        return;
    }
    for id in unlocked {
        notices.push(Notice::AchievementUnlocked { id });
    }
    for upgrade in sighted {
        notices.push(Notice::CodexEntry { upgrade });
    }
    save.dirty = true;
}

pub fn autosave(
    mut game: ResMut<Game>,
    clock: Res<Clock>,
    mut saves: ResMut<Saves>,
    mut save: ResMut<Autosave>,
    mut notices: ResMut<Notices>,
) {
    if !save.is_due(clock.now) {
        return;
    }
    if saves.write(&mut *game, clock.now) {
        save.last_saved_at = clock.now;
        save.dirty = false;
    } else {
        // retry on the next interval
        save.last_saved_at = clock.now;
        notices.push(Notice::SaveFailed { at: clock.now });
    }
}
