#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cooldown-gated shell dispatch for warships.

use std::collections::BTreeSet;

use warship_core::{Effect, Game, ShellAttack, UnitId, UnitSnapshot};

/// Result of a dispatch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShotOutcome {
    /// The cooldown has not elapsed; nothing was fired.
    CoolingDown,
    /// A shell was enqueued.
    Fired {
        /// Whether the shell is certain to destroy its target.
        lethal: bool,
    },
}

/// Tracks the shell cooldown and the units already committed to a lethal shot.
#[derive(Clone, Debug, Default)]
pub struct ShellDispatcher {
    last_fired: u64,
    already_shelled: BTreeSet<UnitId>,
}

impl ShellDispatcher {
    /// Creates a dispatcher that has never fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a shell may be fired at tick `now` given the cooldown `rate`.
    #[must_use]
    pub fn is_ready(&self, now: u64, rate: u64) -> bool {
        now.saturating_sub(self.last_fired) > rate
    }

    /// Fires at `target` from `shooter` when the cooldown allows it.
    ///
    /// Targets without a health pool die to a single shell, so they are
    /// remembered and must never be selected again by the caller.
    pub fn dispatch<G>(
        &mut self,
        game: &mut G,
        now: u64,
        shooter: &UnitSnapshot,
        target: &UnitSnapshot,
    ) -> ShotOutcome
    where
        G: Game + ?Sized,
    {
        if !self.is_ready(now, game.config().shell_attack_rate) {
            return ShotOutcome::CoolingDown;
        }

        self.last_fired = now;
        game.add_execution(Effect::Shell(ShellAttack {
            origin: shooter.tile,
            owner: shooter.owner,
            source: shooter.id,
            target: target.id,
        }));

        let lethal = !target.has_health_pool;
        if lethal {
            let _ = self.already_shelled.insert(target.id);
            tracing::debug!(target = target.id.get(), "lethal shell committed");
        }
        ShotOutcome::Fired { lethal }
    }

    /// Tick of the most recent shot.
    #[must_use]
    pub const fn last_fired(&self) -> u64 {
        self.last_fired
    }

    /// Units already committed to a lethal shot.
    #[must_use]
    pub const fn already_shelled(&self) -> &BTreeSet<UnitId> {
        &self.already_shelled
    }
}
