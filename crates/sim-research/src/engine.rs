use crate::roll::RollSource;
use catalog::{Catalog, ResearchNode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::config::ResearchTuning;
use sim_core::number::{percent, saturating_add};
use sim_core::{Amount, CrewRole, Receipt, UpgradeId, Wallet};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Research failures. None of them spends coins.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResearchError {
    #[error("unknown research node: {0}")]
    UnknownNode(String),
    #[error("research node {0} is already unlocked")]
    AlreadyUnlocked(String),
    #[error("research node {node} is locked; missing {missing:?}")]
    Locked { node: String, missing: Vec<String> },
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },
    #[error("insufficient research data: need {needed}, have {available}")]
    InsufficientData { needed: Amount, available: Amount },
    #[error("reservation of {reserved} does not match the price {cost}")]
    ReservationMismatch { reserved: Amount, cost: Amount },
}

/// Where a node sits in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    Locked,
    Attemptable,
    /// Terminal.
    Unlocked,
}

/// Result of one paid attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct AttemptOutcome {
    pub node: String,
    pub success: bool,
    /// Probability used for this attempt.
    pub chance: f64,
    /// The roll, or `None` when success was guaranteed.
    pub roll: Option<f64>,
    /// Failure counter after the attempt.
    pub failures: u32,
}

/// Bonuses granted by every unlocked node, summed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveModifiers {
    pub production_pct: Amount,
    pub click_pct: Amount,
    pub roles: BTreeSet<CrewRole>,
    pub slot_free: BTreeSet<UpgradeId>,
    pub crew_free: BTreeSet<UpgradeId>,
}

/// Persisted research progress. Unlocks are never revoked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResearchState {
    unlocked: BTreeSet<String>,
    failures: BTreeMap<String, u32>,
    data: Amount,
    #[serde(skip)]
    applied: ActiveModifiers,
}

impl ResearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute modifiers from the unlocked set. Call after deserializing.
    pub fn rebuild(&mut self, catalog: &Catalog) {
        self.applied = ActiveModifiers::default();
        let ids: Vec<String> = self.unlocked.iter().cloned().collect();
        for id in ids {
            match catalog.research_node(&id) {
                Some(node) => Self::apply(&mut self.applied, node),
                None => warn!(node = %id, "unlocked research node missing from catalog"),
            }
        }
    }

    fn apply(applied: &mut ActiveModifiers, node: &ResearchNode) {
        let m = &node.modifiers;
        applied.production_pct = saturating_add(applied.production_pct, m.production_pct);
        applied.click_pct = saturating_add(applied.click_pct, m.click_pct);
        if let Some(role) = m.unlocks_crew_role {
            applied.roles.insert(role);
        }
        applied.slot_free.extend(m.slot_free.iter().cloned());
        applied.crew_free.extend(m.crew_free.iter().cloned());
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn unlocked(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    pub fn unlocked_count(&self) -> u32 {
        self.unlocked.len() as u32
    }

    pub fn failures(&self, id: &str) -> u32 {
        self.failures.get(id).copied().unwrap_or(0)
    }

    /// Research data balance.
    pub fn data(&self) -> Amount {
        self.data
    }

    pub fn add_data(&mut self, amount: Amount) {
        if amount > Decimal::ZERO {
            self.data = saturating_add(self.data, amount);
        }
    }

    pub fn modifiers(&self) -> &ActiveModifiers {
        &self.applied
    }

    /// `1 + Σ production_pct / 100`.
    pub fn production_multiplier(&self) -> Amount {
        Decimal::ONE + percent(self.applied.production_pct)
    }

    /// `1 + Σ click_pct / 100`.
    pub fn click_multiplier(&self) -> Amount {
        Decimal::ONE + percent(self.applied.click_pct)
    }

    pub fn is_role_hireable(&self, role: CrewRole) -> bool {
        role.hireable_by_default() || self.applied.roles.contains(&role)
    }

    pub fn is_slot_free(&self, id: &UpgradeId) -> bool {
        self.applied.slot_free.contains(id)
    }

    pub fn is_crew_free(&self, id: &UpgradeId) -> bool {
        self.applied.crew_free.contains(id)
    }

    pub fn status(&self, catalog: &Catalog, id: &str) -> Option<NodeStatus> {
        let node = catalog.research_node(id)?;
        if self.is_unlocked(id) {
            return Some(NodeStatus::Unlocked);
        }
        if self.missing_prerequisites(node).is_empty() {
            Some(NodeStatus::Attemptable)
        } else {
            Some(NodeStatus::Locked)
        }
    }

    fn missing_prerequisites(&self, node: &ResearchNode) -> Vec<String> {
        node.prerequisites
            .iter()
            .filter(|p| !self.is_unlocked(p))
            .cloned()
            .collect()
    }

    /// Chance of the next attempt on `node`.
    ///
    /// `base_chance + min(scientists × bonus_per, cap)`, or certainty once the
    /// node has failed `pity_threshold` times in a row.
    pub fn success_chance(
        &self,
        node: &ResearchNode,
        scientists: u32,
        tuning: &ResearchTuning,
    ) -> f64 {
        if tuning.pity_threshold > 0 && self.failures(&node.id) >= tuning.pity_threshold {
            return 1.0;
        }
        let bonus = (f64::from(scientists) * tuning.scientist_bonus_per).min(tuning.scientist_cap);
        (node.base_chance + bonus.max(0.0)).clamp(0.0, 1.0)
    }

    fn checked_node<'c>(
        &self,
        catalog: &'c Catalog,
        id: &str,
    ) -> Result<&'c ResearchNode, ResearchError> {
        let node = catalog
            .research_node(id)
            .ok_or_else(|| ResearchError::UnknownNode(id.to_string()))?;
        if self.is_unlocked(id) {
            return Err(ResearchError::AlreadyUnlocked(id.to_string()));
        }
        let missing = self.missing_prerequisites(node);
        if !missing.is_empty() {
            return Err(ResearchError::Locked {
                node: id.to_string(),
                missing,
            });
        }
        Ok(node)
    }

    /// Pay for and roll one attempt.
    ///
    /// Coins are reserved through `wallet` only after the node checks pass;
    /// a refused reservation leaves everything untouched. Coins stay spent on
    /// a failed roll.
    pub fn attempt<W, R>(
        &mut self,
        catalog: &Catalog,
        id: &str,
        wallet: &mut W,
        scientists: u32,
        tuning: &ResearchTuning,
        roll: &mut R,
    ) -> Result<AttemptOutcome, ResearchError>
    where
        W: Wallet + ?Sized,
        R: RollSource + ?Sized,
    {
        let node = self.checked_node(catalog, id)?;
        let receipt = wallet
            .reserve(node.cost_coins)
            .map_err(|d| ResearchError::InsufficientFunds {
                needed: d.needed,
                available: d.available,
            })?;
        self.attempt_prepaid(catalog, id, receipt, wallet, scientists, tuning, roll)
    }

    /// Roll an attempt the host already reserved coins for.
    ///
    /// The receipt must cover exactly the node's coin price. It is committed
    /// once the roll happens and cancelled on any error before it.
    #[allow(clippy::too_many_arguments)]
    pub fn attempt_prepaid<W, R>(
        &mut self,
        catalog: &Catalog,
        id: &str,
        receipt: Receipt,
        wallet: &mut W,
        scientists: u32,
        tuning: &ResearchTuning,
        roll: &mut R,
    ) -> Result<AttemptOutcome, ResearchError>
    where
        W: Wallet + ?Sized,
        R: RollSource + ?Sized,
    {
        let node = match self.checked_node(catalog, id) {
            Ok(node) => node,
            Err(e) => {
                wallet.cancel(receipt);
                return Err(e);
            }
        };
        if receipt.amount() < node.cost_coins {
            let available = receipt.amount() + wallet.balance();
            wallet.cancel(receipt);
            return Err(ResearchError::InsufficientFunds {
                needed: node.cost_coins,
                available,
            });
        }
        if receipt.amount() > node.cost_coins {
            let reserved = receipt.amount();
            wallet.cancel(receipt);
            return Err(ResearchError::ReservationMismatch {
                reserved,
                cost: node.cost_coins,
            });
        }
        if self.data < node.cost_data {
            wallet.cancel(receipt);
            return Err(ResearchError::InsufficientData {
                needed: node.cost_data,
                available: self.data,
            });
        }

        self.data -= node.cost_data;
        wallet.commit(receipt);

        let chance = self.success_chance(node, scientists, tuning);
        let (success, rolled) = if chance >= 1.0 {
            (true, None)
        } else {
            let r = roll.roll();
            (r < chance, Some(r))
        };

        if success {
            self.unlocked.insert(node.id.clone());
            self.failures.remove(&node.id);
            Self::apply(&mut self.applied, node);
            info!(node = %node.id, chance, "research unlocked");
        } else {
            let count = self.failures.entry(node.id.clone()).or_insert(0);
            *count = count.saturating_add(1);
            debug!(node = %node.id, chance, failures = *count, "research attempt failed");
        }

        Ok(AttemptOutcome {
            node: node.id.clone(),
            success,
            chance,
            roll: rolled,
            failures: self.failures(&node.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::{FixedRoll, SeededRoll};
    use proptest::prelude::*;
    use sim_core::{Player, Tuning};

    fn setup(coins: i64) -> (Catalog, ResearchState, Player) {
        let catalog = Catalog::builtin().unwrap();
        let mut player = Player::fresh("p", &Tuning::default());
        player.earn(Decimal::new(coins, 0)).unwrap();
        (catalog, ResearchState::new(), player)
    }

    fn tuning() -> ResearchTuning {
        ResearchTuning::default()
    }

    #[test]
    fn roll_zero_succeeds_and_applies_modifiers() {
        let (c, mut r, mut p) = setup(1_000);
        let out = r
            .attempt(&c, "basic-automation", &mut p, 0, &tuning(), &mut FixedRoll(0.0))
            .unwrap();
        assert!(out.success);
        assert_eq!(p.coins(), Decimal::new(900, 0));
        assert!(r.is_unlocked("basic-automation"));
        assert_eq!(r.production_multiplier(), Decimal::new(110, 2));
        assert_eq!(r.status(&c, "deep-core-mining"), Some(NodeStatus::Attemptable));
    }

    #[test]
    fn roll_one_fails_and_keeps_coins_spent() {
        let (c, mut r, mut p) = setup(1_000);
        let out = r
            .attempt(&c, "basic-automation", &mut p, 0, &tuning(), &mut FixedRoll(1.0))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.failures, 1);
        assert_eq!(p.coins(), Decimal::new(900, 0));
        assert_eq!(r.status(&c, "basic-automation"), Some(NodeStatus::Attemptable));
    }

    #[test]
    fn pity_guarantees_success_after_threshold() {
        let (c, mut r, mut p) = setup(10_000);
        let t = tuning();
        let node = c.research_node("basic-automation").unwrap();
        for i in 0..t.pity_threshold {
            assert!(r.success_chance(node, 0, &t) < 1.0);
            let out = r
                .attempt(&c, "basic-automation", &mut p, 0, &t, &mut FixedRoll(1.0))
                .unwrap();
            assert!(!out.success);
            assert_eq!(out.failures, i + 1);
        }
        assert_eq!(r.success_chance(node, 0, &t), 1.0);
        let out = r
            .attempt(&c, "basic-automation", &mut p, 0, &t, &mut FixedRoll(1.0))
            .unwrap();
        assert!(out.success);
        assert!(out.roll.is_none());
        assert_eq!(r.failures("basic-automation"), 0);
    }

    #[test]
    fn scientist_bonus_is_capped() {
        let (c, r, _) = setup(0);
        let t = tuning();
        let node = c.research_node("robotics").unwrap();
        assert!((r.success_chance(node, 2, &t) - 0.6).abs() < 1e-9);
        assert!((r.success_chance(node, 100, &t) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn unknown_and_locked_nodes_spend_nothing() {
        let (c, mut r, mut p) = setup(10_000);
        let t = tuning();
        assert_eq!(
            r.attempt(&c, "warp-drive", &mut p, 0, &t, &mut FixedRoll(0.0)),
            Err(ResearchError::UnknownNode("warp-drive".into()))
        );
        assert!(matches!(
            r.attempt(&c, "robotics", &mut p, 0, &t, &mut FixedRoll(0.0)),
            Err(ResearchError::Locked { .. })
        ));
        assert_eq!(p.coins(), Decimal::new(10_000, 0));
    }

    #[test]
    fn insufficient_funds_leaves_state_untouched() {
        let (c, mut r, mut p) = setup(50);
        let err = r
            .attempt(&c, "basic-automation", &mut p, 0, &tuning(), &mut FixedRoll(0.0))
            .unwrap_err();
        assert!(matches!(err, ResearchError::InsufficientFunds { .. }));
        assert_eq!(p.coins(), Decimal::new(50, 0));
        assert_eq!(r.failures("basic-automation"), 0);
    }

    #[test]
    fn data_cost_cancels_reservation_when_short() {
        let (c, mut r, mut p) = setup(100_000);
        let t = tuning();
        for id in ["basic-automation", "crew-training", "deep-core-mining", "ergonomic-cockpits"] {
            r.attempt(&c, id, &mut p, 0, &t, &mut FixedRoll(0.0)).unwrap();
        }
        let before = p.coins();
        assert!(matches!(
            r.attempt(&c, "robotics", &mut p, 0, &t, &mut FixedRoll(0.0)),
            Err(ResearchError::InsufficientData { .. })
        ));
        assert_eq!(p.coins(), before);
        r.add_data(Decimal::new(5, 0));
        let out = r.attempt(&c, "robotics", &mut p, 0, &t, &mut FixedRoll(0.0)).unwrap();
        assert!(out.success);
        assert_eq!(r.data(), Decimal::ZERO);
        assert!(r.is_role_hireable(CrewRole::Engineer));
        assert!(r.is_crew_free(&UpgradeId::from("refinery")));
        assert!(r.is_slot_free(&UpgradeId::from("drill")));
    }

    #[test]
    fn prepaid_attempt_cancels_on_error() {
        let (c, mut r, mut p) = setup(1_000);
        let t = tuning();
        let receipt = p.reserve(Decimal::new(100, 0)).unwrap();
        assert!(r
            .attempt_prepaid(&c, "robotics", receipt, &mut p, 0, &t, &mut FixedRoll(0.0))
            .is_err());
        assert_eq!(p.coins(), Decimal::new(1_000, 0));
        let receipt = p.reserve(Decimal::new(100, 0)).unwrap();
        let out = r
            .attempt_prepaid(&c, "basic-automation", receipt, &mut p, 0, &t, &mut FixedRoll(0.0))
            .unwrap();
        assert!(out.success);
        assert_eq!(p.coins(), Decimal::new(900, 0));
    }

    #[test]
    fn oversized_reservation_is_returned_untouched() {
        let (c, mut r, mut p) = setup(1_000);
        let t = tuning();
        let receipt = p.reserve(Decimal::new(500, 0)).unwrap();
        assert_eq!(
            r.attempt_prepaid(&c, "basic-automation", receipt, &mut p, 0, &t, &mut FixedRoll(0.0)),
            Err(ResearchError::ReservationMismatch {
                reserved: Decimal::new(500, 0),
                cost: Decimal::new(100, 0),
            })
        );
        assert_eq!(p.coins(), Decimal::new(1_000, 0));
        assert!(!r.is_unlocked("basic-automation"));
        assert_eq!(r.failures("basic-automation"), 0);

        let receipt = p.reserve(Decimal::new(100, 0)).unwrap();
        r.attempt_prepaid(&c, "basic-automation", receipt, &mut p, 0, &t, &mut FixedRoll(0.0))
            .unwrap();
        assert_eq!(p.coins(), Decimal::new(900, 0));
    }

    #[test]
    fn serde_roundtrip_then_rebuild_restores_modifiers() {
        let (c, mut r, mut p) = setup(1_000);
        r.attempt(&c, "click-optimizers", &mut p, 0, &tuning(), &mut FixedRoll(0.0))
            .unwrap();
        r.attempt(&c, "crew-training", &mut p, 0, &tuning(), &mut FixedRoll(1.0))
            .unwrap();
        let json = serde_json::to_string(&r).unwrap();
        let mut back: ResearchState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.click_multiplier(), Decimal::ONE);
        back.rebuild(&c);
        assert_eq!(back, r);
        assert_eq!(back.click_multiplier(), Decimal::new(15, 1));
        assert_eq!(back.failures("crew-training"), 1);
    }

    proptest! {
        #[test]
        fn unlocks_are_monotonic(
            seed in any::<u64>(),
            picks in prop::collection::vec(0usize..8, 1..40),
        ) {
            let (c, mut r, mut p) = setup(1_000_000);
            r.add_data(Decimal::new(100, 0));
            let ids: Vec<String> = c.research_nodes().iter().map(|n| n.id.clone()).collect();
            let mut rolls = SeededRoll::new(seed);
            let mut seen: BTreeSet<String> = BTreeSet::new();
            for i in picks {
                let _ = r.attempt(&c, &ids[i % ids.len()], &mut p, 1, &tuning(), &mut rolls);
                prop_assert!(seen.is_subset(r.unlocked()));
                seen = r.unlocked().clone();
                prop_assert!(p.coins() >= Decimal::ZERO);
            }
        }

        #[test]
        fn chance_stays_in_unit_interval(scientists in 0u32..1_000, failures in 0u32..10) {
            let (c, mut r, _) = setup(0);
            r.failures.insert("stellar-cartography".into(), failures);
            let node = c.research_node("stellar-cartography").unwrap();
            let p = r.success_chance(node, scientists, &tuning());
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
