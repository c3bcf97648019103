//! Threshold model: maps a load sample to a scaling tier.
//!
//! Load is an aggregate figure (percent summed over online units), so the
//! tier boundaries are re-normalized by the number of active units every
//! cycle. With two units online the default high tier fires at 140.
//!
//! ```text
//! high     = rates.high * active
//! mid      = rates.mid  * active
//! low      = rates.low  * active
//! cooldown = base_cooldown / active
//! interval = base_tick     / active
//!
//! load >= high && active < total  -> ScaleUpAll
//! load >= mid  && active < total  -> ScaleUpOne
//! load <= low  && active > 1      -> ScaleDownAll
//! otherwise                       -> NoAction
//! ```
//!
//! The order is a priority order: the first match wins.

use std::time::Duration;

use hotplug_core::{TierRates, Tunables};

/// Classified outcome of one load sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Bring every offline unit online.
    ScaleUpAll,
    /// Bring exactly one offline unit online.
    ScaleUpOne,
    /// Take every non-primary unit offline.
    ScaleDownAll,
    /// Leave the units as they are.
    NoAction,
}

impl Tier {
    /// Whether this tier changes any unit, and so is subject to cooldown.
    pub fn is_action(&self) -> bool {
        !matches!(self, Tier::NoAction)
    }

    /// Short name used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::ScaleUpAll => "scale-up-all",
            Tier::ScaleUpOne => "scale-up-one",
            Tier::ScaleDownAll => "scale-down-all",
            Tier::NoAction => "no-action",
        }
    }
}

/// Tier boundaries scaled to the current number of active units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSet {
    pub high: u64,
    pub mid: u64,
    pub low: u64,
}

impl ThresholdSet {
    pub fn scaled(rates: &TierRates, active_units: usize) -> Self {
        let n = active_units as u64;
        Self {
            high: u64::from(rates.high) * n,
            mid: u64::from(rates.mid) * n,
            low: u64::from(rates.low) * n,
        }
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub tier: Tier,
    /// Active unit count if the tier's action is carried out in full.
    pub next_units: usize,
    pub thresholds: ThresholdSet,
    /// Minimum time since the last accepted transition.
    pub cooldown: Duration,
    /// Delay before the next sample.
    pub sample_interval: Duration,
}

/// Classify `raw_load` given the current and total unit counts.
pub fn classify(
    raw_load: u32,
    active_units: usize,
    total_units: usize,
    tunables: &Tunables,
) -> Decision {
    debug_assert!(
        (1..=total_units).contains(&active_units),
        "active units {active_units} outside 1..={total_units}"
    );

    let divisor = u32::try_from(active_units.max(1)).unwrap_or(u32::MAX);
    let thresholds = ThresholdSet::scaled(&tunables.tiers, active_units);
    let load = u64::from(raw_load);

    let (tier, next_units) = if load >= thresholds.high && active_units < total_units {
        (Tier::ScaleUpAll, total_units)
    } else if load >= thresholds.mid && active_units < total_units {
        (Tier::ScaleUpOne, active_units + 1)
    } else if load <= thresholds.low && active_units > 1 {
        (Tier::ScaleDownAll, 1)
    } else {
        (Tier::NoAction, active_units)
    };

    Decision {
        tier,
        next_units,
        thresholds,
        cooldown: tunables.base_cooldown / divisor,
        sample_interval: tunables.base_tick / divisor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunables() -> Tunables {
        Tunables::default()
    }

    #[test]
    fn high_load_on_one_unit_scales_up_all() {
        let decision = classify(75, 1, 4, &tunables());
        assert_eq!(decision.thresholds.high, 70);
        assert_eq!(decision.tier, Tier::ScaleUpAll);
        assert_eq!(decision.next_units, 4);
    }

    #[test]
    fn mid_load_on_two_units_scales_up_one() {
        let decision = classify(90, 2, 4, &tunables());
        assert_eq!(decision.thresholds.high, 140);
        assert_eq!(decision.thresholds.mid, 80);
        assert_eq!(decision.tier, Tier::ScaleUpOne);
        assert_eq!(decision.next_units, 3);
    }

    #[test]
    fn low_load_on_all_units_scales_down() {
        let decision = classify(50, 4, 4, &tunables());
        assert_eq!(decision.thresholds.low, 80);
        assert_eq!(decision.tier, Tier::ScaleDownAll);
        assert_eq!(decision.next_units, 1);
    }

    #[test]
    fn between_tiers_is_no_action() {
        let decision = classify(60, 2, 4, &tunables());
        assert_eq!(decision.tier, Tier::NoAction);
        assert_eq!(decision.next_units, 2);
    }

    #[test]
    fn high_load_with_all_units_online_is_no_action() {
        assert_eq!(classify(1000, 4, 4, &tunables()).tier, Tier::NoAction);
    }

    #[test]
    fn low_load_on_single_unit_is_no_action() {
        assert_eq!(classify(0, 1, 4, &tunables()).tier, Tier::NoAction);
    }

    #[test]
    fn high_tier_takes_priority_over_mid() {
        // 300 clears both high (210) and mid (120) at three units.
        assert_eq!(classify(300, 3, 4, &tunables()).tier, Tier::ScaleUpAll);
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(classify(70, 1, 2, &tunables()).tier, Tier::ScaleUpAll);
        assert_eq!(classify(40, 1, 2, &tunables()).tier, Tier::ScaleUpOne);
        assert_eq!(classify(40, 2, 2, &tunables()).tier, Tier::ScaleDownAll);
        assert_eq!(classify(41, 2, 2, &tunables()).tier, Tier::NoAction);
    }

    #[test]
    fn tiers_are_ordered_and_linear() {
        let rates = TierRates::default();
        let base = ThresholdSet::scaled(&rates, 1);
        for n in 1..=8 {
            let t = ThresholdSet::scaled(&rates, n);
            assert!(t.high > t.mid && t.mid > t.low);
            assert_eq!(t.high, base.high * n as u64);
            assert_eq!(t.mid, base.mid * n as u64);
            assert_eq!(t.low, base.low * n as u64);
        }
    }

    #[test]
    fn windows_shrink_with_active_units() {
        let one = classify(50, 1, 4, &tunables());
        assert_eq!(one.cooldown, Duration::from_secs(2));
        assert_eq!(one.sample_interval, Duration::from_secs(1));

        let four = classify(200, 4, 4, &tunables());
        assert_eq!(four.cooldown, Duration::from_millis(500));
        assert_eq!(four.sample_interval, Duration::from_millis(250));
    }
}
