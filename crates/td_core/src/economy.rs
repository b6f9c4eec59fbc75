//! Resource ledger: stone and metal.
//!
//! Balances are unsigned, so non-negativity holds by construction. Every
//! spend either succeeds in full or leaves the ledger untouched, except
//! [`Resources::spend_up_to`], which is the metered path used by repairs.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::components::{Building, EntityId};
use crate::error::{GameError, Result};

/// Milliseconds between production payouts.
pub const PRODUCTION_INTERVAL_MS: u64 = 1000;

/// The two fungible materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Primary building material.
    Stone,
    /// Secondary material for turrets, upgrades and repairs.
    Metal,
}

/// A price in both materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Stone component.
    pub stone: u32,
    /// Metal component.
    pub metal: u32,
}

impl Cost {
    /// Free.
    pub const ZERO: Self = Self { stone: 0, metal: 0 };

    /// Create a cost.
    #[must_use]
    pub const fn new(stone: u32, metal: u32) -> Self {
        Self { stone, metal }
    }

    /// Metal-only cost.
    #[must_use]
    pub const fn metal(metal: u32) -> Self {
        Self { stone: 0, metal }
    }

    /// Stone-only cost.
    #[must_use]
    pub const fn stone(stone: u32) -> Self {
        Self { stone, metal: 0 }
    }

    /// Percentage of this cost, rounded down per component.
    #[must_use]
    pub const fn percent(self, pct: u32) -> Self {
        Self {
            stone: (self.stone as u64 * pct as u64 / 100) as u32,
            metal: (self.metal as u64 * pct as u64 / 100) as u32,
        }
    }

    /// True when both components are zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.stone == 0 && self.metal == 0
    }
}

impl Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            stone: self.stone.saturating_add(rhs.stone),
            metal: self.metal.saturating_add(rhs.metal),
        }
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stone / {} metal", self.stone, self.metal)
    }
}

/// The player's resource ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Stone on hand.
    pub stone: u32,
    /// Metal on hand.
    pub metal: u32,
}

impl Resources {
    /// Create a ledger with the given balances.
    #[must_use]
    pub const fn new(stone: u32, metal: u32) -> Self {
        Self { stone, metal }
    }

    /// Balance of one material.
    #[must_use]
    pub const fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Stone => self.stone,
            Resource::Metal => self.metal,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Stone => &mut self.stone,
            Resource::Metal => &mut self.metal,
        }
    }

    /// Check if both components of `cost` are covered.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.stone >= cost.stone && self.metal >= cost.metal
    }

    /// Deduct `cost` in full, or fail without touching the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientResources`] when either component
    /// is short.
    pub fn try_spend(&mut self, cost: Cost) -> Result<()> {
        if !self.can_afford(cost) {
            return Err(GameError::InsufficientResources {
                required: cost,
                available: *self,
            });
        }
        self.stone -= cost.stone;
        self.metal -= cost.metal;
        Ok(())
    }

    /// Spend as much of `amount` as is available, returning what was spent.
    pub fn spend_up_to(&mut self, resource: Resource, amount: u32) -> u32 {
        let slot = self.slot(resource);
        let spent = amount.min(*slot);
        *slot -= spent;
        spent
    }

    /// Add a single material.
    pub fn deposit(&mut self, resource: Resource, amount: u32) {
        let slot = self.slot(resource);
        *slot = slot.saturating_add(amount);
    }

    /// Add a refund or reward covering both materials.
    pub fn credit(&mut self, amount: Cost) {
        self.stone = self.stone.saturating_add(amount.stone);
        self.metal = self.metal.saturating_add(amount.metal);
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stone / {} metal", self.stone, self.metal)
    }
}

/// Economy event emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A building paid out its production.
    Produced {
        /// Producing building.
        building: EntityId,
        /// Material produced.
        resource: Resource,
        /// Amount added.
        amount: u32,
    },
    /// A harvester dropped its load at the base.
    Delivered {
        /// Harvester drone.
        drone: EntityId,
        /// Material delivered.
        resource: Resource,
        /// Amount added.
        amount: u32,
    },
    /// Kill reward paid.
    Bounty {
        /// Enemy that died.
        enemy: EntityId,
        /// Metal paid.
        amount: u32,
    },
}

/// Pay out building production for every full interval elapsed.
///
/// Only active buildings produce. A building that was idle (wrecked or
/// abandoned) restarts its interval from `now_ms` instead of back-paying.
pub fn production_system<'a>(
    buildings: impl Iterator<Item = &'a mut Building>,
    now_ms: u64,
    ledger: &mut Resources,
) -> Vec<EconomyEvent> {
    let mut events = Vec::new();

    for building in buildings {
        let Some((resource, rate)) = building.production() else {
            building.last_production_ms = now_ms;
            continue;
        };

        while now_ms.saturating_sub(building.last_production_ms) >= PRODUCTION_INTERVAL_MS {
            building.last_production_ms += PRODUCTION_INTERVAL_MS;
            ledger.deposit(resource, rate);
            events.push(EconomyEvent::Produced {
                building: building.id,
                resource,
                amount: rate,
            });
        }
    }

    events
}
