//! Player commands.
//!
//! Every command is validated in full before anything is mutated, so a
//! failed command leaves the simulation untouched. Direct repairs are the
//! one metered spend: they buy as much healing as the ledger allows.

use serde::{Deserialize, Serialize};

use crate::components::{
    Building, BuildingCondition, BuildingKind, EntityId, Facing, TargetRef, Turret, TurretVariant,
};
use crate::economy::{Cost, Resource};
use crate::error::{GameError, Result};
use crate::grid::{GridPos, TileChange, TileKind};
use crate::simulation::Simulation;

/// A command submitted by the player.
///
/// ```json
/// {"type": "build_turret", "x": 3, "y": 4, "variant": "sniper"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Queue a turret.
    BuildTurret {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Variant.
        variant: TurretVariant,
    },
    /// Queue a building.
    BuildBuilding {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Kind.
        kind: BuildingKind,
    },
    /// Upgrade the turret at a tile.
    UpgradeTurret {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },
    /// Repair the turret at a tile.
    RepairTurret {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },
    /// Sell the turret at a tile.
    SellTurret {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },
    /// Repair or restore the building at a tile.
    RepairBuilding {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },
    /// Clear rubble or wreckage.
    ClearRubble {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },
    /// Steer the hero; `null` stops it.
    SetHeroHeading {
        /// New heading.
        heading: Option<Facing>,
    },
    /// Start the next wave now.
    SkipCountdown,
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// A construction job was queued.
    Queued {
        /// Job id.
        job: EntityId,
    },
    /// A turret gained a level.
    Upgraded {
        /// Turret id.
        turret: EntityId,
        /// New level.
        level: u32,
    },
    /// A structure was healed.
    Repaired {
        /// Health restored.
        healed: u32,
        /// Amount charged.
        cost: Cost,
        /// A wreck came back into service.
        restored: bool,
    },
    /// A turret was removed.
    Sold {
        /// Amount credited.
        refund: Cost,
        /// Tile written back.
        change: TileChange,
    },
    /// An abandoned building was brought online.
    Restored {
        /// Building id.
        building: EntityId,
        /// Tile written.
        change: TileChange,
    },
    /// Debris was removed.
    Cleared {
        /// Tile written.
        change: TileChange,
    },
    /// The hero heading changed.
    HeadingSet,
    /// The countdown was skipped.
    CountdownSkipped,
}

impl CommandOutcome {
    /// Grid edit made by the command, if any.
    #[must_use]
    pub const fn tile_change(&self) -> Option<TileChange> {
        match self {
            Self::Sold { change, .. }
            | Self::Restored { change, .. }
            | Self::Cleared { change } => Some(*change),
            _ => None,
        }
    }
}

impl Simulation {
    /// Turret occupying `pos`.
    #[must_use]
    pub fn turret_at(&self, pos: GridPos) -> Option<&Turret> {
        self.turrets.values().find(|t| t.pos == pos)
    }

    /// Building occupying `pos`.
    #[must_use]
    pub fn building_at(&self, pos: GridPos) -> Option<&Building> {
        self.buildings.values().find(|b| b.pos == pos)
    }

    fn turret_id_at(&self, pos: GridPos) -> Result<EntityId> {
        self.turret_at(pos).map(|t| t.id).ok_or(GameError::NoTurret(pos))
    }

    fn building_id_at(&self, pos: GridPos) -> Result<EntityId> {
        self.building_at(pos).map(|b| b.id).ok_or(GameError::NoBuilding(pos))
    }

    /// Raise a turret one level.
    ///
    /// # Errors
    ///
    /// [`GameError::NoTurret`], [`GameError::Wrecked`],
    /// [`GameError::MaxLevel`] or [`GameError::InsufficientResources`].
    pub fn upgrade_turret(&mut self, pos: GridPos) -> Result<CommandOutcome> {
        self.ensure_running()?;
        let id = self.turret_id_at(pos)?;
        let Some(turret) = self.turrets.get(id) else {
            return Err(GameError::NoTurret(pos));
        };
        let stats = self.config.structures.turret(turret.variant);
        if turret.is_wreckage {
            return Err(GameError::Wrecked(pos));
        }
        if turret.level >= stats.max_level {
            return Err(GameError::MaxLevel {
                pos,
                level: turret.level,
            });
        }
        let (cost, damage, range) = (
            stats.upgrade_cost,
            stats.damage_per_level,
            stats.range_per_level,
        );
        self.resources.try_spend(cost)?;

        let Some(turret) = self.turrets.get_mut(id) else {
            return Err(GameError::NoTurret(pos));
        };
        turret.level += 1;
        turret.damage = turret.damage.saturating_add(damage);
        turret.range += range;
        turret.invested += cost;
        tracing::debug!(turret = id, level = turret.level, "Turret upgraded");
        Ok(CommandOutcome::Upgraded {
            turret: id,
            level: turret.level,
        })
    }

    /// Heal a structure instantly, buying as much health as metal allows.
    fn repair_now(&mut self, target: TargetRef, pos: GridPos) -> Result<CommandOutcome> {
        let missing = self
            .structure_health(target)
            .map(|h| h.missing())
            .ok_or(GameError::NoBuilding(pos))?;
        if missing == 0 {
            return Err(GameError::NothingToRepair(pos));
        }

        let per_metal = self.config.drones.repair_hp_per_metal.max(1);
        let full_cost = missing.div_ceil(per_metal);
        if self.resources.metal == 0 {
            return Err(GameError::InsufficientResources {
                required: Cost::metal(full_cost),
                available: self.resources,
            });
        }

        let spent = self.resources.spend_up_to(Resource::Metal, full_cost);
        let (healed, restored) = self.heal_structure(target, spent.saturating_mul(per_metal));
        if let (true, TargetRef::Building(id)) = (restored, target) {
            self.top_up_drones(id);
        }
        tracing::debug!(?target, healed, spent, restored, "Structure repaired");
        Ok(CommandOutcome::Repaired {
            healed,
            cost: Cost::metal(spent),
            restored,
        })
    }

    /// Repair a turret, including wreckage.
    ///
    /// # Errors
    ///
    /// [`GameError::NoTurret`], [`GameError::NothingToRepair`] or
    /// [`GameError::InsufficientResources`] when no metal is left.
    pub fn repair_turret(&mut self, pos: GridPos) -> Result<CommandOutcome> {
        self.ensure_running()?;
        let id = self.turret_id_at(pos)?;
        self.repair_now(TargetRef::Turret(id), pos)
    }

    /// Remove a turret, refund part of its investment and restore the tile
    /// it was built on.
    ///
    /// # Errors
    ///
    /// [`GameError::NoTurret`].
    pub fn sell_turret(&mut self, pos: GridPos) -> Result<CommandOutcome> {
        self.ensure_running()?;
        let id = self.turret_id_at(pos)?;
        let Some(turret) = self.turrets.remove(id) else {
            return Err(GameError::NoTurret(pos));
        };
        let refund = turret.invested.percent(self.config.economy.sell_refund_pct);
        self.resources.credit(refund);

        let change = TileChange {
            pos,
            kind: turret.replaced_tile,
        };
        self.grid.apply(change);
        tracing::debug!(turret = id, %refund, "Turret sold");
        Ok(CommandOutcome::Sold { refund, change })
    }

    /// Restore an abandoned building, or repair a damaged or wrecked one.
    ///
    /// # Errors
    ///
    /// [`GameError::NoBuilding`], [`GameError::NothingToRepair`] or
    /// [`GameError::InsufficientResources`].
    pub fn repair_building(&mut self, pos: GridPos) -> Result<CommandOutcome> {
        self.ensure_running()?;
        let id = self.building_id_at(pos)?;
        let Some(building) = self.buildings.get(id) else {
            return Err(GameError::NoBuilding(pos));
        };
        if building.condition != BuildingCondition::Abandoned {
            return self.repair_now(TargetRef::Building(id), pos);
        }

        let stats = self.config.structures.building(building.kind);
        let (cost, rate, kind) = (stats.restore_cost, stats.production_rate, building.kind);
        self.resources.try_spend(cost)?;

        let now = self.elapsed_ms;
        let Some(building) = self.buildings.get_mut(id) else {
            return Err(GameError::NoBuilding(pos));
        };
        building.condition = BuildingCondition::Active;
        building.production_rate = rate;
        building.last_production_ms = now;
        building.health.current = building.health.max;

        let change = TileChange {
            pos,
            kind: kind.tile_kind(),
        };
        self.grid.apply(change);
        self.top_up_drones(id);
        tracing::info!(building = id, ?kind, %pos, "Abandoned building restored");
        Ok(CommandOutcome::Restored {
            building: id,
            change,
        })
    }

    /// Turn rubble or wreckage into an empty tile for a flat fee.
    ///
    /// # Errors
    ///
    /// [`GameError::OutOfBounds`], [`GameError::InvalidSite`] when the tile
    /// is not debris, or [`GameError::InsufficientResources`].
    pub fn clear_rubble(&mut self, pos: GridPos) -> Result<CommandOutcome> {
        self.ensure_running()?;
        let tile = self.grid.get(pos).ok_or(GameError::OutOfBounds(pos))?;
        if !tile.is_debris() {
            return Err(GameError::InvalidSite {
                pos,
                tile,
                action: "clear rubble",
            });
        }
        self.resources.try_spend(self.config.economy.clear_rubble_cost)?;

        let change = TileChange {
            pos,
            kind: TileKind::Empty,
        };
        self.grid.apply(change);
        Ok(CommandOutcome::Cleared { change })
    }

    /// Start the next wave without waiting for the countdown.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] when no countdown is running.
    pub fn skip_countdown(&mut self) -> Result<CommandOutcome> {
        self.ensure_running()?;
        if !self.waves.skip_countdown() {
            return Err(GameError::InvalidState("No wave countdown to skip".into()));
        }
        tracing::info!(wave = self.waves.wave(), "Countdown skipped");
        Ok(CommandOutcome::CountdownSkipped)
    }

    /// Steer the hero.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] when there is no living hero.
    pub fn set_hero_heading(&mut self, heading: Option<Facing>) -> Result<CommandOutcome> {
        self.ensure_running()?;
        if !self.steer_hero(heading) {
            return Err(GameError::InvalidState("No hero to steer".into()));
        }
        Ok(CommandOutcome::HeadingSet)
    }

    /// Dispatch a [`PlayerCommand`].
    ///
    /// # Errors
    ///
    /// Whatever the underlying command returns.
    pub fn apply_command(&mut self, command: &PlayerCommand) -> Result<CommandOutcome> {
        match *command {
            PlayerCommand::BuildTurret { x, y, variant } => self
                .build_turret(GridPos::new(x, y), variant)
                .map(|job| CommandOutcome::Queued { job }),
            PlayerCommand::BuildBuilding { x, y, kind } => self
                .build_building(GridPos::new(x, y), kind)
                .map(|job| CommandOutcome::Queued { job }),
            PlayerCommand::UpgradeTurret { x, y } => self.upgrade_turret(GridPos::new(x, y)),
            PlayerCommand::RepairTurret { x, y } => self.repair_turret(GridPos::new(x, y)),
            PlayerCommand::SellTurret { x, y } => self.sell_turret(GridPos::new(x, y)),
            PlayerCommand::RepairBuilding { x, y } => self.repair_building(GridPos::new(x, y)),
            PlayerCommand::ClearRubble { x, y } => self.clear_rubble(GridPos::new(x, y)),
            PlayerCommand::SetHeroHeading { heading } => self.set_hero_heading(heading),
            PlayerCommand::SkipCountdown => self.skip_countdown(),
        }
    }
}
