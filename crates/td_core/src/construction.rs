//! Construction queue and structure creation.
//!
//! Build commands validate the site, charge the full cost and queue a
//! [`ConstructionJob`]. Nothing appears on the grid until a worker drone
//! finishes the job; see [`crate::drones`].

use crate::components::{
    Building, BuildingCondition, BuildingKind, ConstructionJob, EntityId, Health, JobKind,
    JobStatus, Turret, TurretVariant,
};
use crate::drones::DroneEvent;
use crate::economy::Cost;
use crate::error::{GameError, Result};
use crate::grid::{GridPos, TileChange, TileKind};
use crate::math::Fixed;
use crate::simulation::{Simulation, TickEvents};

/// What a finished job turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blueprint {
    Turret(TurretVariant),
    Building(BuildingKind),
}

impl Blueprint {
    const fn of(kind: JobKind) -> Self {
        match kind {
            JobKind::BuildTurret => Self::Turret(TurretVariant::Standard),
            JobKind::BuildSniper => Self::Turret(TurretVariant::Sniper),
            JobKind::BuildQuarry => Self::Building(BuildingKind::Quarry),
            JobKind::BuildForge => Self::Building(BuildingKind::Forge),
            JobKind::BuildMaintenanceHub => Self::Building(BuildingKind::MaintenanceHub),
            JobKind::BuildDroneFactory => Self::Building(BuildingKind::DroneFactory),
        }
    }
}

impl Simulation {
    /// Reject commands once the match has ended.
    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.status.is_over() {
            return Err(GameError::MatchOver);
        }
        Ok(())
    }

    /// Pending or in-progress job at `pos`.
    #[must_use]
    pub fn job_at(&self, pos: GridPos) -> Option<&ConstructionJob> {
        self.jobs.values().find(|j| j.pos == pos)
    }

    /// Validate a build site and charge for it, then queue the job.
    fn queue_job(
        &mut self,
        pos: GridPos,
        kind: JobKind,
        site: TileKind,
        cost: Cost,
        action: &'static str,
    ) -> Result<EntityId> {
        self.ensure_running()?;
        let tile = self.grid.get(pos).ok_or(GameError::OutOfBounds(pos))?;
        if tile != site {
            return Err(GameError::InvalidSite { pos, tile, action });
        }
        if self.config.require_visible_build_site && !self.fog.is_visible(pos) {
            return Err(GameError::Obscured(pos));
        }
        if self.job_at(pos).is_some() {
            return Err(GameError::SiteOccupied(pos));
        }
        self.resources.try_spend(cost)?;

        let id = self.ids.allocate();
        self.jobs.insert(
            id,
            ConstructionJob {
                id,
                pos,
                kind,
                progress: Fixed::ZERO,
                assigned_drone: None,
                status: JobStatus::Pending,
                cost,
            },
        );
        tracing::debug!(job = id, ?kind, %pos, %cost, "Construction queued");
        Ok(id)
    }

    /// Queue a turret on an empty tile.
    ///
    /// # Errors
    ///
    /// Fails when the match is over, the tile is outside the grid, not
    /// empty, hidden by fog, already queued, or unaffordable. Nothing is
    /// charged on failure.
    pub fn build_turret(&mut self, pos: GridPos, variant: TurretVariant) -> Result<EntityId> {
        let cost = self.config.structures.turret(variant).build_cost;
        self.queue_job(pos, JobKind::for_turret(variant), TileKind::Empty, cost, "build a turret")
    }

    /// Queue a building on the site its kind requires.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Simulation::build_turret`]; quarries need a
    /// stone deposit and forges a metal deposit.
    pub fn build_building(&mut self, pos: GridPos, kind: BuildingKind) -> Result<EntityId> {
        let cost = self.config.structures.building(kind).build_cost;
        self.queue_job(
            pos,
            JobKind::for_building(kind),
            kind.required_site(),
            cost,
            "build a building",
        )
    }

    /// Finish a job: write the tile, create the structure, drop the job.
    pub(crate) fn complete_job(&mut self, job_id: EntityId, events: &mut TickEvents) {
        let Some(mut job) = self.jobs.remove(job_id) else {
            return;
        };
        job.status = JobStatus::Completed;

        let replaced = self.grid.get(job.pos).unwrap_or(TileKind::Empty);
        let change = TileChange {
            pos: job.pos,
            kind: job.kind.tile_kind(),
        };
        self.grid.apply(change);
        events.tile_changes.push(change);

        let entity = match Blueprint::of(job.kind) {
            Blueprint::Turret(variant) => self.create_turret(variant, job.pos, replaced, job.cost),
            Blueprint::Building(kind) => {
                self.create_building(kind, job.pos, BuildingCondition::Active)
            }
        };
        tracing::info!(
            job = job.id,
            kind = ?job.kind,
            pos = %job.pos,
            entity,
            "Construction complete"
        );
        events.drones.push(DroneEvent::JobCompleted {
            job: job.id,
            pos: job.pos,
            kind: job.kind,
            entity,
        });
    }

    /// Insert a level-1 turret.
    pub(crate) fn create_turret(
        &mut self,
        variant: TurretVariant,
        pos: GridPos,
        replaced_tile: TileKind,
        invested: Cost,
    ) -> EntityId {
        let stats = self.config.structures.turret(variant);
        let id = self.ids.allocate();
        self.turrets.insert(
            id,
            Turret {
                id,
                variant,
                pos,
                range: stats.range,
                damage: stats.damage,
                cooldown_ms: stats.cooldown_ms,
                last_fired_ms: None,
                target: None,
                level: 1,
                health: Health::new(stats.max_health),
                is_wreckage: false,
                replaced_tile,
                invested,
            },
        );
        id
    }

    /// Insert a building. Active buildings bring their drones online.
    pub(crate) fn create_building(
        &mut self,
        kind: BuildingKind,
        pos: GridPos,
        condition: BuildingCondition,
    ) -> EntityId {
        let stats = self.config.structures.building(kind);
        let id = self.ids.allocate();
        let mut building = Building::new(id, kind, pos, stats.max_health, self.elapsed_ms);
        building.condition = condition;
        building.production_rate = if condition == BuildingCondition::Abandoned {
            0
        } else {
            stats.production_rate
        };
        self.buildings.insert(id, building);
        if condition == BuildingCondition::Active {
            self.top_up_drones(id);
        }
        id
    }
}
