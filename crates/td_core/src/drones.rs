//! Drone behavior: workers build, repairers heal, harvesters haul.
//!
//! Every role runs the same state machine:
//!
//! ```text
//! Idle -> MovingToJob -> Working -> Returning -> Idle
//! ```
//!
//! A drone that loses its task (job gone, target healthy, metal spent)
//! heads home instead of finishing for free.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::{
    BuildingCondition, Cargo, Drone, DroneOwner, DroneRole, DroneState, DroneTask, EntityId,
    Health, JobKind, JobStatus, TargetRef,
};
use crate::data::DroneComplement;
use crate::economy::{EconomyEvent, Resource};
use crate::grid::{GridPos, TileKind};
use crate::math::{step_distance, Fixed, Vec2Fixed};
use crate::simulation::{Simulation, TickEvents};

/// Drone event emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DroneEvent {
    /// A worker claimed a construction job.
    JobClaimed {
        /// Worker.
        drone: EntityId,
        /// Job.
        job: EntityId,
    },
    /// A job finished and its structure was created.
    JobCompleted {
        /// Job.
        job: EntityId,
        /// Site.
        pos: GridPos,
        /// What was built.
        kind: JobKind,
        /// New turret or building.
        entity: EntityId,
    },
    /// A repairer set out for a damaged structure.
    RepairClaimed {
        /// Repairer.
        drone: EntityId,
        /// Structure.
        target: TargetRef,
    },
    /// A repairer brought its target to full health.
    RepairFinished {
        /// Repairer.
        drone: EntityId,
        /// Structure.
        target: TargetRef,
    },
    /// A repairer ran out of metal mid-repair.
    RepairAborted {
        /// Repairer.
        drone: EntityId,
        /// Structure.
        target: TargetRef,
    },
    /// A wrecked structure was healed back into service.
    StructureRestored {
        /// Structure.
        target: TargetRef,
    },
}

/// Move toward the drone's target. Returns true once within `epsilon`.
fn travel(drone: &mut Drone, dt_ms: u32, epsilon: Fixed) -> bool {
    let Some(target) = drone.target_position else {
        return true;
    };
    let (position, _) = drone.position.move_towards(target, step_distance(drone.speed, dt_ms));
    drone.position = position;
    position.within(target, epsilon)
}

const fn deposit_resource(kind: TileKind) -> Option<Resource> {
    match kind {
        TileKind::ResourceStone => Some(Resource::Stone),
        TileKind::ResourceMetal => Some(Resource::Metal),
        _ => None,
    }
}

impl Simulation {
    // ========================================================================
    // Roster
    // ========================================================================

    /// Where a drone rests between tasks. Harvesters rest at the base drop
    /// point; everything else at its owning structure.
    fn drone_home(&self, drone: &Drone) -> Vec2Fixed {
        let base = Vec2Fixed::from_grid(self.base);
        if drone.role == DroneRole::Harvester {
            return base;
        }
        match drone.owner {
            DroneOwner::Base => base,
            DroneOwner::Building(id) => self.buildings.get(id).map_or(base, |b| b.position()),
        }
    }

    fn drone_speed(&self, role: DroneRole) -> Fixed {
        match role {
            DroneRole::Worker | DroneRole::Repair => self.config.drones.speed,
            DroneRole::Harvester => self.config.drones.harvester_speed,
        }
    }

    /// Spawn `count` idle drones of `role` for `owner` at `at`.
    fn spawn_role(
        &mut self,
        owner: DroneOwner,
        role: DroneRole,
        count: u32,
        at: Vec2Fixed,
        spawned: &mut Vec<EntityId>,
    ) {
        let speed = self.drone_speed(role);
        for _ in 0..count {
            let id = self.ids.allocate();
            self.drones.insert(id, Drone::new(id, role, owner, at, speed));
            tracing::trace!(drone = id, ?role, ?owner, "Drone spawned");
            spawned.push(id);
        }
    }

    /// Spawn a full complement for `owner`.
    pub(crate) fn spawn_drones(
        &mut self,
        owner: DroneOwner,
        complement: DroneComplement,
        at: Vec2Fixed,
    ) -> Vec<EntityId> {
        let mut spawned = Vec::new();
        self.spawn_role(owner, DroneRole::Worker, complement.workers, at, &mut spawned);
        self.spawn_role(owner, DroneRole::Repair, complement.repairers, at, &mut spawned);
        self.spawn_role(owner, DroneRole::Harvester, complement.harvesters, at, &mut spawned);
        spawned
    }

    /// Bring a building's drones up to exactly its complement.
    ///
    /// Drones are never destroyed, so restoring a building twice cannot
    /// duplicate them.
    pub(crate) fn top_up_drones(&mut self, building: EntityId) -> Vec<EntityId> {
        let Some((kind, at)) = self.buildings.get(building).map(|b| (b.kind, b.position())) else {
            return Vec::new();
        };
        let complement = self.config.structures.building(kind).drones;
        let owner = DroneOwner::Building(building);
        let count = |role| {
            self.drones
                .values()
                .filter(|d| d.owner == owner && d.role == role)
                .count() as u32
        };
        let missing = DroneComplement {
            workers: complement.workers.saturating_sub(count(DroneRole::Worker)),
            repairers: complement.repairers.saturating_sub(count(DroneRole::Repair)),
            harvesters: complement.harvesters.saturating_sub(count(DroneRole::Harvester)),
        };
        self.spawn_drones(owner, missing, at)
    }

    fn send_home(&self, drone: &mut Drone) {
        drone.state = DroneState::Returning;
        drone.task = None;
        drone.work_ms = 0;
        drone.target_position = Some(self.drone_home(drone));
    }

    // ========================================================================
    // Structure health (shared with direct repair commands)
    // ========================================================================

    /// Health of a repairable structure. Abandoned buildings are restored
    /// by command, never healed.
    pub(crate) fn structure_health(&self, target: TargetRef) -> Option<Health> {
        match target {
            TargetRef::Turret(id) => self.turrets.get(id).map(|t| t.health),
            TargetRef::Building(id) => self
                .buildings
                .get(id)
                .filter(|b| b.condition != BuildingCondition::Abandoned)
                .map(|b| b.health),
            TargetRef::Enemy(_) | TargetRef::Hero | TargetRef::Base => None,
        }
    }

    fn needs_repair(&self, target: TargetRef) -> bool {
        self.structure_health(target).is_some_and(|h| !h.is_full())
    }

    /// Heal a structure. Returns the amount healed and whether a wreck was
    /// brought back into service.
    ///
    /// A restored building's drones are not topped up here; the caller does
    /// that once every drone is back in the store.
    pub(crate) fn heal_structure(&mut self, target: TargetRef, amount: u32) -> (u32, bool) {
        match target {
            TargetRef::Turret(id) => {
                let Some(turret) = self.turrets.get_mut(id) else {
                    return (0, false);
                };
                let healed = turret.health.heal(amount);
                let restored = turret.is_wreckage && turret.health.is_full();
                if restored {
                    turret.is_wreckage = false;
                    tracing::info!(turret = id, pos = %turret.pos, "Turret restored from wreckage");
                }
                (healed, restored)
            }
            TargetRef::Building(id) => {
                let now = self.elapsed_ms;
                let Some(building) = self.buildings.get_mut(id) else {
                    return (0, false);
                };
                if building.condition == BuildingCondition::Abandoned {
                    return (0, false);
                }
                let healed = building.health.heal(amount);
                let restored =
                    building.condition == BuildingCondition::Wrecked && building.health.is_full();
                if restored {
                    building.condition = BuildingCondition::Active;
                    building.last_production_ms = now;
                    tracing::info!(
                        building = id,
                        pos = %building.pos,
                        "Building restored from wreckage"
                    );
                }
                (healed, restored)
            }
            TargetRef::Enemy(_) | TargetRef::Hero | TargetRef::Base => (0, false),
        }
    }

    // ========================================================================
    // Workers
    // ========================================================================

    fn update_worker(&mut self, drone: &mut Drone, dt_ms: u32, events: &mut TickEvents) {
        match drone.state {
            DroneState::Idle => {
                // Oldest unclaimed job first: stores iterate in id order.
                let Some(job) = self
                    .jobs
                    .values_mut()
                    .find(|j| j.status == JobStatus::Pending && j.assigned_drone.is_none())
                else {
                    return;
                };
                job.status = JobStatus::InProgress;
                job.assigned_drone = Some(drone.id);
                drone.task = Some(DroneTask::Build(job.id));
                drone.target_position = Some(Vec2Fixed::from_grid(job.pos));
                drone.state = DroneState::MovingToJob;
                tracing::trace!(drone = drone.id, job = job.id, "Worker claimed job");
                events.drones.push(DroneEvent::JobClaimed {
                    drone: drone.id,
                    job: job.id,
                });
            }
            DroneState::MovingToJob => {
                if drone.job().and_then(|job| self.jobs.get(job)).is_none() {
                    self.send_home(drone);
                    return;
                }
                if travel(drone, dt_ms, self.config.drones.arrival_epsilon) {
                    drone.state = DroneState::Working;
                }
            }
            DroneState::Working => {
                let gained = Fixed::from_num(self.config.drones.build_rate) * Fixed::from_num(dt_ms)
                    / Fixed::from_num(1000);
                let Some(job) = drone.job().and_then(|job| self.jobs.get_mut(job)) else {
                    self.send_home(drone);
                    return;
                };
                job.progress = (job.progress + gained).min(Fixed::from_num(100));
                if job.progress >= Fixed::from_num(100) {
                    let job = job.id;
                    self.complete_job(job, events);
                    self.send_home(drone);
                }
            }
            DroneState::Returning => {
                if travel(drone, dt_ms, self.config.drones.arrival_epsilon) {
                    drone.state = DroneState::Idle;
                    drone.target_position = None;
                }
            }
        }
    }

    // ========================================================================
    // Repairers
    // ========================================================================

    /// Nearest damaged structure within the repair radius of `home` that
    /// no other drone has claimed.
    fn find_repair_target(&self, drone: &Drone, home: Vec2Fixed) -> Option<(TargetRef, Vec2Fixed)> {
        let radius = self.config.drones.repair_radius;
        let claimed: BTreeSet<TargetRef> = self
            .drones
            .values()
            .filter(|d| d.id != drone.id)
            .filter_map(|d| match d.task {
                Some(DroneTask::Repair(target)) => Some(target),
                _ => None,
            })
            .collect();

        let turrets = self
            .turrets
            .values()
            .filter(|t| !t.health.is_full())
            .map(|t| (TargetRef::Turret(t.id), t.position()));
        let buildings = self
            .buildings
            .values()
            .filter(|b| b.condition != BuildingCondition::Abandoned && !b.health.is_full())
            .map(|b| (TargetRef::Building(b.id), b.position()));

        turrets
            .chain(buildings)
            .filter(|(target, at)| home.within(*at, radius) && !claimed.contains(target))
            .min_by_key(|(target, at)| (drone.position.distance_squared(*at), *target))
    }

    /// Accrue repair work, pay for it in metal and heal.
    fn repair_step(
        &mut self,
        drone: &mut Drone,
        target: TargetRef,
        dt_ms: u32,
        events: &mut TickEvents,
    ) {
        let Some(health) = self.structure_health(target) else {
            self.send_home(drone);
            return;
        };

        drone.work_ms = drone
            .work_ms
            .saturating_add(dt_ms.saturating_mul(self.config.drones.repair_rate));
        let points = (drone.work_ms / 1000).min(health.missing());
        drone.work_ms %= 1000;

        let hp_per_metal = self.config.drones.repair_hp_per_metal.max(1);
        while drone.paid_repair < points {
            if self.resources.spend_up_to(Resource::Metal, 1) == 0 {
                break;
            }
            drone.paid_repair += hp_per_metal;
        }
        let affordable = points.min(drone.paid_repair);
        drone.paid_repair -= affordable;

        let (_, restored) = self.heal_structure(target, affordable);
        if restored {
            events.drones.push(DroneEvent::StructureRestored { target });
        }

        if affordable < points {
            tracing::debug!(drone = drone.id, ?target, "Repair aborted: out of metal");
            events.drones.push(DroneEvent::RepairAborted {
                drone: drone.id,
                target,
            });
            self.send_home(drone);
        } else if !self.needs_repair(target) {
            events.drones.push(DroneEvent::RepairFinished {
                drone: drone.id,
                target,
            });
            self.send_home(drone);
        }
    }

    fn update_repairer(&mut self, drone: &mut Drone, dt_ms: u32, events: &mut TickEvents) {
        match drone.state {
            DroneState::Idle => {
                let home = self.drone_home(drone);
                let Some((target, at)) = self.find_repair_target(drone, home) else {
                    return;
                };
                drone.task = Some(DroneTask::Repair(target));
                drone.target_position = Some(at);
                drone.state = DroneState::MovingToJob;
                tracing::trace!(drone = drone.id, ?target, "Repairer dispatched");
                events.drones.push(DroneEvent::RepairClaimed {
                    drone: drone.id,
                    target,
                });
            }
            DroneState::MovingToJob => {
                let Some(DroneTask::Repair(target)) = drone.task else {
                    self.send_home(drone);
                    return;
                };
                if !self.needs_repair(target) {
                    self.send_home(drone);
                    return;
                }
                if travel(drone, dt_ms, self.config.drones.arrival_epsilon) {
                    drone.state = DroneState::Working;
                    drone.work_ms = 0;
                }
            }
            DroneState::Working => match drone.task {
                Some(DroneTask::Repair(target)) => self.repair_step(drone, target, dt_ms, events),
                _ => self.send_home(drone),
            },
            DroneState::Returning => {
                if travel(drone, dt_ms, self.config.drones.arrival_epsilon) {
                    drone.state = DroneState::Idle;
                    drone.target_position = None;
                }
            }
        }
    }

    // ========================================================================
    // Harvesters
    // ========================================================================

    fn nearest_deposit(&self, from: Vec2Fixed) -> Option<GridPos> {
        self.grid
            .iter()
            .filter(|(_, kind)| deposit_resource(*kind).is_some())
            .min_by_key(|(pos, _)| (from.distance_squared(Vec2Fixed::from_grid(*pos)), *pos))
            .map(|(pos, _)| pos)
    }

    fn update_harvester(&mut self, drone: &mut Drone, dt_ms: u32, events: &mut TickEvents) {
        match drone.state {
            DroneState::Idle => {
                let Some(site) = self.nearest_deposit(drone.position) else {
                    return;
                };
                drone.task = Some(DroneTask::Harvest(site));
                drone.target_position = Some(Vec2Fixed::from_grid(site));
                drone.state = DroneState::MovingToJob;
                drone.work_ms = 0;
            }
            DroneState::MovingToJob => {
                if travel(drone, dt_ms, self.config.drones.arrival_epsilon) {
                    drone.state = DroneState::Working;
                }
            }
            DroneState::Working => {
                let resource = match drone.task {
                    Some(DroneTask::Harvest(site)) => {
                        self.grid.get(site).and_then(deposit_resource)
                    }
                    _ => None,
                };
                let Some(resource) = resource else {
                    // Deposit built over or cleared while gathering.
                    self.send_home(drone);
                    return;
                };
                drone.work_ms = drone.work_ms.saturating_add(dt_ms);
                if drone.work_ms >= self.config.drones.harvest_time_ms {
                    drone.cargo = Some(Cargo {
                        resource,
                        amount: self.config.drones.harvest_capacity,
                    });
                    self.send_home(drone);
                }
            }
            DroneState::Returning => {
                if travel(drone, dt_ms, self.config.drones.arrival_epsilon) {
                    if let Some(cargo) = drone.cargo.take() {
                        self.resources.deposit(cargo.resource, cargo.amount);
                        events.economy.push(EconomyEvent::Delivered {
                            drone: drone.id,
                            resource: cargo.resource,
                            amount: cargo.amount,
                        });
                    }
                    drone.state = DroneState::Idle;
                    drone.target_position = None;
                }
            }
        }
    }

    /// Advance every drone one step, in id order.
    pub(crate) fn run_drone_system(&mut self, dt_ms: u32, events: &mut TickEvents) {
        let first_event = events.drones.len();
        for id in self.drones.ids() {
            let Some(mut drone) = self.drones.remove(id) else {
                continue;
            };
            match drone.role {
                DroneRole::Worker => self.update_worker(&mut drone, dt_ms, events),
                DroneRole::Repair => self.update_repairer(&mut drone, dt_ms, events),
                DroneRole::Harvester => self.update_harvester(&mut drone, dt_ms, events),
            }
            self.drones.insert(id, drone);
        }

        // The drone being updated is out of the store, so restored owners
        // are only topped up once the pass is over.
        let restored: Vec<EntityId> = events.drones[first_event..]
            .iter()
            .filter_map(|event| match event {
                DroneEvent::StructureRestored {
                    target: TargetRef::Building(id),
                } => Some(*id),
                _ => None,
            })
            .collect();
        for building in restored {
            self.top_up_drones(building);
        }
    }
}
