// ==============================================================================
// physics.rs — RAPIER HOST WORLD
// ------------------------------------------------------------------------------
// Wires the engine-agnostic vehicle to rapier:
// - RigidBodyService for rapier's RigidBody (pose, velocities, forces)
// - RapierGround: GroundQueryService over the QueryPipeline, chassis excluded,
//   filtered by collision group bits
// - PhysicsWorld: ground box + hosted vehicles + fixed step
//
// Step order:
// 1) clear last step's user forces on every vehicle body
// 2) refresh query pipeline
// 3) per vehicle: Vehicle::step against the ground, then apply its forces
// 4) rapier pipeline step
// 5) reset bodies that left the world (non-finite or far away)
// ==============================================================================

use rapier3d::prelude::*;
use tracing::{info, warn};

use crate::debug_builders::{build_vehicle_telemetry, VehicleTelemetry};
use crate::error::ConfigError;
use crate::input::InputSource;
use crate::vehicle::{Vehicle, VehicleConfig, VehicleStepOutput};
use crate::wheel_sim::kinematics::point_velocity;
use crate::wheel_sim::services::{GroundHit, GroundQueryService, RigidBodyService};

pub const GROUP_GROUND: Group = Group::GROUP_1;
pub const GROUP_CHASSIS: Group = Group::GROUP_2;

/// Bodies beyond this distance from the origin are reset to their spawn point.
const WORLD_LIMIT: f32 = 1_000.0;

impl RigidBodyService for RigidBody {
    fn pose(&self) -> Isometry<Real> {
        *self.position()
    }

    fn linear_velocity(&self) -> Vector<Real> {
        *self.linvel()
    }

    fn point_velocity(&self, point: &Point<Real>) -> Vector<Real> {
        point_velocity(self.linvel(), self.angvel(), self.center_of_mass(), point)
    }

    fn add_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>) {
        RigidBody::add_force_at_point(self, force, point, true);
    }
}

/// Ray queries against every collider except the chassis being simulated.
pub struct RapierGround<'a> {
    pub bodies: &'a RigidBodySet,
    pub colliders: &'a ColliderSet,
    pub query_pipeline: &'a QueryPipeline,
    pub exclude: RigidBodyHandle,
}

impl GroundQueryService for RapierGround<'_> {
    fn cast(
        &self,
        origin: &Point<Real>,
        direction: &Vector<Real>,
        max_distance: f32,
        mask: u32,
    ) -> Option<GroundHit> {
        let ray = Ray::new(*origin, *direction);
        let filter = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .groups(InteractionGroups::new(Group::ALL, Group::from_bits_truncate(mask)));

        self.query_pipeline
            .cast_ray_and_get_normal(self.bodies, self.colliders, &ray, max_distance, true, filter)
            .map(|(_, hit)| GroundHit {
                distance: hit.time_of_impact,
                normal: hit.normal,
            })
    }
}

pub struct HostedVehicle<S: InputSource> {
    pub name: String,
    pub body: RigidBodyHandle,
    pub spawn: Isometry<Real>,
    pub vehicle: Vehicle<S>,
}

pub struct PhysicsWorld<S: InputSource> {
    pub gravity: Vector<Real>,
    pub pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd: CCDSolver,
    pub query_pipeline: QueryPipeline,
    pub vehicles: Vec<HostedVehicle<S>>,
    pub tick: u64,
}

impl<S: InputSource> PhysicsWorld<S> {
    /// Empty world with a large static ground box whose top face is y = 0.
    pub fn new(gravity: Vector<Real>) -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -0.5, 0.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 0.5, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: Vec::new(),
            tick: 0,
        }
    }

    /// Dynamic box chassis with the vehicle's wheels hung off it.
    /// Returns the index into `vehicles`.
    pub fn spawn_vehicle(
        &mut self,
        name: impl Into<String>,
        config: &VehicleConfig,
        position: [f32; 3],
        source: S,
    ) -> Result<usize, ConfigError> {
        let name = name.into();
        let vehicle = Vehicle::new(config, self.gravity, source)?;

        let [hx, hy, hz] = config.chassis_half_extents;
        let [cx, cy, cz] = config.chassis_com_offset;
        let density = config.mass / (8.0 * hx * hy * hz); // ρ = m / V

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .ccd_enabled(true)
            .build();

        // chassis only collides with the ground; wheels are rays
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![cx, cy, cz])
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .density(density)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let body = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, body, &mut self.bodies);
        let spawn = *self.bodies[body].position();

        info!(%name, ?position, ?body, "spawned vehicle");

        self.vehicles.push(HostedVehicle { name, body, spawn, vehicle });
        Ok(self.vehicles.len() - 1)
    }

    /// Remove a vehicle's chassis body. Its vehicle disables itself on the
    /// next step.
    pub fn remove_body(&mut self, body: RigidBodyHandle) {
        self.bodies.remove(
            body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn apply_vehicles(&mut self, dt: Real) {
        for hosted in &self.vehicles {
            if let Some(body) = self.bodies.get_mut(hosted.body) {
                body.reset_forces(true);
            }
        }

        self.query_pipeline.update(&self.colliders);

        for hosted in &mut self.vehicles {
            let Some(body) = self.bodies.get(hosted.body) else {
                hosted.vehicle.disable("chassis body missing");
                continue;
            };

            let ground = RapierGround {
                bodies: &self.bodies,
                colliders: &self.colliders,
                query_pipeline: &self.query_pipeline,
                exclude: hosted.body,
            };
            let output: Option<VehicleStepOutput> = hosted.vehicle.step(dt, body, &ground);

            if let (Some(output), Some(body)) = (output, self.bodies.get_mut(hosted.body)) {
                output.apply(body);
            }
        }
    }

    pub fn step(&mut self, dt: Real) {
        self.apply_vehicles(dt);

        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        for hosted in &mut self.vehicles {
            let Some(body) = self.bodies.get_mut(hosted.body) else { continue };
            let pos = *body.translation();
            let lost = !(pos.x.is_finite() && pos.y.is_finite() && pos.z.is_finite())
                || pos.amax() > WORLD_LIMIT;

            if lost {
                body.set_position(hosted.spawn, true);
                body.set_linvel(Vector::zeros(), true);
                body.set_angvel(Vector::zeros(), true);
                hosted.vehicle.reset();
                warn!(name = %hosted.name, ?pos, "reset vehicle that left the world");
            }
        }

        self.tick += 1;
    }

    pub fn body(&self, index: usize) -> Option<&RigidBody> {
        self.vehicles.get(index).and_then(|h| self.bodies.get(h.body))
    }

    /// Snapshots of every vehicle whose body still exists.
    pub fn telemetry(&self) -> Vec<VehicleTelemetry> {
        self.vehicles
            .iter()
            .filter_map(|h| {
                let body = self.bodies.get(h.body)?;
                Some(build_vehicle_telemetry(&h.name, self.tick, body.position(), &h.vehicle))
            })
            .collect()
    }
}
