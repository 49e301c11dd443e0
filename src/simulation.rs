//! The particle simulation collaborator.
//!
//! The renderer only needs a live count and a slot-indexed GPU buffer of
//! `vec4` positions. [`FountainSimulation`] is a small CPU integrator that
//! fills that contract so the viewer runs without an external simulation.

use glam::{Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::backend::{BackendResult, BufferDesc, BufferUsage, GraphicsBackend};
use crate::handle::ResourceHandle;

pub use crate::options::StepPolicy;

/// Fixed simulation step in seconds.
pub const SIMULATION_STEP: f32 = 0.005;

/// A particle system that keeps its positions in a backend buffer.
///
/// Slot `i` of [`position_buffer`](Self::position_buffer) pairs with slot
/// `i` of the billboard quad template; implementations must keep slot
/// assignment stable between steps.
pub trait ParticleSimulation {
    /// Step the simulation by `dt` seconds and upload new positions.
    ///
    /// # Errors
    ///
    /// Any backend error from the upload.
    fn advance(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        dt: f32,
    ) -> BackendResult<()>;

    /// Live particles, occupying slots `0..count()`.
    fn count(&self) -> usize;

    /// Storage buffer of `vec4<f32>` positions, one per slot.
    fn position_buffer(&self) -> ResourceHandle;

    /// Release every backend resource the simulation owns.
    ///
    /// # Errors
    ///
    /// Any backend error from the release.
    fn teardown(
        self: Box<Self>,
        backend: &mut dyn GraphicsBackend,
    ) -> BackendResult<()>;
}

/// Fountain tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct FountainParams {
    /// Spawn point.
    pub emitter: Vec3,
    /// Downward acceleration.
    pub gravity: f32,
    /// Upward launch speed range.
    pub launch_speed: (f32, f32),
    /// Maximum horizontal launch speed.
    pub spread: f32,
    /// Fraction of vertical speed kept after a bounce.
    pub restitution: f32,
    /// Height of the ground plane.
    pub ground_height: f32,
    /// Seconds before a particle respawns.
    pub lifetime: f32,
    /// New particles per second until the cap is reached.
    pub spawn_rate: f32,
    /// RNG seed.
    pub seed: u64,
}

impl Default for FountainParams {
    fn default() -> Self {
        Self {
            emitter: Vec3::new(0.0, 0.5, 0.0),
            gravity: 9.81,
            launch_speed: (8.0, 12.0),
            spread: 2.5,
            restitution: 0.5,
            ground_height: 0.0,
            lifetime: 4.0,
            spawn_rate: 400.0,
            seed: 0x6d65_7461,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Particle {
    position: Vec3,
    velocity: Vec3,
    age: f32,
}

fn spawn(params: &FountainParams, rng: &mut SmallRng) -> Particle {
    let (min_speed, max_speed) = params.launch_speed;
    let spread = params.spread;
    let velocity = Vec3::new(
        rng.random_range(-spread..=spread),
        rng.random_range(min_speed..=max_speed),
        rng.random_range(-spread..=spread),
    );
    Particle {
        position: params.emitter,
        velocity,
        // Stagger respawns so the fountain never pulses.
        age: rng.random::<f32>() * 0.1,
    }
}

/// Gravity fountain with ground bounces and fixed lifetimes.
pub struct FountainSimulation {
    params: FountainParams,
    capacity: usize,
    particles: Vec<Particle>,
    staging: Vec<Vec4>,
    spawn_debt: f32,
    rng: SmallRng,
    positions: ResourceHandle,
}

impl FountainSimulation {
    /// Allocate a position buffer of `capacity` slots. No particles are live
    /// until the first [`advance`](ParticleSimulation::advance).
    ///
    /// # Errors
    ///
    /// Any backend error from the buffer creation.
    pub fn new(
        backend: &mut dyn GraphicsBackend,
        capacity: u32,
        params: FountainParams,
    ) -> BackendResult<Self> {
        let capacity = capacity as usize;
        let staging = vec![Vec4::ZERO; capacity];
        let positions = backend.create_buffer(&BufferDesc {
            label: "Particle Positions",
            usage: BufferUsage::Storage,
            contents: bytemuck::cast_slice(&staging),
        })?;
        log::info!("fountain simulation: {capacity} slots");
        Ok(Self {
            rng: SmallRng::seed_from_u64(params.seed),
            params,
            capacity,
            particles: Vec::with_capacity(capacity),
            staging,
            spawn_debt: 0.0,
            positions,
        })
    }

    /// Maximum live particles.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = Vec3::new(0.0, -self.params.gravity, 0.0);
        let ground = self.params.ground_height;
        let restitution = self.params.restitution;
        let lifetime = self.params.lifetime;

        for p in &mut self.particles {
            p.age += dt;
            if p.age >= lifetime {
                *p = spawn(&self.params, &mut self.rng);
            } else {
                p.velocity += gravity * dt;
                p.position += p.velocity * dt;
                if p.position.y < ground {
                    p.position.y =
                        ground + (ground - p.position.y) * restitution;
                    p.velocity.y = -p.velocity.y * restitution;
                    p.velocity.x *= 0.8;
                    p.velocity.z *= 0.8;
                }
            }
        }

        self.spawn_debt += self.params.spawn_rate * dt;
        while self.spawn_debt >= 1.0 && self.particles.len() < self.capacity {
            self.spawn_debt -= 1.0;
            self.particles.push(spawn(&self.params, &mut self.rng));
        }
        if self.particles.len() == self.capacity {
            self.spawn_debt = 0.0;
        }
    }
}

impl ParticleSimulation for FountainSimulation {
    fn advance(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        dt: f32,
    ) -> BackendResult<()> {
        self.integrate(dt.max(0.0));
        let live = self.particles.len();
        for (slot, p) in self.staging.iter_mut().zip(&self.particles) {
            *slot = p.position.extend(1.0);
        }
        if live == 0 {
            return Ok(());
        }
        let bytes = bytemuck::cast_slice(&self.staging[..live]);
        backend.write_buffer(self.positions, 0, bytes)
    }

    fn count(&self) -> usize {
        self.particles.len()
    }

    fn position_buffer(&self) -> ResourceHandle {
        self.positions
    }

    fn teardown(
        self: Box<Self>,
        backend: &mut dyn GraphicsBackend,
    ) -> BackendResult<()> {
        backend.release(self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::RecordingBackend;

    #[test]
    fn never_exceeds_capacity() {
        let mut backend = RecordingBackend::default();
        let mut sim =
            FountainSimulation::new(&mut backend, 64, FountainParams::default())
                .unwrap();
        assert_eq!(sim.count(), 0);
        for _ in 0..2000 {
            sim.advance(&mut backend, SIMULATION_STEP).unwrap();
            assert!(sim.count() <= 64);
        }
        assert_eq!(sim.count(), 64);
    }

    #[test]
    fn particles_stay_above_ground() {
        let mut backend = RecordingBackend::default();
        let params = FountainParams::default();
        let ground = params.ground_height;
        let mut sim =
            FountainSimulation::new(&mut backend, 32, params).unwrap();
        for _ in 0..1000 {
            sim.advance(&mut backend, 0.01).unwrap();
        }
        assert!(sim.particles.iter().all(|p| p.position.y >= ground - 1e-3));
    }

    #[test]
    fn advance_uploads_live_slots() {
        let mut backend = RecordingBackend::default();
        let mut sim =
            FountainSimulation::new(&mut backend, 16, FountainParams::default())
                .unwrap();
        sim.advance(&mut backend, 0.02).unwrap();
        let live = sim.count();
        assert!(live > 0);

        let bytes = backend.resource_bytes(sim.position_buffer()).unwrap();
        assert_eq!(bytes.len(), 16 * size_of::<Vec4>());
        let uploaded: Vec<[f32; 4]> =
            bytemuck::pod_collect_to_vec(&bytes[..live * size_of::<Vec4>()]);
        assert!(uploaded.iter().all(|p| p[3] == 1.0));
    }

    #[test]
    fn teardown_releases_position_buffer() {
        let mut backend = RecordingBackend::default();
        let sim =
            FountainSimulation::new(&mut backend, 8, FountainParams::default())
                .unwrap();
        assert_eq!(backend.live_resources(), 1);
        Box::new(sim).teardown(&mut backend).unwrap();
        assert_eq!(backend.live_resources(), 0);
    }
}
