use glam::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

use crate::{
    boid::{Boid, Steering, WorldSnapshot},
    borders::RectBorders,
    math_helpers::VectorExt,
    options::{BehaviourFlags, BoidSettings, SettingsError, SettingsPatch},
    pointer::Pointer,
    rectangle::Rectangle,
};

/// Per boid bookkeeping of the last tick, for data collection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoidMetadata {
    pub id: usize,
    pub n_neighbours: usize,
}

/// Owns the boids and the random source driving them.
///
/// Neighbours are found with an O(N^2) scan over all boids.
pub struct Flock {
    boids: Vec<Boid>,
    metadata: Vec<BoidMetadata>,
    settings: BoidSettings,
    flags: BehaviourFlags,
    next_id: usize,
    rng: Xoshiro256PlusPlus,
}

impl Flock {
    /// Creates an empty flock, see [`Flock::set_number_of_boids`].
    pub fn new(settings: BoidSettings, flags: BehaviourFlags, seed: u64) -> Self {
        Flock::with_boids(Vec::new(), settings, flags, seed)
    }

    /// Creates a flock from already placed boids. Ids are reassigned
    /// sequentially in the given order.
    pub fn with_boids(
        boids: Vec<Boid>,
        settings: BoidSettings,
        flags: BehaviourFlags,
        seed: u64,
    ) -> Self {
        let boids: Vec<Boid> = boids
            .into_iter()
            .enumerate()
            .map(|(id, mut boid)| {
                boid.id = id;
                boid
            })
            .collect();
        let metadata = boids
            .iter()
            .map(|boid| BoidMetadata {
                id: boid.id,
                n_neighbours: 0,
            })
            .collect();

        Flock {
            next_id: boids.len(),
            boids,
            metadata,
            settings,
            flags,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Advances every boid by `dt` seconds.
    ///
    /// All forces are computed from the state at the start of the tick before
    /// any boid moves.
    pub fn update(&mut self, dt: f32, borders: &RectBorders, pointer: Option<&Pointer>) {
        let steerings = self.calc_steerings(dt, borders, pointer);
        self.apply_steerings(&steerings, dt);
    }

    fn calc_steerings(
        &mut self,
        dt: f32,
        borders: &RectBorders,
        pointer: Option<&Pointer>,
    ) -> Vec<Steering> {
        let world = WorldSnapshot {
            boids: &self.boids,
            borders,
            pointer,
        };
        let settings = &self.settings;
        let flags = &self.flags;
        let rng = &mut self.rng;

        self.boids
            .iter()
            .map(|boid| boid.calc_net_force(dt, &world, settings, flags, rng))
            .collect()
    }

    fn apply_steerings(&mut self, steerings: &[Steering], dt: f32) {
        for ((boid, metadata), steering) in self
            .boids
            .iter_mut()
            .zip(self.metadata.iter_mut())
            .zip(steerings)
        {
            boid.apply_steering(steering);
            boid.update(steering.net_force, dt, &self.settings);

            metadata.id = boid.id;
            metadata.n_neighbours = steering.n_neighbours;
        }
    }

    /// Grows or shrinks the flock to `n` boids.
    ///
    /// New boids are spawned at rest, uniformly inside `spawn_space` padded by
    /// the boid radius. Shrinking removes the most recently added boids.
    pub fn set_number_of_boids(&mut self, n: usize, spawn_space: &Rectangle) {
        let current = self.boids.len();

        if n <= current {
            self.boids.truncate(n);
            self.metadata.truncate(n);
        } else {
            let spawn_zone = spawn_space.with_padding(self.settings.radius);
            for _ in current..n {
                let id = self.next_id;
                self.next_id += 1;

                let position = Vec2::random_in_rect(&mut self.rng, &spawn_zone);
                self.boids.push(Boid::new(id, position));
                self.metadata.push(BoidMetadata { id, n_neighbours: 0 });
            }
        }

        if n != current {
            debug!(from = current, to = n, "flock resized");
        }
    }

    /// Applies the boid and flag keys of `patch`.
    ///
    /// The flock owns neither the borders nor the spawn space, so
    /// `bordersMaxForce`, `bordersEffectDistance` and `numberOfBoids` are left
    /// to the caller, see [`crate::world::World::change_settings`].
    pub fn change_settings(&mut self, patch: &SettingsPatch) -> Result<(), SettingsError> {
        patch.validate()?;
        patch.apply_to_boids(&mut self.settings);
        patch.apply_to_flags(&mut self.flags);
        Ok(())
    }

    pub fn set_settings(&mut self, settings: BoidSettings, flags: BehaviourFlags) {
        self.settings = settings;
        self.flags = flags;
    }

    pub fn settings(&self) -> &BoidSettings {
        &self.settings
    }

    pub fn flags(&self) -> &BehaviourFlags {
        &self.flags
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn view(&self) -> impl Iterator<Item = (&Boid, &BoidMetadata)> {
        self.boids.iter().zip(self.metadata.iter())
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }
}
