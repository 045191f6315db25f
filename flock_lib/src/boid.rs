use std::ptr;

use glam::f32::Vec2;
use rand::Rng;
use tracing::debug;

use crate::{
    borders::RectBorders,
    math_helpers::{map_range, wrap_angle, VectorExt},
    options::{BehaviourFlags, BoidSettings},
    pointer::Pointer,
};

/// An idle search towards a random point, only held while the boid sees no one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchState {
    pub target_position: Vec2,
    /// seconds left before the search is abandoned
    pub time_remaining: f32,
}

/// Read-only state of the world as it was at the start of the tick.
///
/// A boid computing its force must be an element of `boids`, it is told
/// apart from the others by address and not by id.
#[derive(Debug, Clone, Copy)]
pub struct WorldSnapshot<'a> {
    pub boids: &'a [Boid],
    pub borders: &'a RectBorders,
    pub pointer: Option<&'a Pointer>,
}

/// Result of the force calculation for one boid and one tick.
///
/// Carries the behavioural state the calculation decided on, it is committed
/// by [`Boid::apply_steering`] once every boid of the flock has been computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub net_force: Vec2,
    pub search: Option<SearchState>,
    pub slowing: bool,
    pub n_neighbours: usize,
}

/// Self applied force before the overall clamp and the borders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SelfForce {
    pub force: Vec2,
    pub search: Option<SearchState>,
    pub slowing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    // sequential id starting from 0, unique within a flock
    pub id: usize,
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    /// direction of the last non-zero velocity, 0 until the boid first moves
    heading: f32,
    current_search: Option<SearchState>,
    slowing: bool,
}

impl Boid {
    /// Creates a new [`Boid`] at rest.
    pub fn new(id: usize, position: Vec2) -> Self {
        Boid::with_velocity(id, position, Vec2::ZERO)
    }

    pub fn with_velocity(id: usize, position: Vec2, velocity: Vec2) -> Self {
        Boid {
            id,
            position,
            velocity,
            acceleration: Vec2::ZERO,
            heading: if velocity == Vec2::ZERO {
                0.
            } else {
                velocity.heading()
            },
            current_search: None,
            slowing: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn current_search(&self) -> Option<&SearchState> {
        self.current_search.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.current_search.is_some()
    }

    /// Whether the last arrive behaviour was braking.
    pub fn slowing(&self) -> bool {
        self.slowing
    }

    /// Computes the force this boid wants to apply during the next `dt`
    /// seconds. Never mutates the boid, see [`Steering`].
    ///
    /// `dt` must be strictly positive.
    pub fn calc_net_force<R: Rng + ?Sized>(
        &self,
        dt: f32,
        world: &WorldSnapshot,
        settings: &BoidSettings,
        flags: &BehaviourFlags,
        rng: &mut R,
    ) -> Steering {
        debug_assert!(dt > 0., "dt must be positive, got {}", dt);

        let neighbours = self.neighbours(world.boids, settings, flags);
        let self_force =
            self.calc_self_applied_force(dt, &neighbours, world, settings, flags, rng);

        let border_force = world.borders.calc_force(self.position, settings.radius);

        Steering {
            // borders are a harder constraint than the social forces
            net_force: self_force.force.limit_magnitude(settings.max_force) + border_force,
            search: self_force.search,
            slowing: self_force.slowing,
            n_neighbours: neighbours.len(),
        }
    }

    pub(crate) fn calc_self_applied_force<R: Rng + ?Sized>(
        &self,
        dt: f32,
        neighbours: &[&Boid],
        world: &WorldSnapshot,
        settings: &BoidSettings,
        flags: &BehaviourFlags,
        rng: &mut R,
    ) -> SelfForce {
        let (mut force, search, slowing) = if neighbours.is_empty() {
            let search = self.current_search.unwrap_or_else(|| SearchState {
                target_position: Vec2::random_in_rect(rng, &world.borders.free_zone()),
                time_remaining: settings.max_search_time,
            });
            let (force, slowing) = self.calc_arrive_force(search.target_position, dt, settings);
            (force, Some(search), slowing)
        } else {
            let (force, slowing) = self.calc_flock_force(neighbours, dt, settings);
            (force, None, slowing)
        };

        if flags.stalemate_breaking
            && neighbours.len() == 1
            && self.is_in_stalemate_with(neighbours[0])
        {
            force += Vec2::random_with_magnitude(rng, settings.max_force);
        }

        if flags.pointer_avoidance {
            if let Some(pointer_position) = world.pointer.and_then(Pointer::active_position) {
                if self.is_in_view(pointer_position, 0., settings, flags) {
                    force += self.calc_avoid_force(pointer_position, dt)
                        * settings.pointer_force_factor;
                }
            }
        }

        SelfForce {
            force,
            search,
            slowing,
        }
    }

    /// Every other boid this boid perceives, see [`Boid::is_in_view`].
    /// `self` is skipped only when it is an element of `others`.
    pub fn neighbours<'a>(
        &self,
        others: &'a [Boid],
        settings: &BoidSettings,
        flags: &BehaviourFlags,
    ) -> Vec<&'a Boid> {
        others
            .iter()
            .filter(|other| {
                !ptr::eq(*other, self) && self.is_in_view(other.position, settings.radius, settings, flags)
            })
            .collect()
    }

    /// A point (with a radius) is in view when it is within reach of this
    /// boid's radius plus its view distance and, with the field of view
    /// enabled, inside the view cone around the heading.
    pub fn is_in_view(
        &self,
        other_position: Vec2,
        other_radius: f32,
        settings: &BoidSettings,
        flags: &BehaviourFlags,
    ) -> bool {
        if !self.position.distance_lte(
            other_position,
            settings.radius + settings.view_distance + other_radius,
        ) {
            return false;
        }

        if !flags.field_of_view {
            return true;
        }

        let angle = (other_position - self.position).heading();
        let diff_angle = wrap_angle(angle - self.heading);
        let half_view = settings.angle_of_view / 2.;

        -half_view <= diff_angle && diff_angle <= half_view
    }

    /// Two boids moving exactly head on (or exactly apart) whose steering
    /// would cancel out forever.
    pub fn is_in_stalemate_with(&self, other: &Boid) -> bool {
        self.velocity != Vec2::ZERO
            && other.velocity != Vec2::ZERO
            && self.velocity.perp_dot(other.velocity) == 0.
            && self.velocity.dot(other.velocity) < 0.
    }

    fn calc_flock_force(
        &self,
        neighbours: &[&Boid],
        dt: f32,
        settings: &BoidSettings,
    ) -> (Vec2, bool) {
        let (cohesion, slowing) = self.calc_cohesion_force(neighbours, dt, settings);

        let force = self.calc_separation_force(neighbours, dt, settings) * settings.separation_factor
            + self.calc_alignment_force(neighbours, dt, settings) * settings.alignment_factor
            + cohesion * settings.cohesion_factor;

        (force, slowing)
    }

    /// Pushes away from every neighbour closer than the desired separation,
    /// harder the closer it is. The summed push is divided by `dt`: it is the
    /// force needed this instant rather than a physical force.
    pub fn calc_separation_force(
        &self,
        neighbours: &[&Boid],
        dt: f32,
        settings: &BoidSettings,
    ) -> Vec2 {
        let d = settings.desired_separation_distance;

        let push = Vec2::sum_of(
            neighbours
                .iter()
                .filter(|other| self.position.distance_lt(other.position, d))
                .map(|other| {
                    let distance = self.position.distance(other.position);
                    (self.position - other.position)
                        .with_magnitude(map_range(distance, 0., d, settings.max_force, 0.))
                }),
        );

        (push / dt).limit_magnitude(settings.max_force)
    }

    pub fn calc_alignment_force(
        &self,
        neighbours: &[&Boid],
        dt: f32,
        settings: &BoidSettings,
    ) -> Vec2 {
        let average_heading = Vec2::sum_of(neighbours.iter().map(|other| other.velocity.unit()));
        let desired_velocity = average_heading.with_magnitude(settings.desired_flock_speed);

        self.calc_steer_force(desired_velocity, dt, settings)
    }

    pub fn calc_cohesion_force(
        &self,
        neighbours: &[&Boid],
        dt: f32,
        settings: &BoidSettings,
    ) -> (Vec2, bool) {
        let positions: Vec<Vec2> = neighbours.iter().map(|other| other.position).collect();
        self.calc_arrive_force(Vec2::average_of(&positions), dt, settings)
    }

    /// Flee from `position`, inversely proportional to the squared distance.
    fn calc_avoid_force(&self, position: Vec2, dt: f32) -> Vec2 {
        let away = self.position - position;
        let distance_squared = away.length_squared();
        if distance_squared == 0. {
            return Vec2::ZERO;
        }

        away.with_magnitude(1. / distance_squared) / dt
    }

    /// Steers towards `target` and brakes once within stopping distance.
    /// Returns the force and whether it is braking.
    ///
    /// The stopping distance assumes a straight line to the target, so it
    /// brakes early when the boid still has to turn a lot.
    pub fn calc_arrive_force(&self, target: Vec2, dt: f32, settings: &BoidSettings) -> (Vec2, bool) {
        let speed_squared = self.velocity.length_squared();
        let stopping_distance =
            0.5 * speed_squared / settings.max_force + settings.max_speed * dt;

        if self.position.distance_lte(target, stopping_distance) {
            let distance = self.position.distance(target);
            if distance == 0. || speed_squared == 0. {
                return (Vec2::ZERO, true);
            }

            let braking = (0.5 * speed_squared / distance).min(settings.max_force);
            return (self.velocity.with_magnitude(-braking), true);
        }

        let desired_velocity = (target - self.position).with_magnitude(settings.max_speed);
        (self.calc_steer_force(desired_velocity, dt, settings), false)
    }

    /// Force needed to reach `desired_velocity` within `dt`, capped at max force.
    pub fn calc_steer_force(&self, desired_velocity: Vec2, dt: f32, settings: &BoidSettings) -> Vec2 {
        ((desired_velocity - self.velocity) / dt).limit_magnitude(settings.max_force)
    }

    /// Commits the behavioural state decided during the force calculation.
    pub fn apply_steering(&mut self, steering: &Steering) {
        match (&self.current_search, &steering.search) {
            (None, Some(search)) => debug!(
                id = self.id,
                target_x = search.target_position.x,
                target_y = search.target_position.y,
                "boid started searching"
            ),
            (Some(_), None) => debug!(id = self.id, "boid found company, search dropped"),
            _ => (),
        }

        self.current_search = steering.search;
        self.slowing = steering.slowing;
    }

    /// Moves the boid under `net_force` for `dt` seconds.
    ///
    /// The displacement uses the average of the initial and final velocity,
    /// exact for a constant force over the tick.
    pub fn update(&mut self, net_force: Vec2, dt: f32, settings: &BoidSettings) {
        debug_assert!(dt > 0., "dt must be positive, got {}", dt);

        self.acceleration = net_force;

        let final_velocity = self.velocity + self.acceleration * dt;
        let displacement = (self.velocity + final_velocity) / 2. * dt;
        self.velocity = final_velocity;
        self.position += displacement;

        if self.velocity != Vec2::ZERO {
            self.heading = self.velocity.heading();
        }

        let position = self.position;
        let finished = match self.current_search.as_mut() {
            Some(search) => {
                search.time_remaining -= dt;
                let reached = position.distance_lte(
                    search.target_position,
                    settings.search_target_reach_radius + settings.radius,
                );
                search.time_remaining <= 0. || reached
            }
            None => false,
        };

        if finished {
            debug!(id = self.id, "boid search finished");
            self.current_search = None;
        }
    }
}
