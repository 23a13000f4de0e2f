//! Core flocking types shared across the boidsim workspace.
//!
//! The simulation follows Reynolds' classic steering model: every boid
//! computes separation, alignment, and cohesion forces against the whole
//! population, then integrates them into motion. Neighbor scans are plain
//! O(n²) distance checks by design; forces for a tick are always computed
//! against a consistent pre-update snapshot before any boid is integrated.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use thiserror::Error;

new_key_type! {
    /// Stable handle for boids backed by a generational slot map.
    pub struct BoidId;
}

/// Convenience alias for associating side data with boids.
pub type BoidMap<T> = SecondaryMap<BoidId, T>;

/// Number of force samples retained for color smoothing.
pub const FORCE_WINDOW: usize = 10;

/// High level simulation clock (ticks processed since boot).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Linear RGB color. Channels are deliberately unclamped: force transients
/// can push them outside [0, 1], and the render boundary is where clamping
/// happens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Construct a color from raw channel values.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Map an averaged squared-force sample to a color.
    ///
    /// Each channel is a monotonically decreasing function of one force
    /// term. The cross-mapping is fixed: red tracks the separation term
    /// (`avg.y`), green the alignment term (`avg.x`), blue the cohesion
    /// term (`avg.z`).
    #[must_use]
    pub fn from_force_average(avg: Vec3, color_scale: f32) -> Self {
        Self {
            r: 1.0 - avg.y * color_scale,
            g: 1.0 - avg.x * color_scale,
            b: 1.0 - avg.z * color_scale,
        }
    }

    /// Copy with every channel clamped to [0, 1].
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One trail sample: where the boid was and what color it carried.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrailPoint {
    pub position: Vec2,
    pub color: Color,
    /// Linear fade from 0 (oldest) toward 1 (newest), rebuilt every tick.
    pub alpha: f32,
}

/// Weighted steering forces computed for one boid during a tick.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SteeringForces {
    pub separation: Vec2,
    pub alignment: Vec2,
    pub cohesion: Vec2,
}

impl SteeringForces {
    /// Sum of the three force components.
    #[must_use]
    pub fn total(&self) -> Vec2 {
        self.separation + self.alignment + self.cohesion
    }
}

/// Scalar fields for a single boid used when inserting or snapshotting
/// from the SoA store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoidData {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Orientation in degrees; 0 points "up" (the -90° offset is applied
    /// when the heading is derived from velocity).
    pub heading: f32,
    pub color: Color,
}

impl BoidData {
    /// Creates a boid payload at `position` with everything else at rest.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for BoidData {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            heading: 0.0,
            color: Color::WHITE,
        }
    }
}

/// Collection of per-boid columns for hot-path iteration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BoidColumns {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    accelerations: Vec<Vec2>,
    headings: Vec<f32>,
    colors: Vec<Color>,
}

impl BoidColumns {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            accelerations: Vec::with_capacity(capacity),
            headings: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    /// Number of active rows in the columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if there are no active rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve additional capacity in each backing vector.
    pub fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.velocities.reserve(additional);
        self.accelerations.reserve(additional);
        self.headings.reserve(additional);
        self.colors.reserve(additional);
    }

    /// Remove all rows while retaining capacity.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.velocities.clear();
        self.accelerations.clear();
        self.headings.clear();
        self.colors.clear();
    }

    /// Push a new row onto each column.
    pub fn push(&mut self, boid: BoidData) {
        self.positions.push(boid.position);
        self.velocities.push(boid.velocity);
        self.accelerations.push(boid.acceleration);
        self.headings.push(boid.heading);
        self.colors.push(boid.color);
        self.debug_assert_coherent();
    }

    /// Swap-remove the row at `index` and return its scalar fields.
    pub fn swap_remove(&mut self, index: usize) -> BoidData {
        let removed = BoidData {
            position: self.positions.swap_remove(index),
            velocity: self.velocities.swap_remove(index),
            acceleration: self.accelerations.swap_remove(index),
            heading: self.headings.swap_remove(index),
            color: self.colors.swap_remove(index),
        };
        self.debug_assert_coherent();
        removed
    }

    /// Copy the row at `from` into position `to` without altering length.
    pub fn move_row(&mut self, from: usize, to: usize) {
        debug_assert!(from < self.len(), "move_row from out of bounds");
        debug_assert!(to < self.len(), "move_row to out of bounds");
        if from == to {
            return;
        }
        self.positions[to] = self.positions[from];
        self.velocities[to] = self.velocities[from];
        self.accelerations[to] = self.accelerations[from];
        self.headings[to] = self.headings[from];
        self.colors[to] = self.colors[from];
    }

    /// Truncate all columns to the provided length.
    pub fn truncate(&mut self, len: usize) {
        self.positions.truncate(len);
        self.velocities.truncate(len);
        self.accelerations.truncate(len);
        self.headings.truncate(len);
        self.colors.truncate(len);
        self.debug_assert_coherent();
    }

    /// Return a copy of the scalar fields at `index`.
    #[must_use]
    pub fn snapshot(&self, index: usize) -> BoidData {
        BoidData {
            position: self.positions[index],
            velocity: self.velocities[index],
            acceleration: self.accelerations[index],
            heading: self.headings[index],
            color: self.colors[index],
        }
    }

    /// Immutable access to the positions slice.
    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// Mutable access to the positions slice.
    #[must_use]
    pub fn positions_mut(&mut self) -> &mut [Vec2] {
        &mut self.positions
    }

    /// Immutable access to the velocities slice.
    #[must_use]
    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    /// Mutable access to the velocities slice.
    #[must_use]
    pub fn velocities_mut(&mut self) -> &mut [Vec2] {
        &mut self.velocities
    }

    /// Immutable access to the accelerations slice.
    #[must_use]
    pub fn accelerations(&self) -> &[Vec2] {
        &self.accelerations
    }

    /// Mutable access to the accelerations slice.
    #[must_use]
    pub fn accelerations_mut(&mut self) -> &mut [Vec2] {
        &mut self.accelerations
    }

    /// Immutable access to headings.
    #[must_use]
    pub fn headings(&self) -> &[f32] {
        &self.headings
    }

    /// Mutable access to headings.
    #[must_use]
    pub fn headings_mut(&mut self) -> &mut [f32] {
        &mut self.headings
    }

    /// Immutable access to colors.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Mutable access to colors.
    #[must_use]
    pub fn colors_mut(&mut self) -> &mut [Color] {
        &mut self.colors
    }

    #[inline]
    fn debug_assert_coherent(&self) {
        debug_assert_eq!(self.positions.len(), self.velocities.len());
        debug_assert_eq!(self.positions.len(), self.accelerations.len());
        debug_assert_eq!(self.positions.len(), self.headings.len());
        debug_assert_eq!(self.positions.len(), self.colors.len());
    }
}

/// Dense SoA storage with generational handles for boid access.
#[derive(Debug)]
pub struct BoidArena {
    slots: SlotMap<BoidId, usize>,
    handles: Vec<BoidId>,
    columns: BoidColumns,
}

impl Default for BoidArena {
    fn default() -> Self {
        Self::new()
    }
}

impl BoidArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            handles: Vec::new(),
            columns: BoidColumns::new(),
        }
    }

    /// Create an arena with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            handles: Vec::with_capacity(capacity),
            columns: BoidColumns::with_capacity(capacity),
        }
    }

    /// Number of active boids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when no boids are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over active boid handles in dense iteration order.
    pub fn iter_handles(&self) -> impl Iterator<Item = BoidId> + '_ {
        self.handles.iter().copied()
    }

    /// Borrow the underlying column storage.
    #[must_use]
    pub fn columns(&self) -> &BoidColumns {
        &self.columns
    }

    /// Mutably borrow the underlying column storage.
    #[must_use]
    pub fn columns_mut(&mut self) -> &mut BoidColumns {
        &mut self.columns
    }

    /// Returns the dense index for `id`, if present.
    #[must_use]
    pub fn index_of(&self, id: BoidId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    /// Returns true if `id` refers to a live boid.
    #[must_use]
    pub fn contains(&self, id: BoidId) -> bool {
        self.slots.contains_key(id)
    }

    /// Insert a new boid and return its handle.
    pub fn insert(&mut self, boid: BoidData) -> BoidId {
        let index = self.columns.len();
        self.columns.push(boid);
        let id = self.slots.insert(index);
        self.handles.push(id);
        id
    }

    /// Remove `id` returning its scalar data if it was present.
    pub fn remove(&mut self, id: BoidId) -> Option<BoidData> {
        let index = self.slots.remove(id)?;
        let removed = self.columns.swap_remove(index);
        let removed_handle = self.handles.swap_remove(index);
        debug_assert_eq!(removed_handle, id);
        if index < self.handles.len() {
            let moved = self.handles[index];
            if let Some(slot) = self.slots.get_mut(moved) {
                *slot = index;
            }
        }
        Some(removed)
    }

    /// Remove all boids whose ids are contained in `dead`, preserving
    /// iteration order.
    pub fn remove_many(&mut self, dead: &HashSet<BoidId>) -> usize {
        if dead.is_empty() {
            return 0;
        }
        let mut write = 0;
        for read in 0..self.handles.len() {
            let id = self.handles[read];
            if dead.contains(&id) {
                self.slots.remove(id);
                continue;
            }
            if write != read {
                self.handles[write] = id;
                self.columns.move_row(read, write);
            }
            if let Some(slot) = self.slots.get_mut(id) {
                *slot = write;
            }
            write += 1;
        }
        let removed = self.handles.len().saturating_sub(write);
        self.handles.truncate(write);
        self.columns.truncate(write);
        removed
    }

    /// Produce a copy of the scalar data for `id`.
    #[must_use]
    pub fn snapshot(&self, id: BoidId) -> Option<BoidData> {
        let index = self.index_of(id)?;
        Some(self.columns.snapshot(index))
    }

    /// Clear all stored boids.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.handles.clear();
        self.columns.clear();
    }
}

/// Runtime data associated with a boid beyond the dense SoA columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoidRuntime {
    /// Whether color is derived from force history or held at flat white.
    pub color_blend: bool,
    /// Weighted steering forces from the current tick.
    pub steering: SteeringForces,
    /// Squared force magnitudes scaled by squared speed, one slot per tick.
    pub force_history: [Vec3; FORCE_WINDOW],
    /// Next ring-buffer slot to overwrite; always below `FORCE_WINDOW`.
    pub write_index: usize,
    pub running_avg: Vec3,
    pub previous_avg: Vec3,
    /// Trailing position history, oldest first, capped at `tracer_length`.
    pub trail: VecDeque<TrailPoint>,
}

impl BoidRuntime {
    /// Fresh runtime state with the given color mode.
    #[must_use]
    pub fn new(color_blend: bool) -> Self {
        Self {
            color_blend,
            steering: SteeringForces::default(),
            force_history: [Vec3::ZERO; FORCE_WINDOW],
            write_index: 0,
            running_avg: Vec3::ZERO,
            previous_avg: Vec3::ZERO,
            trail: VecDeque::new(),
        }
    }

    /// Feed one force sample into the smoothing ring buffer and return the
    /// updated running average.
    ///
    /// Most ticks recompute a true windowed average. The tick whose write
    /// index sits on the wraparound boundary instead blends the previous
    /// and current averages with `write_index / FORCE_WINDOW`; since the
    /// index is zero there, the blend degenerates to the previous average,
    /// so the smoothed value holds for one tick every window.
    fn absorb_force_sample(&mut self, sample: Vec3) -> Vec3 {
        self.force_history[self.write_index] = sample;
        if self.write_index % FORCE_WINDOW != 0 {
            let total: Vec3 = self.force_history.iter().copied().sum();
            self.previous_avg = self.running_avg;
            self.running_avg = total / FORCE_WINDOW as f32;
        } else {
            let t = self.write_index as f32 / FORCE_WINDOW as f32;
            self.running_avg = self.previous_avg.lerp(self.running_avg, t);
        }
        self.write_index = (self.write_index + 1) % FORCE_WINDOW;
        self.running_avg
    }
}

impl Default for BoidRuntime {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Errors that can occur when constructing flock state.
#[derive(Debug, Error)]
pub enum FlockError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Static configuration for a flock world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlockConfig {
    /// Width of the world in world units.
    pub world_width: f32,
    /// Height of the world in world units.
    pub world_height: f32,
    /// Extra slack outside the world rect before a boid is culled.
    pub bounds_margin: f32,
    /// Velocity magnitude cap applied after integration.
    pub max_speed: f32,
    /// Magnitude cap applied to each steering force before summation.
    pub max_force: f32,
    /// Repulsion radius for the separation behavior.
    pub desired_separation: f32,
    /// Sensing radius shared by alignment and cohesion.
    pub neighbor_dist: f32,
    /// Scalar multiplier applied to the separation force.
    pub separation_weight: f32,
    /// Scalar multiplier applied to the alignment force.
    pub alignment_weight: f32,
    /// Scalar multiplier applied to the cohesion force.
    pub cohesion_weight: f32,
    /// Force-to-color-delta multiplier used by the smoothing pass.
    pub color_scale: f32,
    /// Maximum number of trail samples retained per boid.
    pub tracer_length: usize,
    /// Color mode assigned to newly spawned boids.
    pub color_blend: bool,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Maximum number of recent tick summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            world_width: 800.0,
            world_height: 600.0,
            bounds_margin: 700.0,
            max_speed: 2.0,
            max_force: 0.03,
            desired_separation: 25.0,
            neighbor_dist: 50.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            color_scale: 400.0,
            tracer_length: 300,
            color_blend: true,
            rng_seed: None,
            history_capacity: 256,
        }
    }
}

impl FlockConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), FlockError> {
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return Err(FlockError::InvalidConfig(
                "world dimensions must be positive",
            ));
        }
        if self.bounds_margin < 0.0 {
            return Err(FlockError::InvalidConfig(
                "bounds_margin must be non-negative",
            ));
        }
        if self.max_speed <= 0.0 {
            return Err(FlockError::InvalidConfig("max_speed must be positive"));
        }
        if self.max_force <= 0.0 {
            return Err(FlockError::InvalidConfig("max_force must be positive"));
        }
        if self.desired_separation <= 0.0 || self.neighbor_dist <= 0.0 {
            return Err(FlockError::InvalidConfig(
                "behavior radii must be positive",
            ));
        }
        if self.separation_weight < 0.0
            || self.alignment_weight < 0.0
            || self.cohesion_weight < 0.0
        {
            return Err(FlockError::InvalidConfig(
                "behavior weights must be non-negative",
            ));
        }
        if self.color_scale < 0.0 {
            return Err(FlockError::InvalidConfig(
                "color_scale must be non-negative",
            ));
        }
        if self.tracer_length == 0 {
            return Err(FlockError::InvalidConfig(
                "tracer_length must be non-zero",
            ));
        }
        if self.history_capacity == 0 {
            return Err(FlockError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG seed, generating one from entropy if
    /// absent.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Steering toward `target`: desired velocity at full speed minus the
/// current velocity, clamped to `max_force`.
///
/// Returns the zero vector when the target coincides with the position,
/// since normalizing a zero offset is undefined.
#[must_use]
pub fn seek(position: Vec2, velocity: Vec2, target: Vec2, config: &FlockConfig) -> Vec2 {
    let offset = target - position;
    if offset.length_squared() == 0.0 {
        return Vec2::ZERO;
    }
    let desired = offset.normalize() * config.max_speed;
    (desired - velocity).clamp_length_max(config.max_force)
}

/// Inverse-distance weighted repulsion from every other boid closer than
/// `desired_separation`.
///
/// The accumulator is averaged over the whole population count rather
/// than the qualifying-neighbor count. Canonical Reynolds separation
/// divides by the in-range count; this variant deliberately lets crowd
/// pressure fade as the flock grows.
#[must_use]
pub fn separate(
    position: Vec2,
    velocity: Vec2,
    positions: &[Vec2],
    config: &FlockConfig,
) -> Vec2 {
    let mut steer = Vec2::ZERO;
    for &other in positions {
        let distance = position.distance(other);
        if distance > 0.0 && distance < config.desired_separation {
            steer += (position - other).normalize() / distance;
        }
    }
    if !positions.is_empty() {
        steer /= positions.len() as f32;
    }
    if steer.length_squared() > 0.0 {
        steer = steer.normalize() * config.max_speed - velocity;
        steer = steer.clamp_length_max(config.max_force);
    }
    steer
}

/// Steering toward the average velocity of boids within `neighbor_dist`.
///
/// Returns the zero vector when no neighbor qualifies.
#[must_use]
pub fn align(
    position: Vec2,
    velocity: Vec2,
    positions: &[Vec2],
    velocities: &[Vec2],
    config: &FlockConfig,
) -> Vec2 {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for (idx, &other) in positions.iter().enumerate() {
        let distance = position.distance(other);
        if distance > 0.0 && distance < config.neighbor_dist {
            sum += velocities[idx];
            count += 1;
        }
    }
    if count == 0 {
        return Vec2::ZERO;
    }
    let desired = (sum / count as f32).normalize_or_zero() * config.max_speed;
    (desired - velocity).clamp_length_max(config.max_force)
}

/// Steering toward the average position of boids within `neighbor_dist`.
///
/// Returns the zero vector when no neighbor qualifies.
#[must_use]
pub fn cohesion(
    position: Vec2,
    velocity: Vec2,
    positions: &[Vec2],
    config: &FlockConfig,
) -> Vec2 {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for &other in positions {
        let distance = position.distance(other);
        if distance > 0.0 && distance < config.neighbor_dist {
            sum += other;
            count += 1;
        }
    }
    if count == 0 {
        return Vec2::ZERO;
    }
    seek(position, velocity, sum / count as f32, config)
}

/// Radial attractor force toward `point` with a sinusoidal falloff.
///
/// Outside `range` no force applies. Inside, the influence factor
/// `0.5 + sin(2π(d/range − 0.25)) / 2` ramps smoothly instead of cutting
/// off hard; it is exactly zero both at the range boundary and at the
/// attractor itself. The result is clamped to `strength`.
#[must_use]
pub fn pull_force(position: Vec2, point: Vec2, strength: f32, range: f32) -> Vec2 {
    if range <= 0.0 {
        return Vec2::ZERO;
    }
    let offset = point - position;
    let distance = offset.length();
    if distance > range {
        return Vec2::ZERO;
    }
    let normalized = distance / range;
    let influence = 0.5 + (std::f32::consts::TAU * (normalized - 0.25)).sin() / 2.0;
    let direction = offset.normalize_or(Vec2::X);
    (direction * influence * strength).clamp_length_max(strength)
}

/// Liveness check: true when `position` lies outside the world rect grown
/// by `margin` on every side.
#[must_use]
pub fn is_out_of_bounds(position: Vec2, width: f32, height: f32, margin: f32) -> bool {
    position.x > width + margin
        || position.x < -margin
        || position.y > height + margin
        || position.y < -margin
}

/// Render-ready view of one boid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoidFrame {
    pub id: BoidId,
    pub position: Vec2,
    /// Degrees; 0 means the glyph points "up".
    pub heading: f32,
    /// Clamped to [0, 1] per channel.
    pub color: Color,
    /// Oldest-first trail with clamped colors and fade alphas.
    pub trail: Vec<TrailPoint>,
}

/// Everything a renderer needs to draw one completed tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub tick: Tick,
    pub boids: Vec<BoidFrame>,
}

/// Render sink invoked after each tick. The core never draws; it hands a
/// finished frame to whatever implements this.
pub trait Renderer: Send {
    fn draw(&mut self, frame: &FrameSnapshot);
}

/// No-op render sink.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &FrameSnapshot) {}
}

/// Events emitted after processing a world tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TickEvents {
    pub tick: Tick,
    pub culled: usize,
}

/// Aggregate statistics sampled at the end of a tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TickSummary {
    pub tick: Tick,
    pub boid_count: usize,
    pub culled: usize,
    pub average_speed: f32,
}

/// Aggregate world state driving the flock simulation.
pub struct FlockWorld {
    config: FlockConfig,
    tick: Tick,
    rng: SmallRng,
    boids: BoidArena,
    runtime: BoidMap<BoidRuntime>,
    renderer: Box<dyn Renderer>,
    history: VecDeque<TickSummary>,
    last_culled: usize,
}

impl fmt::Debug for FlockWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlockWorld")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("boid_count", &self.boids.len())
            .finish()
    }
}

/// Combined snapshot of dense columns and runtime metadata for one boid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoidState {
    pub id: BoidId,
    pub data: BoidData,
    pub runtime: BoidRuntime,
}

impl FlockWorld {
    /// Instantiate a new world using the supplied configuration.
    pub fn new(config: FlockConfig) -> Result<Self, FlockError> {
        Self::with_renderer(config, Box::new(NullRenderer))
    }

    /// Instantiate a new world using the supplied configuration and render
    /// sink.
    pub fn with_renderer(
        config: FlockConfig,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, FlockError> {
        config.validate()?;
        let rng = config.seeded_rng();
        let history_capacity = config.history_capacity;
        Ok(Self {
            config,
            tick: Tick::zero(),
            rng,
            boids: BoidArena::new(),
            runtime: BoidMap::new(),
            renderer,
            history: VecDeque::with_capacity(history_capacity),
            last_culled: 0,
        })
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Mutable access to the configuration (for hot edits).
    #[must_use]
    pub fn config_mut(&mut self) -> &mut FlockConfig {
        &mut self.config
    }

    /// Replace the render sink.
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = renderer;
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Read-only access to the boid arena.
    #[must_use]
    pub fn boids(&self) -> &BoidArena {
        &self.boids
    }

    /// Mutable access to the boid arena.
    #[must_use]
    pub fn boids_mut(&mut self) -> &mut BoidArena {
        &mut self.boids
    }

    /// Number of live boids.
    #[must_use]
    pub fn boid_count(&self) -> usize {
        self.boids.len()
    }

    /// Immutable access to per-boid runtime metadata.
    #[must_use]
    pub fn runtime(&self) -> &BoidMap<BoidRuntime> {
        &self.runtime
    }

    /// Mutable access to per-boid runtime metadata.
    #[must_use]
    pub fn runtime_mut(&mut self) -> &mut BoidMap<BoidRuntime> {
        &mut self.runtime
    }

    /// Borrow runtime data for a specific boid.
    #[must_use]
    pub fn boid_runtime(&self, id: BoidId) -> Option<&BoidRuntime> {
        self.runtime.get(id)
    }

    /// Mutably borrow runtime data for a specific boid.
    #[must_use]
    pub fn boid_runtime_mut(&mut self, id: BoidId) -> Option<&mut BoidRuntime> {
        self.runtime.get_mut(id)
    }

    /// Iterate over retained tick summaries.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Borrow the world RNG mutably for deterministic sampling.
    #[must_use]
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Spawn a boid from explicit scalar data, returning its handle.
    pub fn spawn_boid(&mut self, boid: BoidData) -> BoidId {
        let id = self.boids.insert(boid);
        self.runtime
            .insert(id, BoidRuntime::new(self.config.color_blend));
        id
    }

    /// Spawn a boid at `position` with a small random initial velocity.
    pub fn spawn_boid_at(&mut self, position: Vec2) -> BoidId {
        let velocity = Vec2::new(
            self.rng.random_range(-1.0..1.0),
            self.rng.random_range(-1.0..1.0),
        );
        self.spawn_boid(BoidData {
            position,
            velocity,
            ..BoidData::default()
        })
    }

    /// Remove a boid by handle, returning its last known data.
    pub fn remove_boid(&mut self, id: BoidId) -> Option<BoidData> {
        self.runtime.remove(id);
        self.boids.remove(id)
    }

    /// Produce a combined snapshot of a boid's scalar columns and runtime
    /// data.
    #[must_use]
    pub fn snapshot_boid(&self, id: BoidId) -> Option<BoidState> {
        let data = self.boids.snapshot(id)?;
        let runtime = self.runtime.get(id)?.clone();
        Some(BoidState { id, data, runtime })
    }

    /// Inject a radial attractor force (e.g. a cursor) into every boid's
    /// acceleration. Takes effect on the next `step`.
    pub fn pull(&mut self, point: Vec2, strength: f32, range: f32) {
        let positions: Vec<Vec2> = self.boids.columns().positions().to_vec();
        let accelerations = self.boids.columns_mut().accelerations_mut();
        for (idx, accel) in accelerations.iter_mut().enumerate() {
            *accel += pull_force(positions[idx], point, strength, range);
        }
    }

    /// Execute one simulation tick pipeline returning emitted events.
    pub fn step(&mut self) -> TickEvents {
        self.stage_flock();
        self.stage_integrate();
        self.stage_trails();
        self.last_culled = self.stage_cull();
        self.tick = self.tick.next();
        self.stage_render();
        TickEvents {
            tick: self.tick,
            culled: self.last_culled,
        }
    }

    /// Compute steering forces for every boid against a consistent
    /// pre-update snapshot, then fold them into the acceleration column.
    ///
    /// The snapshot-then-write-back split is the synchronous-update
    /// barrier: no boid ever reads another boid's already-updated state
    /// within the same tick.
    fn stage_flock(&mut self) {
        let count = self.boids.len();
        if count == 0 {
            return;
        }
        let positions: Vec<Vec2> = self.boids.columns().positions().to_vec();
        let velocities: Vec<Vec2> = self.boids.columns().velocities().to_vec();
        let config = &self.config;

        let forces: Vec<SteeringForces> = (0..count)
            .into_par_iter()
            .map(|idx| {
                let position = positions[idx];
                let velocity = velocities[idx];
                SteeringForces {
                    separation: separate(position, velocity, &positions, config)
                        * config.separation_weight,
                    alignment: align(position, velocity, &positions, &velocities, config)
                        * config.alignment_weight,
                    cohesion: cohesion(position, velocity, &positions, config)
                        * config.cohesion_weight,
                }
            })
            .collect();

        let handles: Vec<BoidId> = self.boids.iter_handles().collect();
        {
            let accelerations = self.boids.columns_mut().accelerations_mut();
            for (idx, force) in forces.iter().enumerate() {
                accelerations[idx] += force.total();
            }
        }
        for (idx, id) in handles.iter().enumerate() {
            if let Some(runtime) = self.runtime.get_mut(*id) {
                runtime.steering = forces[idx];
            }
        }
    }

    /// Integrate motion and refresh the smoothed color for every boid.
    ///
    /// The color sample deliberately uses the pre-integration velocity:
    /// color reflects the motion that produced this tick's forces, not
    /// the motion those forces are about to cause.
    fn stage_integrate(&mut self) {
        let max_speed = self.config.max_speed;
        let color_scale = self.config.color_scale;
        let handles: Vec<BoidId> = self.boids.iter_handles().collect();
        let columns = self.boids.columns_mut();

        for (idx, id) in handles.iter().enumerate() {
            let velocity = columns.velocities()[idx];
            if let Some(runtime) = self.runtime.get_mut(*id) {
                let color = if runtime.color_blend {
                    let forces = runtime.steering;
                    let sample = Vec3::new(
                        forces.alignment.length_squared(),
                        forces.separation.length_squared(),
                        forces.cohesion.length_squared(),
                    ) * velocity.length_squared();
                    let avg = runtime.absorb_force_sample(sample);
                    Color::from_force_average(avg, color_scale)
                } else {
                    Color::WHITE
                };
                columns.colors_mut()[idx] = color;
            }

            let velocity =
                (columns.accelerations()[idx] + velocity).clamp_length_max(max_speed);
            columns.velocities_mut()[idx] = velocity;
            columns.positions_mut()[idx] += velocity;
            columns.accelerations_mut()[idx] = Vec2::ZERO;
            columns.headings_mut()[idx] = velocity.y.atan2(velocity.x).to_degrees() - 90.0;
        }
    }

    /// Append the current position to each boid's trail, evict past the
    /// cap, and rebuild the fade ramp.
    ///
    /// The alpha ramp is recomputed over the whole trail every tick
    /// because indices shift whenever the oldest sample is evicted.
    fn stage_trails(&mut self) {
        let tracer_length = self.config.tracer_length;
        let columns = self.boids.columns();
        for (idx, id) in self.boids.iter_handles().enumerate() {
            if let Some(runtime) = self.runtime.get_mut(id) {
                runtime.trail.push_back(TrailPoint {
                    position: columns.positions()[idx],
                    color: columns.colors()[idx],
                    alpha: 1.0,
                });
                while runtime.trail.len() > tracer_length {
                    runtime.trail.pop_front();
                }
                let len = runtime.trail.len() as f32;
                for (sample_idx, sample) in runtime.trail.iter_mut().enumerate() {
                    sample.alpha = sample_idx as f32 / len;
                }
            }
        }
    }

    /// Remove every boid outside the world rect plus margin.
    fn stage_cull(&mut self) -> usize {
        let width = self.config.world_width;
        let height = self.config.world_height;
        let margin = self.config.bounds_margin;
        let mut dead: HashSet<BoidId> = HashSet::new();
        {
            let positions = self.boids.columns().positions();
            for (idx, id) in self.boids.iter_handles().enumerate() {
                if is_out_of_bounds(positions[idx], width, height, margin) {
                    dead.insert(id);
                }
            }
        }
        if dead.is_empty() {
            return 0;
        }
        for id in &dead {
            self.runtime.remove(*id);
        }
        self.boids.remove_many(&dead)
    }

    /// Build a render-ready view of the world after the current tick.
    ///
    /// Colors are clamped to [0, 1] here: the smoothing math upstream is
    /// allowed to overshoot and the render boundary is the contract point
    /// for clamping.
    #[must_use]
    pub fn frame_snapshot(&self) -> FrameSnapshot {
        let columns = self.boids.columns();
        let mut boids = Vec::with_capacity(self.boids.len());
        for (idx, id) in self.boids.iter_handles().enumerate() {
            let trail = self.runtime.get(id).map_or_else(Vec::new, |runtime| {
                runtime
                    .trail
                    .iter()
                    .map(|sample| TrailPoint {
                        position: sample.position,
                        color: sample.color.clamped(),
                        alpha: sample.alpha.clamp(0.0, 1.0),
                    })
                    .collect()
            });
            boids.push(BoidFrame {
                id,
                position: columns.positions()[idx],
                heading: columns.headings()[idx],
                color: columns.colors()[idx].clamped(),
                trail,
            });
        }
        FrameSnapshot {
            tick: self.tick,
            boids,
        }
    }

    fn stage_render(&mut self) {
        let frame = self.frame_snapshot();
        self.renderer.draw(&frame);

        let count = self.boids.len();
        let average_speed = if count > 0 {
            self.boids
                .columns()
                .velocities()
                .iter()
                .map(|v| v.length())
                .sum::<f32>()
                / count as f32
        } else {
            0.0
        };
        let summary = TickSummary {
            tick: self.tick,
            boid_count: count,
            culled: self.last_culled,
            average_speed,
        };
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_boid(seed: u32) -> BoidData {
        BoidData {
            position: Vec2::new(seed as f32, seed as f32 + 1.0),
            velocity: Vec2::new(seed as f32 * 0.1, -(seed as f32) * 0.1),
            acceleration: Vec2::ZERO,
            heading: seed as f32 * 0.5,
            color: Color::new(seed as f32, seed as f32 + 0.5, seed as f32 + 1.0),
        }
    }

    #[test]
    fn insert_allocates_unique_handles() {
        let mut arena = BoidArena::new();
        let a = arena.insert(sample_boid(0));
        let b = arena.insert(sample_boid(1));
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert!(arena.contains(a));
        assert!(arena.contains(b));
    }

    #[test]
    fn remove_keeps_dense_storage_coherent() {
        let mut arena = BoidArena::new();
        let a = arena.insert(sample_boid(0));
        let b = arena.insert(sample_boid(1));
        let c = arena.insert(sample_boid(2));
        assert_eq!(arena.len(), 3);

        let removed = arena.remove(b).expect("boid removed");
        assert_eq!(removed.position, Vec2::new(1.0, 2.0));
        assert_eq!(arena.len(), 2);
        assert!(arena.contains(a));
        assert!(arena.contains(c));
        assert!(!arena.contains(b));

        let snapshot_c = arena.snapshot(c).expect("snapshot");
        assert_eq!(snapshot_c.position, Vec2::new(2.0, 3.0));
        assert_eq!(arena.index_of(c), Some(1));

        let d = arena.insert(sample_boid(3));
        assert_ne!(
            b, d,
            "generational handles should not be reused immediately"
        );
    }

    #[test]
    fn remove_many_preserves_iteration_order() {
        let mut arena = BoidArena::new();
        let ids: Vec<BoidId> = (0..5).map(|seed| arena.insert(sample_boid(seed))).collect();
        let dead: HashSet<BoidId> = [ids[1], ids[3]].into_iter().collect();

        let removed = arena.remove_many(&dead);
        assert_eq!(removed, 2);
        assert_eq!(arena.len(), 3);

        let survivors: Vec<BoidId> = arena.iter_handles().collect();
        assert_eq!(survivors, vec![ids[0], ids[2], ids[4]]);
        for (idx, id) in survivors.iter().enumerate() {
            assert_eq!(arena.index_of(*id), Some(idx));
        }
    }

    #[test]
    fn config_rejects_bad_values() {
        let defaults = FlockConfig::default();
        assert!(defaults.validate().is_ok());

        let config = FlockConfig {
            world_width: 0.0,
            ..FlockConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FlockConfig {
            max_force: 0.0,
            ..FlockConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FlockConfig {
            tracer_length: 0,
            ..FlockConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn seek_with_coincident_target_is_zero() {
        let config = FlockConfig::default();
        let position = Vec2::new(12.0, -3.0);
        let steer = seek(position, Vec2::new(1.0, 1.0), position, &config);
        assert_eq!(steer, Vec2::ZERO);
    }

    #[test]
    fn seek_steers_toward_target_within_force_cap() {
        let config = FlockConfig::default();
        let steer = seek(Vec2::ZERO, Vec2::ZERO, Vec2::new(100.0, 0.0), &config);
        assert!(steer.x > 0.0);
        assert!((steer.length() - config.max_force).abs() < 1e-6);
    }

    #[test]
    fn separate_repels_from_close_neighbor() {
        let config = FlockConfig::default();
        let positions = [Vec2::ZERO, Vec2::new(10.0, 0.0)];
        let steer = separate(Vec2::ZERO, Vec2::ZERO, &positions, &config);
        assert!(steer.x < 0.0, "repulsion should point away from neighbor");
        assert!(steer.length() <= config.max_force + 1e-6);
    }

    #[test]
    fn separate_ignores_far_neighbors() {
        let config = FlockConfig::default();
        let positions = [Vec2::ZERO, Vec2::new(30.0, 0.0)];
        let steer = separate(Vec2::ZERO, Vec2::ZERO, &positions, &config);
        assert_eq!(steer, Vec2::ZERO);
    }

    #[test]
    fn align_and_cohesion_return_zero_without_neighbors() {
        let config = FlockConfig::default();
        let positions = [Vec2::ZERO, Vec2::new(500.0, 500.0)];
        let velocities = [Vec2::ZERO, Vec2::new(1.0, 0.0)];
        assert_eq!(
            align(Vec2::ZERO, Vec2::ZERO, &positions, &velocities, &config),
            Vec2::ZERO
        );
        assert_eq!(
            cohesion(Vec2::ZERO, Vec2::ZERO, &positions, &config),
            Vec2::ZERO
        );
    }

    #[test]
    fn align_steers_toward_neighbor_velocity() {
        let config = FlockConfig::default();
        let positions = [Vec2::ZERO, Vec2::new(20.0, 0.0)];
        let velocities = [Vec2::ZERO, Vec2::new(1.5, 0.0)];
        let steer = align(Vec2::ZERO, Vec2::ZERO, &positions, &velocities, &config);
        assert!(steer.x > 0.0);
        assert!(steer.length() <= config.max_force + 1e-6);
    }

    #[test]
    fn force_window_converges_on_constant_samples() {
        let mut runtime = BoidRuntime::new(true);
        let sample = Vec3::splat(0.001);
        let mut avg = Vec3::ZERO;
        for _ in 0..FORCE_WINDOW {
            avg = runtime.absorb_force_sample(sample);
        }
        assert!(
            (avg - sample).length() < 1e-7,
            "one full cycle of identical samples should yield that sample, got {avg:?}"
        );
    }

    #[test]
    fn force_window_boundary_tick_blends_previous_average() {
        let mut runtime = BoidRuntime::new(true);
        for _ in 0..FORCE_WINDOW {
            runtime.absorb_force_sample(Vec3::splat(0.002));
        }
        // The boundary tick (write_index back at 0) degenerates to the
        // previous average rather than a fresh windowed mean.
        let before = runtime.previous_avg;
        let avg = runtime.absorb_force_sample(Vec3::splat(0.5));
        assert_eq!(avg, before);
    }

    #[test]
    fn color_channels_decrease_with_force_terms() {
        let calm = Color::from_force_average(Vec3::splat(0.0), 400.0);
        assert_eq!(calm, Color::WHITE);

        let agitated = Color::from_force_average(Vec3::new(0.001, 0.002, 0.0005), 400.0);
        assert!(agitated.g < calm.g, "green tracks the alignment term");
        assert!(agitated.r < calm.r, "red tracks the separation term");
        assert!(agitated.b < calm.b, "blue tracks the cohesion term");
        assert!(agitated.r < agitated.b, "stronger term darkens further");
    }

    #[test]
    fn color_clamped_stays_in_unit_range() {
        let raw = Color::new(-0.4, 1.7, 0.3);
        let clamped = raw.clamped();
        assert_eq!(clamped, Color::new(0.0, 1.0, 0.3));
    }

    #[test]
    fn pull_force_is_zero_at_exact_range_boundary() {
        let force = pull_force(Vec2::ZERO, Vec2::new(100.0, 0.0), 1.0, 100.0);
        assert!(
            force.length() < 1e-6,
            "influence at the boundary should vanish, got {force:?}"
        );
    }

    #[test]
    fn pull_force_is_positive_just_inside_range() {
        let force = pull_force(Vec2::ZERO, Vec2::new(95.0, 0.0), 1.0, 100.0);
        assert!(force.x > 1e-3, "boid just inside range should be pulled");
        assert!(force.length() <= 1.0 + 1e-6);
    }

    #[test]
    fn pull_force_is_zero_outside_range() {
        let force = pull_force(Vec2::ZERO, Vec2::new(150.0, 0.0), 1.0, 100.0);
        assert_eq!(force, Vec2::ZERO);
    }

    #[test]
    fn out_of_bounds_uses_margin() {
        assert!(is_out_of_bounds(Vec2::new(-701.0, 0.0), 800.0, 600.0, 700.0));
        assert!(!is_out_of_bounds(Vec2::new(-699.0, 0.0), 800.0, 600.0, 700.0));
        assert!(is_out_of_bounds(Vec2::new(0.0, 1301.0), 800.0, 600.0, 700.0));
        assert!(!is_out_of_bounds(Vec2::new(1499.0, 0.0), 800.0, 600.0, 700.0));
    }

    #[test]
    fn step_clamps_speed_for_all_boids() {
        let config = FlockConfig {
            rng_seed: Some(7),
            ..FlockConfig::default()
        };
        let max_speed = config.max_speed;
        let mut world = FlockWorld::new(config).expect("world");
        for seed in 0..6 {
            world.spawn_boid(BoidData {
                position: Vec2::new(100.0 + seed as f32 * 5.0, 100.0),
                velocity: Vec2::new(10.0, -8.0),
                ..BoidData::default()
            });
        }
        for _ in 0..5 {
            world.step();
        }
        for velocity in world.boids().columns().velocities() {
            assert!(velocity.length() <= max_speed + 1e-5);
        }
    }

    #[test]
    fn trail_caps_at_tracer_length_with_fade_ramp() {
        let config = FlockConfig {
            tracer_length: 10,
            rng_seed: Some(1),
            ..FlockConfig::default()
        };
        let mut world = FlockWorld::new(config).expect("world");
        let id = world.spawn_boid(BoidData {
            position: Vec2::ZERO,
            velocity: Vec2::new(1.0, 0.0),
            ..BoidData::default()
        });

        for _ in 0..15 {
            world.step();
        }

        let runtime = world.boid_runtime(id).expect("runtime");
        assert_eq!(runtime.trail.len(), 10, "five oldest samples evicted");
        let first = runtime.trail.front().expect("oldest sample");
        let last = runtime.trail.back().expect("newest sample");
        assert!((first.position.x - 6.0).abs() < 1e-5);
        assert!((last.position.x - 15.0).abs() < 1e-5);
        assert!(first.alpha.abs() < 1e-6, "oldest sample fades out");
        assert!((last.alpha - 0.9).abs() < 1e-6);
        let alphas: Vec<f32> = runtime.trail.iter().map(|sample| sample.alpha).collect();
        assert!(alphas.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn color_blend_disabled_holds_flat_white() {
        let config = FlockConfig {
            color_blend: false,
            rng_seed: Some(3),
            ..FlockConfig::default()
        };
        let mut world = FlockWorld::new(config).expect("world");
        let a = world.spawn_boid(BoidData {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::new(1.0, 0.0),
            ..BoidData::default()
        });
        world.spawn_boid(BoidData {
            position: Vec2::new(110.0, 100.0),
            velocity: Vec2::new(-1.0, 0.0),
            ..BoidData::default()
        });
        for _ in 0..8 {
            world.step();
        }
        let snapshot = world.snapshot_boid(a).expect("snapshot");
        assert_eq!(snapshot.data.color, Color::WHITE);
    }

    #[test]
    fn cull_removes_out_of_bounds_boids() {
        let config = FlockConfig {
            rng_seed: Some(11),
            ..FlockConfig::default()
        };
        let mut world = FlockWorld::new(config).expect("world");
        let keeper = world.spawn_boid(BoidData::at(Vec2::new(400.0, 300.0)));
        let runaway = world.spawn_boid(BoidData::at(Vec2::new(-800.0, 0.0)));

        let events = world.step();
        assert_eq!(events.culled, 1);
        assert_eq!(world.boid_count(), 1);
        assert!(world.boids().contains(keeper));
        assert!(!world.boids().contains(runaway));
        assert!(world.boid_runtime(runaway).is_none());
    }

    #[test]
    fn pull_accumulates_into_acceleration() {
        let config = FlockConfig {
            rng_seed: Some(5),
            ..FlockConfig::default()
        };
        let mut world = FlockWorld::new(config).expect("world");
        let id = world.spawn_boid(BoidData::at(Vec2::new(100.0, 100.0)));
        world.pull(Vec2::new(150.0, 100.0), 0.5, 100.0);

        let idx = world.boids().index_of(id).expect("index");
        let accel = world.boids().columns().accelerations()[idx];
        assert!(accel.x > 0.0, "attractor to the right pulls +x");
        assert!(accel.length() <= 0.5 + 1e-6);
    }

    #[test]
    fn history_records_tick_summaries() {
        let config = FlockConfig {
            history_capacity: 4,
            rng_seed: Some(2),
            ..FlockConfig::default()
        };
        let mut world = FlockWorld::new(config).expect("world");
        world.spawn_boid(BoidData::at(Vec2::new(400.0, 300.0)));
        for _ in 0..6 {
            world.step();
        }
        let summaries: Vec<TickSummary> = world.history().copied().collect();
        assert_eq!(summaries.len(), 4, "history stays bounded");
        assert_eq!(summaries.last().expect("latest").tick, Tick(6));
        assert_eq!(summaries.last().expect("latest").boid_count, 1);
    }
}
