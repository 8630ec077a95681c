//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per tick.
pub const DT: f32 = 1.0 / TICK_RATE as f32;

// --- Scheduling ---

/// Mission re-evaluation period in ticks. A unit re-evaluates when
/// `index % MISSION_STAGGER == tick % MISSION_STAGGER`.
pub const MISSION_STAGGER: u64 = 5;

/// Upper bound on mission transitions resolved in a single evaluation.
pub const MAX_MISSION_RESOLUTION_STEPS: usize = 8;

// --- Proximity index defaults ---

/// Default cube diameter covered by the proximity grid.
pub const DEFAULT_INDEX_DIAMETER: f32 = 2000.0;

/// Default cells per axis.
pub const DEFAULT_INDEX_CELLS: u32 = 32;

// --- Arrival and engagement ---

/// Squared distance at which MOVE_TO and PATROL_TO count as arrived (3 units).
pub const ARRIVAL_DISTANCE_SQUARED: f32 = 3.0 * 3.0;

/// Radius within which a patrolling ship engages hostile non-fighters.
pub const SHIP_ENGAGEMENT_RADIUS: f32 = 120.0;

/// Radius within which a patrolling formation engages hostiles.
pub const FIGHTER_ENGAGEMENT_RADIUS: f32 = 80.0;

// --- Starlanes ---

/// A ship and its destination must both lie within this distance of an entry point.
pub const STARLANE_ENTRY_RADIUS: f32 = 10.0;

/// Ticks a ship remains immobilized before leaving through a starlane.
pub const ENTER_STARLANE_DELAY_TICKS: u32 = 150;

// --- Avoidance ---

/// Look-ahead (seconds) for static obstacle avoidance.
pub const OBSTACLE_AVOIDANCE_TIME: f32 = 6.0;

/// Time-to-collision horizon (seconds) for neighbor avoidance.
pub const NEIGHBOR_AVOIDANCE_TIME: f32 = 3.0;

/// Search radius for neighbor avoidance candidates.
pub const NEIGHBOR_AVOIDANCE_RADIUS: f32 = 60.0;

/// Ship braking rate applied when a ship has nowhere to go.
pub const SHIP_BRAKE_RATE: f32 = 0.25;

// --- Formation ---

/// Spacing unit for formation slot offsets.
pub const FORMATION_SPACING: f32 = 2.0;

/// Number of distinct slot offsets before slots wrap to an outer ring.
pub const FORMATION_SLOT_PATTERN: u32 = 5;

/// Leader max speed relative to member base speed.
pub const LEADER_SPEED_FACTOR: f32 = 0.9;

/// Logistic steepness for follower speed scaling.
pub const FORMATION_SIGMOID_STEEPNESS: f32 = 1.5;

/// Distance out of position at which followers run at half base speed.
pub const FORMATION_SIGMOID_MIDPOINT: f32 = 3.0;

// --- Fighter steering weights ---

pub const MISSION_WEIGHT: f32 = 1.0;
pub const FORMATION_WEIGHT: f32 = 2.0;
pub const SEPARATION_WEIGHT: f32 = 1.5;
pub const ALIGNMENT_WEIGHT: f32 = 0.5;
pub const COHESION_WEIGHT: f32 = 0.5;
pub const BOMBER_EVASION_WEIGHT: f32 = 2.0;
pub const NONFIGHTER_REPULSION_WEIGHT: f32 = 1.0;
pub const PD_REPULSION_WEIGHT: f32 = 1.0;

/// Neighbor radius for separation/alignment/cohesion.
pub const FLOCK_NEIGHBOR_RADIUS: f32 = 10.0;

/// Bombers flee hostile interceptors closer than this.
pub const BOMBER_EVASION_RADIUS: f32 = 25.0;

/// Fighters are repelled by non-fighters closer than this.
pub const NONFIGHTER_REPULSION_RADIUS: f32 = 20.0;

/// Fighters are repelled by hostile ships' point defense within this radius.
pub const PD_REPULSION_RADIUS: f32 = 40.0;

/// Leader distance to carrier at which a formation docks.
pub const FIGHTER_DOCKING_DISTANCE: f32 = 5.0;

// --- Fighter airframes ---

pub const INTERCEPTOR_SPEED: f32 = 30.0;
pub const INTERCEPTOR_FORCE: f32 = 60.0;
pub const INTERCEPTOR_STRUCTURE: f32 = 10.0;
pub const INTERCEPTOR_DAMAGE: f32 = 2.0;
pub const INTERCEPTOR_RANGE: f32 = 8.0;
pub const INTERCEPTOR_COOLDOWN_TICKS: u32 = 15;

pub const BOMBER_SPEED: f32 = 20.0;
pub const BOMBER_FORCE: f32 = 40.0;
pub const BOMBER_STRUCTURE: f32 = 15.0;
pub const BOMBER_DAMAGE: f32 = 6.0;
pub const BOMBER_RANGE: f32 = 10.0;
pub const BOMBER_COOLDOWN_TICKS: u32 = 30;

/// Collision radius of a fighter.
pub const FIGHTER_RADIUS: f32 = 0.5;

// --- Missiles ---

pub const MISSILE_SPEED: f32 = 40.0;
pub const MISSILE_FORCE: f32 = 120.0;
pub const MISSILE_STRUCTURE: f32 = 5.0;
pub const MISSILE_RADIUS: f32 = 0.3;

/// Missile damage multiplier against fighters.
pub const MISSILE_VS_FIGHTER_DAMAGE_FACTOR: f32 = 0.25;

// --- Target ranking ---

/// Weight of the structure fraction in the fuzzy weakness score.
pub const WEAKNESS_FRACTION_WEIGHT: f32 = 1.0;

/// Weight of absolute structure (per 100 points) in the fuzzy weakness score.
pub const WEAKNESS_STRUCTURE_WEIGHT: f32 = 0.5;

/// Weight of danger (damage per tick) subtracted from the weakness score.
pub const WEAKNESS_DANGER_WEIGHT: f32 = 0.25;
