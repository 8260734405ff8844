//! The domain primitive vocabulary and the per-tick execution context.
//!
//! Primitives are ordinary instructions, `fn(&mut Stacks, &mut TickContext)`.
//! Everything a primitive may read or change outside the stacks lives in
//! the [`TickContext`]: the bodies of every agent in roster order, which
//! of them is acting, the sensing mode, the effects accumulated so far,
//! and an optional trace sink.
//!
//! | Primitive   | Stack effect       | World effect                         |
//! |-------------|--------------------|--------------------------------------|
//! | `move`      | pops n             | moves `min(n, points)` cells ahead   |
//! | `turn`      | pops n             | rotates n steps clockwise            |
//! | `forward`   |                    | `move` by one                        |
//! | `left`      |                    | `turn` by -1                         |
//! | `right`     |                    | `turn` by +1                         |
//! | `available` | pushes points      | none                                 |
//! | `consume`   |                    | takes one point from the target cell |
//! | `nearest`   | pushes a distance  | none                                 |

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use preygent_program::{InstructionSet, Stacks};
use preygent_types::{AgentId, AgentState, Direction, Position, SensingMode};

/// Names of every domain primitive, in table order.
pub const PRIMITIVE_NAMES: [&str; 8] = [
    "available",
    "consume",
    "forward",
    "left",
    "move",
    "nearest",
    "right",
    "turn",
];

/// Build the full agent vocabulary: the standard instructions plus the
/// domain primitives.
pub fn vocabulary() -> InstructionSet<TickContext> {
    let mut set = InstructionSet::standard();
    register_primitives(&mut set);
    set
}

/// Register the domain primitives into `set`.
pub fn register_primitives(set: &mut InstructionSet<TickContext>) {
    set.register("move", primitive_move);
    set.register("turn", primitive_turn);
    set.register("forward", primitive_forward);
    set.register("left", primitive_left);
    set.register("right", primitive_right);
    set.register("available", primitive_available);
    set.register("consume", primitive_consume);
    set.register("nearest", primitive_nearest);
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// World-changing effects produced while an agent acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Effects {
    /// A `move` (or `forward`) executed.
    pub moved: bool,
    /// A `turn` (or `left`/`right`) executed.
    pub turned: bool,
    /// A `consume` transferred a point.
    pub consumed: bool,
}

impl Effects {
    /// No effects.
    pub const NONE: Self = Self {
        moved: false,
        turned: false,
        consumed: false,
    };

    /// Whether any world-changing effect happened.
    pub const fn is_active(self) -> bool {
        self.moved || self.turned || self.consumed
    }
}

impl BitOr for Effects {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            moved: self.moved || rhs.moved,
            turned: self.turned || rhs.turned,
            consumed: self.consumed || rhs.consumed,
        }
    }
}

impl BitOrAssign for Effects {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// What an agent did, as recorded in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAction {
    /// Moved `distance` cells while holding `points`.
    Move {
        /// Cells actually travelled, after clamping.
        distance: i64,
        /// Points held at the time.
        points: u64,
        /// Facing during the move.
        direction: Direction,
    },
    /// Turned from one facing to another.
    Turn {
        /// Facing before the turn.
        from: Direction,
        /// Facing after the turn.
        to: Direction,
    },
    /// Sensed a non-zero number of points on the target cell.
    Available {
        /// Points sensed.
        points: u64,
    },
    /// Took one point from another agent.
    Consume {
        /// The agent that lost a point.
        prey: AgentId,
        /// Actor points after the transfer.
        points: u64,
        /// Prey points after the transfer.
        prey_points: u64,
    },
}

/// One entry in the world trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    /// Tick during which the action happened.
    pub tick: u64,
    /// The acting agent.
    pub agent: AgentId,
    /// What it did.
    pub action: TraceAction,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.agent)?;
        match self.action {
            TraceAction::Move {
                distance,
                points,
                direction,
            } => write!(f, "move {distance} ({points}) {direction}"),
            TraceAction::Turn { from, to } => write!(f, "turned from {from} to {to}"),
            TraceAction::Available { points } => write!(f, "found {points} available points"),
            TraceAction::Consume {
                prey,
                points,
                prey_points,
            } => write!(
                f,
                "({points} points) consumed a point from {prey} ({prey_points} points)"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell queries
// ---------------------------------------------------------------------------

/// Spatial queries over a roster of bodies, addressed by roster index.
pub trait CellQuery {
    /// Sum of points held by every body on `cell` except `exclude`.
    fn points_at(&self, cell: Position, exclude: usize) -> u64;

    /// Index of the first body on `cell`, in roster order, other than
    /// `exclude` and holding at least one point.
    fn first_prey_at(&self, cell: Position, exclude: usize) -> Option<usize>;

    /// Smallest truncated Euclidean distance from body `from` to any body
    /// in the roster, `from` itself included.
    fn nearest_distance(&self, from: usize) -> u64;
}

impl CellQuery for [AgentState] {
    fn points_at(&self, cell: Position, exclude: usize) -> u64 {
        self.iter()
            .enumerate()
            .filter(|(index, body)| *index != exclude && body.position == cell)
            .fold(0_u64, |sum, (_, body)| sum.saturating_add(body.points))
    }

    fn first_prey_at(&self, cell: Position, exclude: usize) -> Option<usize> {
        self.iter()
            .enumerate()
            .find(|(index, body)| *index != exclude && body.position == cell && body.points > 0)
            .map(|(index, _)| index)
    }

    fn nearest_distance(&self, from: usize) -> u64 {
        let Some(origin) = self.get(from).map(|body| body.position) else {
            return 0;
        };
        self.iter()
            .map(|body| origin.distance_to(body.position))
            .min()
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tick context
// ---------------------------------------------------------------------------

/// Everything a primitive may touch during one agent's turn.
///
/// The context owns a working copy of every body for the duration of a
/// tick. The world selects each actor in turn, runs its program, and
/// takes the bodies back when the tick is over. Changes made by earlier
/// actors are visible to later ones within the same tick.
#[derive(Debug)]
pub struct TickContext {
    bodies: Vec<AgentState>,
    actor: usize,
    tick: u64,
    sensing: SensingMode,
    effects: Effects,
    trace: Option<Vec<TraceEvent>>,
}

impl TickContext {
    /// Create a context over `bodies` for tick number `tick`.
    ///
    /// No actor is selected until [`select`](Self::select) is called.
    pub const fn new(bodies: Vec<AgentState>, tick: u64, sensing: SensingMode, trace: bool) -> Self {
        Self {
            bodies,
            actor: usize::MAX,
            tick,
            sensing,
            effects: Effects::NONE,
            trace: if trace { Some(Vec::new()) } else { None },
        }
    }

    /// Make the body at `index` the actor and clear the effect flags.
    ///
    /// Returns whether that body exists and is alive.
    pub fn select(&mut self, index: usize) -> bool {
        self.actor = index;
        self.effects = Effects::NONE;
        self.actor().is_some_and(AgentState::is_alive)
    }

    /// The acting body, if one is selected.
    pub fn actor(&self) -> Option<&AgentState> {
        self.bodies.get(self.actor)
    }

    /// Mutable access to the acting body.
    pub fn actor_mut(&mut self) -> Option<&mut AgentState> {
        self.bodies.get_mut(self.actor)
    }

    /// Every body, in roster order.
    pub fn bodies(&self) -> &[AgentState] {
        &self.bodies
    }

    /// The sensing mode in force.
    pub const fn sensing(&self) -> SensingMode {
        self.sensing
    }

    /// Effects produced by the current actor so far.
    pub const fn effects(&self) -> Effects {
        self.effects
    }

    /// The cell `available` and `consume` look at.
    pub fn target_cell(&self) -> Option<Position> {
        let actor = self.actor()?;
        Some(match self.sensing {
            SensingMode::Ahead => actor.position.ahead(actor.direction),
            SensingMode::Here => actor.position,
        })
    }

    /// Give back the bodies and any recorded trace events.
    pub fn into_parts(self) -> (Vec<AgentState>, Vec<TraceEvent>) {
        (self.bodies, self.trace.unwrap_or_default())
    }

    fn record(&mut self, action: TraceAction) {
        let Some(agent) = self.actor().map(|body| body.id) else {
            return;
        };
        let tick = self.tick;
        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceEvent {
                tick,
                agent,
                action,
            });
        }
    }

    fn move_actor(&mut self, distance: i64) {
        let Some(actor) = self.actor_mut() else {
            return;
        };
        let held = i64::try_from(actor.points).unwrap_or(i64::MAX);
        let distance = distance.min(held);
        actor.position = actor.position.stepped(actor.direction, distance);
        let (points, direction) = (actor.points, actor.direction);
        self.effects.moved = true;
        self.record(TraceAction::Move {
            distance,
            points,
            direction,
        });
    }

    fn turn_actor(&mut self, offset: i64) {
        let Some(actor) = self.actor_mut() else {
            return;
        };
        let from = actor.direction;
        actor.direction = from.turned(offset);
        let to = actor.direction;
        self.effects.turned = true;
        self.record(TraceAction::Turn { from, to });
    }

    fn available_points(&mut self) -> Option<u64> {
        let cell = self.target_cell()?;
        let points = self.bodies.points_at(cell, self.actor);
        if points > 0 {
            self.record(TraceAction::Available { points });
        }
        Some(points)
    }

    fn consume_one(&mut self) {
        let Some(cell) = self.target_cell() else {
            return;
        };
        let Some(prey_index) = self.bodies.first_prey_at(cell, self.actor) else {
            return;
        };
        let Some(prey) = self.bodies.get_mut(prey_index) else {
            return;
        };
        let Some(remaining) = prey.points.checked_sub(1) else {
            return;
        };
        prey.points = remaining;
        let prey_id = prey.id;
        let Some(actor) = self.actor_mut() else {
            return;
        };
        actor.points = actor.points.saturating_add(1);
        let points = actor.points;
        self.effects.consumed = true;
        self.record(TraceAction::Consume {
            prey: prey_id,
            points,
            prey_points: remaining,
        });
    }

    fn nearest(&self) -> Option<u64> {
        self.actor()?;
        Some(self.bodies.nearest_distance(self.actor))
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

fn to_stack_value(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn primitive_move(stacks: &mut Stacks, context: &mut TickContext) {
    if let Some(distance) = stacks.pop_integer() {
        context.move_actor(distance);
    }
}

fn primitive_turn(stacks: &mut Stacks, context: &mut TickContext) {
    if let Some(offset) = stacks.pop_integer() {
        context.turn_actor(offset);
    }
}

fn primitive_forward(_stacks: &mut Stacks, context: &mut TickContext) {
    context.move_actor(1);
}

fn primitive_left(_stacks: &mut Stacks, context: &mut TickContext) {
    context.turn_actor(-1);
}

fn primitive_right(_stacks: &mut Stacks, context: &mut TickContext) {
    context.turn_actor(1);
}

fn primitive_available(stacks: &mut Stacks, context: &mut TickContext) {
    if let Some(points) = context.available_points() {
        stacks.push_integer(to_stack_value(points));
    }
}

fn primitive_consume(_stacks: &mut Stacks, context: &mut TickContext) {
    context.consume_one();
}

fn primitive_nearest(stacks: &mut Stacks, context: &mut TickContext) {
    if let Some(distance) = context.nearest() {
        stacks.push_integer(to_stack_value(distance));
    }
}
