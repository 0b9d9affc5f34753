//! Agent storage, straight-line movement and the experience curve.

use std::collections::HashMap;
use std::time::Duration;

use gridvale_core::{
    AgentId, AgentState, GridPos, Profession, ResourceKind, AGENT_BASE_MAX_XP,
    AGENT_INVENTORY_CAPACITY, XP_CURVE_FACTOR,
};

/// Distance at which a walking agent snaps to its target and stops.
pub const ARRIVAL_EPSILON: f32 = 0.1;

/// Walking speed in grid units per simulated second.
pub const AGENT_SPEED: f32 = 2.0;

/// One resource slot of an agent inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventorySlot {
    /// Resource the slot holds.
    pub resource: ResourceKind,
    /// Units currently held.
    pub amount: u32,
    /// Maximum units the slot can hold.
    pub capacity: u32,
}

/// A settled inhabitant of the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    id: AgentId,
    name: String,
    profession: Profession,
    x: f32,
    y: f32,
    speed: f32,
    target: Option<(f32, f32)>,
    state: AgentState,
    home: GridPos,
    level: u32,
    xp: f32,
    max_xp: f32,
    inventory: Vec<InventorySlot>,
}

impl Agent {
    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Display name, derived from the profession and identifier at spawn.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trade of the agent.
    #[must_use]
    pub const fn profession(&self) -> Profession {
        self.profession
    }

    /// Walking speed in grid units per simulated second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Current position in fractional grid units.
    #[must_use]
    pub const fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Target the agent is walking toward, if any.
    #[must_use]
    pub const fn target(&self) -> Option<(f32, f32)> {
        self.target
    }

    /// Behavioral state of the agent.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Cell of the residence the agent calls home.
    #[must_use]
    pub const fn home(&self) -> GridPos {
        self.home
    }

    /// Current level, starting at 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience accumulated toward the next level.
    #[must_use]
    pub const fn xp(&self) -> f32 {
        self.xp
    }

    /// Experience required for the next level.
    #[must_use]
    pub const fn max_xp(&self) -> f32 {
        self.max_xp
    }

    /// Inventory slots determined by the profession.
    #[must_use]
    pub fn inventory(&self) -> &[InventorySlot] {
        &self.inventory
    }
}

/// Arrival notice produced when a walking agent reaches its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrival {
    /// Agent that arrived.
    pub agent: AgentId,
    /// Final x coordinate.
    pub x: f32,
    /// Final y coordinate.
    pub y: f32,
}

/// Level-up notice produced when an experience grant crosses the threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelUp {
    /// Level reached.
    pub level: u32,
    /// New experience requirement.
    pub max_xp: f32,
}

/// Collection of all living agents.
#[derive(Clone, Debug, Default)]
pub struct AgentStore {
    agents: HashMap<AgentId, Agent>,
    next_id: u32,
}

impl AgentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settles a new agent and returns its identifier.
    pub fn spawn(&mut self, profession: Profession, home: GridPos, at: GridPos) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id += 1;
        let inventory = profession
            .starter_slots()
            .iter()
            .map(|&resource| InventorySlot {
                resource,
                amount: 0,
                capacity: AGENT_INVENTORY_CAPACITY,
            })
            .collect();
        let _ = self.agents.insert(
            id,
            Agent {
                id,
                name: format!("{} {}", profession.display_name(), id.get()),
                profession,
                x: at.x() as f32,
                y: at.y() as f32,
                speed: AGENT_SPEED,
                target: None,
                state: AgentState::Idle,
                home,
                level: 1,
                xp: 0.0,
                max_xp: AGENT_BASE_MAX_XP,
                inventory,
            },
        );
        id
    }

    /// Looks up an agent by identifier.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Number of living agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether no agents exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Iterates over all agents in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Orders an agent to walk straight toward a fractional grid point.
    ///
    /// An agent already walking keeps its current target; the new order is
    /// dropped. Returns `false` when the agent does not exist or the order
    /// was dropped.
    pub fn send_to(&mut self, id: AgentId, x: f32, y: f32) -> bool {
        match self.agents.get_mut(&id) {
            Some(agent) => {
                if agent.state == AgentState::Walking {
                    return false;
                }
                agent.target = Some((x, y));
                agent.state = AgentState::Walking;
                true
            }
            None => false,
        }
    }

    /// Moves every walking agent along its straight line for `dt`.
    ///
    /// Agents whose remaining distance falls below [`ARRIVAL_EPSILON`] snap
    /// to their target, go idle, and are reported as arrivals.
    pub fn advance(&mut self, dt: Duration) -> Vec<Arrival> {
        let mut arrivals = Vec::new();
        for agent in self.agents.values_mut() {
            let Some((tx, ty)) = agent.target else {
                continue;
            };
            let step = agent.speed * dt.as_secs_f32();
            let dx = tx - agent.x;
            let dy = ty - agent.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance < ARRIVAL_EPSILON || distance <= step {
                agent.x = tx;
                agent.y = ty;
                agent.target = None;
                agent.state = AgentState::Idle;
                arrivals.push(Arrival {
                    agent: agent.id,
                    x: tx,
                    y: ty,
                });
            } else {
                agent.x += dx / distance * step;
                agent.y += dy / distance * step;
            }
        }
        arrivals.sort_by_key(|arrival| arrival.agent);
        arrivals
    }

    /// Credits experience, applying the geometric level curve.
    ///
    /// Returns the post-grant experience total and any level-ups that fired,
    /// or `None` when the agent does not exist. A single large grant may
    /// produce several level-ups.
    pub fn gain_experience(&mut self, id: AgentId, amount: f32) -> Option<(f32, Vec<LevelUp>)> {
        let agent = self.agents.get_mut(&id)?;
        agent.xp += amount;
        let mut level_ups = Vec::new();
        while agent.xp >= agent.max_xp {
            agent.xp -= agent.max_xp;
            agent.level += 1;
            agent.max_xp *= XP_CURVE_FACTOR;
            level_ups.push(LevelUp {
                level: agent.level,
                max_xp: agent.max_xp,
            });
        }
        Some((agent.xp, level_ups))
    }

    /// Drops every agent. Used when a new map replaces the world.
    pub(crate) fn clear(&mut self) {
        self.agents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_agents_start_at_level_one_with_empty_slots() {
        let mut store = AgentStore::new();
        let id = store.spawn(Profession::Farmer, GridPos::new(4, 4), GridPos::new(4, 5));
        let agent = store.get(id).expect("agent exists");

        assert_eq!(agent.level(), 1);
        assert_eq!(agent.xp(), 0.0);
        assert_eq!(agent.max_xp(), AGENT_BASE_MAX_XP);
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.position(), (4.0, 5.0));
        assert_eq!(agent.name(), "Farmer 0");
        assert_eq!(agent.speed(), AGENT_SPEED);
        let slots: Vec<ResourceKind> = agent
            .inventory()
            .iter()
            .map(|slot| slot.resource)
            .collect();
        assert_eq!(slots, vec![ResourceKind::Wheat, ResourceKind::Seeds]);
        assert!(agent.inventory().iter().all(|slot| slot.amount == 0));
        assert!(agent
            .inventory()
            .iter()
            .all(|slot| slot.capacity == AGENT_INVENTORY_CAPACITY));
    }

    #[test]
    fn walking_agent_approaches_then_arrives() {
        let mut store = AgentStore::new();
        let id = store.spawn(
            Profession::Lumberjack,
            GridPos::new(0, 0),
            GridPos::new(0, 0),
        );
        assert!(store.send_to(id, 10.0, 0.0));
        assert_eq!(store.get(id).expect("agent").state(), AgentState::Walking);

        let arrivals = store.advance(Duration::from_secs(1));
        assert!(arrivals.is_empty());
        let (x, _) = store.get(id).expect("agent").position();
        assert!((x - AGENT_SPEED).abs() < 1e-5);

        // Four more seconds covers the remaining eight units.
        let arrivals = store.advance(Duration::from_secs(4));
        assert_eq!(
            arrivals,
            vec![Arrival {
                agent: id,
                x: 10.0,
                y: 0.0
            }]
        );
        let agent = store.get(id).expect("agent");
        assert_eq!(agent.position(), (10.0, 0.0));
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.target(), None);
    }

    #[test]
    fn near_target_agent_snaps_within_epsilon() {
        let mut store = AgentStore::new();
        let id = store.spawn(Profession::Miner, GridPos::new(0, 0), GridPos::new(0, 0));
        assert!(store.send_to(id, 0.05, 0.0));

        let arrivals = store.advance(Duration::from_millis(1));
        assert_eq!(arrivals.len(), 1);
        assert_eq!(store.get(id).expect("agent").position(), (0.05, 0.0));
    }

    #[test]
    fn orders_are_dropped_while_walking() {
        let mut store = AgentStore::new();
        let id = store.spawn(Profession::Farmer, GridPos::new(0, 0), GridPos::new(0, 0));
        assert!(store.send_to(id, 10.0, 0.0));

        assert!(!store.send_to(id, 0.0, 10.0));
        assert_eq!(store.get(id).expect("agent").target(), Some((10.0, 0.0)));
    }

    #[test]
    fn sending_a_missing_agent_is_reported() {
        let mut store = AgentStore::new();
        assert!(!store.send_to(AgentId::new(99), 1.0, 1.0));
    }

    #[test]
    fn experience_curve_grows_geometrically() {
        let mut store = AgentStore::new();
        let id = store.spawn(Profession::Fisherman, GridPos::new(0, 0), GridPos::new(0, 0));

        let (xp, level_ups) = store.gain_experience(id, 40.0).expect("agent exists");
        assert_eq!(xp, 40.0);
        assert!(level_ups.is_empty());

        let (xp, level_ups) = store.gain_experience(id, 60.0).expect("agent exists");
        assert_eq!(xp, 0.0);
        assert_eq!(
            level_ups,
            vec![LevelUp {
                level: 2,
                max_xp: 150.0
            }]
        );
    }

    #[test]
    fn one_grant_can_cross_several_levels() {
        let mut store = AgentStore::new();
        let id = store.spawn(Profession::Miner, GridPos::new(0, 0), GridPos::new(0, 0));

        // 100 + 150 = 250 clears two thresholds exactly.
        let (xp, level_ups) = store.gain_experience(id, 250.0).expect("agent exists");
        assert_eq!(xp, 0.0);
        assert_eq!(level_ups.len(), 2);
        assert_eq!(level_ups[1].level, 3);
        assert_eq!(level_ups[1].max_xp, 225.0);
        assert_eq!(store.get(id).expect("agent").level(), 3);
        assert_eq!(store.get(id).expect("agent").max_xp(), 225.0);
    }
}
