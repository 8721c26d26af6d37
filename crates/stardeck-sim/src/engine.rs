//! Simulation engine.
//!
//! `SimulationEngine` owns the simulation context and the scheduler,
//! applies queued commands at tick boundaries, runs the system pipeline and
//! produces `SimSnapshot`s. Completely headless, enabling deterministic
//! testing.

use std::collections::VecDeque;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use stardeck_core::commands::SimCommand;
use stardeck_core::constants::*;
use stardeck_core::enums::SimPhase;
use stardeck_core::state::SimSnapshot;
use stardeck_core::types::SimTime;

use crate::context::SimContext;
use crate::ecs::{Ecs, Scheduler, System};
use crate::systems;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Initial time scale (1.0 = normal).
    pub time_scale: f64,
    /// Ticks per second of simulated time.
    pub tick_rate: u32,
    /// Edge length of a physics shard in km.
    pub shard_size: f64,
    /// Speed (km/s) above which bodies take the kinematic path.
    pub high_speed_threshold: f64,
    /// Evict shards that held no bodies for this many consecutive ticks.
    /// `None` retains shards for the life of the simulation.
    pub shard_eviction_ticks: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            time_scale: 1.0,
            tick_rate: TICK_RATE,
            shard_size: DEFAULT_SHARD_SIZE_KM,
            high_speed_threshold: DEFAULT_HIGH_SPEED_THRESHOLD_KM_S,
            shard_eviction_ticks: None,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Real milliseconds per tick at time scale 1.
    pub fn tick_ms(&self) -> f64 {
        1000.0 / self.tick_rate.max(1) as f64
    }
}

/// The simulation engine. Owns the context and the system pipeline.
pub struct SimulationEngine {
    ctx: SimContext,
    scheduler: Scheduler,
    phase: SimPhase,
    command_queue: VecDeque<SimCommand>,
}

impl SimulationEngine {
    /// Create an engine with the default system pipeline.
    pub fn new(config: SimConfig) -> Self {
        let mut engine = Self::empty(config);
        for system in systems::default_pipeline() {
            engine.register_system(system);
        }
        engine
    }

    /// Create an engine with no systems registered.
    pub fn empty(config: SimConfig) -> Self {
        Self {
            ctx: SimContext::new(config),
            scheduler: Scheduler::new(),
            phase: SimPhase::default(),
            command_queue: VecDeque::new(),
        }
    }

    /// Append a system to the pipeline.
    pub fn register_system(&mut self, system: Box<dyn System>) {
        self.scheduler.register(&mut self.ctx, system);
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: SimCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = SimCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> SimSnapshot {
        self.process_commands();

        if self.phase == SimPhase::Running {
            let elapsed_ms = self.ctx.config.tick_ms() * self.ctx.config.time_scale;
            self.scheduler.run(&mut self.ctx, elapsed_ms);
            self.ctx.time.advance(elapsed_ms / 1000.0);
        }

        systems::snapshot::build_snapshot(&self.ctx, self.phase)
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.ctx.time
    }

    pub fn time_scale(&self) -> f64 {
        self.ctx.config.time_scale
    }

    pub fn ecs(&self) -> &Ecs {
        &self.ctx.ecs
    }

    /// Entity lifecycle surface for external collaborators.
    pub fn ecs_mut(&mut self) -> &mut Ecs {
        &mut self.ctx.ecs
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: SimCommand) {
        match command {
            SimCommand::RemoveEntity { id } => {
                if let Err(e) = self.ctx.ecs.remove_entity_by_id(id) {
                    warn!("remove entity: {e}");
                }
            }
            SimCommand::MergeComponent { id, kind, data } => {
                if let Err(e) = self.ctx.ecs.merge_component_json(id, kind, &data) {
                    warn!("merge {kind} into {id}: {e}");
                }
            }
            SimCommand::RemoveComponent { id, kind } => {
                self.ctx.ecs.remove_component_kind(id, kind);
            }
            SimCommand::SetTimeScale { scale } => {
                if scale.is_finite() {
                    self.ctx.config.time_scale = scale.clamp(0.0, 10.0);
                    debug!("time scale {}", self.ctx.config.time_scale);
                }
            }
            SimCommand::Pause => {
                self.phase = SimPhase::Paused;
            }
            SimCommand::Resume => {
                self.phase = SimPhase::Running;
            }
        }
    }
}
