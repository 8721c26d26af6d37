//! The simulation context threaded by reference through every system call.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use stardeck_core::types::SimTime;

use crate::ecs::Ecs;
use crate::engine::SimConfig;
use crate::physics::ShardTable;

/// Entity registry, shard table, RNG and clock for one simulation.
pub struct SimContext {
    pub ecs: Ecs,
    pub shards: ShardTable,
    pub rng: ChaCha8Rng,
    pub time: SimTime,
    pub config: SimConfig,
}

impl SimContext {
    pub fn new(config: SimConfig) -> Self {
        Self {
            ecs: Ecs::new(),
            shards: ShardTable::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            time: SimTime::default(),
            config,
        }
    }
}
