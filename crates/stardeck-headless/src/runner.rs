//! Headless tick loop. Advances the engine at its tick rate and hands
//! snapshots to a sink at a throttled cadence.

use std::io::Write;
use std::time::{Duration, Instant};

use log::{debug, warn};

use stardeck_core::state::SimSnapshot;
use stardeck_sim::engine::SimulationEngine;

/// Gate that opens at most once per interval of broadcast clock time.
#[derive(Debug, Clone)]
pub struct BroadcastThrottle {
    interval_ms: f64,
    since_last_ms: Option<f64>,
}

impl BroadcastThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms as f64,
            since_last_ms: None,
        }
    }

    /// Advance the clock. Returns true when a broadcast is due.
    /// The first call always broadcasts.
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        match self.since_last_ms.as_mut() {
            None => {
                self.since_last_ms = Some(0.0);
                true
            }
            Some(since) => {
                *since += elapsed_ms;
                if *since >= self.interval_ms {
                    *since = 0.0;
                    true
                } else {
                    false
                }
            }
        }
    }
}

pub struct RunOptions {
    pub ticks: u64,
    pub broadcast_interval_ms: u64,
    /// Sleep between ticks to hold the nominal tick rate.
    pub realtime: bool,
}

/// Run `options.ticks` ticks, writing due snapshots as JSON lines.
/// Returns the number of snapshots written.
pub fn run(
    engine: &mut SimulationEngine,
    options: &RunOptions,
    out: &mut impl Write,
) -> std::io::Result<u64> {
    let tick_duration = Duration::from_secs_f64(engine.context().config.tick_ms() / 1000.0);
    let mut throttle = BroadcastThrottle::new(options.broadcast_interval_ms);
    let mut next_tick_time = Instant::now();
    let mut last_tick_time = Instant::now();
    let mut written = 0;

    for _ in 0..options.ticks {
        let snapshot = engine.tick();

        // Broadcast cadence follows wall time when running live.
        let elapsed_ms = if options.realtime {
            let now = Instant::now();
            let ms = (now - last_tick_time).as_secs_f64() * 1000.0;
            last_tick_time = now;
            ms
        } else {
            tick_duration.as_secs_f64() * 1000.0
        };
        if throttle.advance(elapsed_ms) {
            emit(&snapshot, out)?;
            written += 1;
        }

        if options.realtime {
            let time_scale = engine.time_scale();
            let effective = if time_scale > 0.001 {
                tick_duration.div_f64(time_scale)
            } else {
                tick_duration
            };
            next_tick_time += effective;
            let now = Instant::now();
            if next_tick_time > now {
                std::thread::sleep(next_tick_time - now);
            } else if now - next_tick_time > effective * 2 {
                debug!("tick loop fell behind, resetting schedule");
                next_tick_time = now;
            }
        }
    }
    out.flush()?;
    Ok(written)
}

fn emit(snapshot: &SimSnapshot, out: &mut impl Write) -> std::io::Result<()> {
    match serde_json::to_string(snapshot) {
        Ok(line) => writeln!(out, "{line}"),
        Err(e) => {
            warn!("failed to serialize snapshot at tick {}: {e}", snapshot.time.tick);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardeck_sim::engine::SimConfig;
    use stardeck_sim::world_setup::setup_demo;

    #[test]
    fn test_throttle_first_call_broadcasts() {
        let mut throttle = BroadcastThrottle::new(100);
        assert!(throttle.advance(0.0));
        assert!(!throttle.advance(50.0));
        assert!(throttle.advance(50.0));
    }

    #[test]
    fn test_throttle_zero_interval_broadcasts_every_tick() {
        let mut throttle = BroadcastThrottle::new(0);
        for _ in 0..5 {
            assert!(throttle.advance(33.3));
        }
    }

    #[test]
    fn test_run_writes_throttled_json_lines() {
        let mut engine = SimulationEngine::new(SimConfig::default());
        setup_demo(engine.ecs_mut()).unwrap();
        let options = RunOptions {
            ticks: 30,
            broadcast_interval_ms: 90,
            realtime: false,
        };

        let mut out = Vec::new();
        let written = run(&mut engine, &options, &mut out).unwrap();

        // First tick, then every third tick.
        assert_eq!(written, 10);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 10);
        for line in text.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("ships").is_some());
        }
        assert_eq!(engine.time().tick, 30);
    }
}
