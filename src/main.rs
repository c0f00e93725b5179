// ==============================================================================
// main.rs — HEADLESS HOST
// ------------------------------------------------------------------------------
// usage: wheel-collider [config.json]
//
// Spawns one vehicle on a flat ground, feeds it the configured input script on
// a fixed-step ticker and logs a JSON telemetry line every `telemetry_every`
// steps. Stops after `duration` seconds or on ctrl-c.
// ==============================================================================

use std::process::ExitCode;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wheel_collider::{PhysicsWorld, ScriptedInput, SimConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match SimConfig::from_args(std::env::args()) {
        Ok(c) => c,
        Err(e) => {
            error!("config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut world: PhysicsWorld<ScriptedInput> = PhysicsWorld::new(config.gravity_vector());
    if let Err(e) = world.spawn_vehicle("car", &config.vehicle, config.spawn_position, config.scripted_input()) {
        error!("spawn failed: {e}");
        return ExitCode::FAILURE;
    }

    info!(dt = config.dt, steps = ?config.steps(), "starting simulation");

    let mut ticker = interval(Duration::from_secs_f32(config.dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!(tick = world.tick, "ctrl-c, stopping");
                break;
            }
        }

        world.step(config.dt);

        if config.telemetry_every > 0 && world.tick % u64::from(config.telemetry_every) == 0 {
            for t in world.telemetry() {
                match serde_json::to_string(&t) {
                    Ok(line) => info!(target: "telemetry", "{line}"),
                    Err(e) => error!("telemetry encode failed: {e}"),
                }
            }
        }

        if config.steps().is_some_and(|n| world.tick >= n) {
            info!(tick = world.tick, "duration reached");
            break;
        }
    }

    ExitCode::SUCCESS
}
