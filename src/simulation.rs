use crate::board::Board;
use crate::reporter::Reporter;
use crate::shutdown::{self, Shutdown, ShutdownTrigger};
use crate::traveller::Spawner;
use anyhow::{Context, Result};
use log::{debug, error, info};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use traveller_common::SimParams;

/// Everything a running unit needs, cheap to clone into a new thread.
#[derive(Clone)]
struct UnitContext {
    board: Arc<Board>,
    params: Arc<SimParams>,
    shutdown: Shutdown,
    /// Every unit thread, including travellers launched later by spawners.
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl UnitContext {
    fn launch<F>(&self, name: String, body: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(body)
            .with_context(|| format!("Failed to start thread '{}'", name))?;
        self.workers.lock().push(handle);
        Ok(())
    }
}

/// Derives one independent RNG per spawner slot (its traveller inherits it).
pub fn unit_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_os_rng(),
    }
}

/// Manages the board and every concurrent unit acting on it.
pub struct Simulation {
    ctx: UnitContext,
    trigger: ShutdownTrigger,
}

impl Simulation {
    /// Creates the board and launches one spawner per slot plus the reporter.
    pub fn start<W>(params: SimParams, writer: W) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let (trigger, shutdown) = shutdown::channel();
        let ctx = UnitContext {
            board: Arc::new(Board::from_params(&params)),
            params: Arc::new(params),
            shutdown,
            workers: Arc::new(Mutex::new(Vec::new())),
        };
        let sim = Self { ctx, trigger };

        info!(
            "Starting {} spawners on a {}x{} board (spawn {}%/{:?}, move {}%/{:?}).",
            sim.ctx.params.slots,
            sim.ctx.params.rows,
            sim.ctx.params.cols,
            sim.ctx.params.spawn_probability,
            sim.ctx.params.spawn_interval,
            sim.ctx.params.move_probability,
            sim.ctx.params.move_interval,
        );

        for slot in 0..sim.ctx.params.slots {
            let rng = unit_rng(sim.ctx.params.seed, slot as u64);
            let unit = sim.ctx.clone();
            sim.ctx
                .launch(format!("spawner-{:02}", slot), move || run_spawner(Spawner::new(slot), unit, rng))?;
        }

        let unit = sim.ctx.clone();
        let format = sim.ctx.params.format;
        sim.ctx.launch("reporter".to_string(), move || {
            let mut reporter = Reporter::new(writer, format);
            reporter.run(&unit.board, unit.params.snapshot_interval, &unit.shutdown);
            debug!("Reporter stopped after {} snapshots", reporter.counter());
        })?;

        Ok(sim)
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.ctx.board
    }

    /// A signal that fires when this simulation shuts down.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.ctx.shutdown.clone()
    }

    /// Runs for `duration`, then shuts down.
    pub fn run_for(self, duration: Duration) -> Result<()> {
        thread::sleep(duration);
        self.shutdown()
    }

    /// Keeps the caller alive for as long as any unit runs. Travellers never
    /// stop on their own, so in practice this returns only if they all panic.
    pub fn wait(self) -> Result<()> {
        let Simulation { ctx, trigger } = self;
        let result = join_all(&ctx.workers);
        trigger.fire();
        result
    }

    /// Signals every unit to stop and joins all threads.
    pub fn shutdown(self) -> Result<()> {
        let Simulation { ctx, trigger } = self;
        info!("Shutting down simulation...");
        trigger.fire();
        join_all(&ctx.workers)?;
        info!("Simulation stopped with {} travellers on the board.", ctx.board.traveller_count());
        Ok(())
    }
}

/// Joins worker threads until none are left. Spawners may register a
/// traveller thread while this runs, so the list is re-checked after each join.
fn join_all(workers: &Mutex<Vec<JoinHandle<()>>>) -> Result<()> {
    let mut panicked = Vec::new();
    loop {
        let next = workers.lock().pop();
        let Some(handle) = next else { break };
        let name = handle.thread().name().unwrap_or("unnamed").to_string();
        if handle.join().is_err() {
            error!("Thread '{}' panicked", name);
            panicked.push(name);
        }
    }
    if !panicked.is_empty() {
        anyhow::bail!("Simulation threads panicked: {}", panicked.join(", "));
    }
    Ok(())
}

fn run_spawner(spawner: Spawner, unit: UnitContext, mut rng: StdRng) {
    let Some(traveller) = spawner.wait_for_spawn(&unit.board, &unit.params, &mut rng, &unit.shutdown) else {
        return;
    };

    // The traveller takes over this spawner's RNG stream.
    let name = format!("traveller-{:02}", traveller.id());
    let body_unit = unit.clone();
    let launched = unit.launch(name, move || {
        traveller.activate(&body_unit.board, &body_unit.params, &mut rng, &body_unit.shutdown);
    });
    if let Err(e) = launched {
        error!("Spawner {:02}: {:#}", spawner.slot(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn seeded_unit_streams_are_reproducible_and_distinct() {
        let a: Vec<u32> = (0..4).map(|_| unit_rng(Some(9), 0).random()).collect();
        assert!(a.windows(2).all(|w| w[0] == w[1]));

        let mut first = unit_rng(Some(9), 0);
        let mut second = unit_rng(Some(9), 1);
        let xs: Vec<u64> = (0..8).map(|_| first.random()).collect();
        let ys: Vec<u64> = (0..8).map(|_| second.random()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn join_all_reports_panicked_threads() {
        let workers = Mutex::new(vec![
            thread::Builder::new().name("fine".into()).spawn(|| {}).unwrap(),
            thread::Builder::new().name("broken".into()).spawn(|| panic!("boom")).unwrap(),
        ]);
        let err = join_all(&workers).unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert!(workers.lock().is_empty());
    }
}
