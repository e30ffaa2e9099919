//! SPMD lane team.
//!
//! A `Team` owns a dedicated rayon pool with exactly one thread per lane and
//! runs a body on every thread at once through `ThreadPool::broadcast`. The
//! body receives its `Lane` and a barrier capability. Kernels never see the
//! barrier; the body calls it between phases so that writes made by one
//! lane are visible to every other lane in the next phase.
//!
//! A lane that panics breaks the barrier: lanes waiting on it (or arriving
//! later) unwind instead of blocking, and `Team::run` re-raises the first
//! lane's panic once every lane has returned.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tessera_core::{Filter, Image, Lane, TesseraError, GAUSSIAN_3X3};

use crate::dispatch::Variant;
use crate::pattern::{init, verify, zero, Mismatch};
use crate::problem::ConvProblem;

/// Synchronization point shared by all lanes of a team.
pub trait LaneBarrier: Sync {
    /// Block until every lane has reached this call.
    fn wait(&self);
}

/// Unwind payload of a lane released from a broken barrier.
struct BarrierBroken;

struct BarrierState {
    arrived: usize,
    generation: u64,
    broken: bool,
}

/// Reusable barrier for a fixed number of lanes that can be broken.
pub struct TeamBarrier {
    state: Mutex<BarrierState>,
    cvar: Condvar,
    parties: usize,
}

impl TeamBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            cvar: Condvar::new(),
            parties,
        }
    }

    /// Release every waiter; current and later `wait` calls unwind.
    pub fn break_barrier(&self) {
        let mut state = self.state.lock();
        state.broken = true;
        self.cvar.notify_all();
    }

    pub fn is_broken(&self) -> bool {
        self.state.lock().broken
    }

    /// Clear a broken state and any partial arrivals.
    fn reset(&self) {
        let mut state = self.state.lock();
        state.arrived = 0;
        state.generation += 1;
        state.broken = false;
    }
}

impl LaneBarrier for TeamBarrier {
    fn wait(&self) {
        let mut state = self.state.lock();
        if !state.broken {
            let generation = state.generation;
            state.arrived += 1;
            if state.arrived == self.parties {
                state.arrived = 0;
                state.generation += 1;
                self.cvar.notify_all();
                return;
            }
            while state.generation == generation && !state.broken {
                self.cvar.wait(&mut state);
            }
            if state.generation != generation {
                return;
            }
        }
        drop(state);
        // resume_unwind skips the panic hook; the lane that broke the
        // barrier already reported its own panic
        panic::resume_unwind(Box::new(BarrierBroken));
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    #[error("a team needs at least one lane")]
    NoLanes,

    #[error("failed to start lane threads: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Precondition(#[from] TesseraError),

    #[error("verification failed: {0}")]
    Verify(#[from] Mismatch),
}

pub struct Team {
    pool: ThreadPool,
    barrier: TeamBarrier,
    /// Lanes that reached the start barrier of the current run.
    ready: AtomicUsize,
    /// One run at a time; interleaved broadcasts would cross barriers.
    phase: Mutex<()>,
    num_lanes: usize,
}

impl Team {
    pub fn new(num_lanes: usize) -> Result<Self, TeamError> {
        if num_lanes == 0 {
            return Err(TeamError::NoLanes);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_lanes)
            .thread_name(|i| format!("tessera-lane-{i}"))
            .build()?;
        tracing::debug!(num_lanes, "lane team started");
        Ok(Self {
            pool,
            barrier: TeamBarrier::new(num_lanes),
            ready: AtomicUsize::new(0),
            phase: Mutex::new(()),
            num_lanes,
        })
    }

    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }

    /// Lanes that checked in during the most recent run.
    pub fn ready_lanes(&self) -> usize {
        self.ready.load(Ordering::Acquire)
    }

    /// Run `body` on every lane concurrently; results are ordered by lane id.
    ///
    /// All lanes pass a start barrier before `body` runs. Every lane must
    /// call `barrier.wait()` the same number of times or the run deadlocks.
    ///
    /// # Panics
    ///
    /// If any lane panics, the barrier is broken so the other lanes unwind,
    /// and the first lane's panic is resumed here after all lanes return.
    /// The team stays usable for later runs.
    pub fn run<R, F>(&self, body: F) -> Vec<R>
    where
        F: Fn(Lane, &dyn LaneBarrier) -> R + Sync,
        R: Send,
    {
        let _phase = self.phase.lock();
        self.ready.store(0, Ordering::Release);
        self.barrier.reset();

        let results = self.pool.broadcast(|ctx| {
            let lane = Lane::new(ctx.index(), self.num_lanes)
                .expect("broadcast index is below the pool size");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.ready.fetch_add(1, Ordering::AcqRel);
                self.barrier.wait();
                tracing::trace!(lane = lane.id(), "lane running");
                body(lane, &self.barrier)
            }));
            if outcome.is_err() {
                self.barrier.break_barrier();
            }
            outcome
        });

        let mut values = Vec::with_capacity(results.len());
        let mut first_panic: Option<Box<dyn Any + Send>> = None;
        let mut released = false;
        for (id, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => values.push(value),
                Err(payload) if payload.is::<BarrierBroken>() => released = true,
                Err(payload) => {
                    tracing::warn!(lane = id, "lane panicked");
                    first_panic.get_or_insert(payload);
                }
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        if released {
            panic!("lane barrier was broken during the run");
        }
        values
    }

    /// Zero `output`, then convolve `input` into it with every lane.
    ///
    /// Preconditions are validated once before the lanes start.
    pub fn convolve(
        &self,
        variant: Variant,
        input: &Image,
        filter: &Filter,
        output: &Image,
    ) -> Result<(), TeamError> {
        ConvProblem::new(input, filter, output).validate(variant)?;
        self.warn_idle(variant, input.width(), filter);
        tracing::debug!(
            variant = %variant,
            width = input.width(),
            height = input.height(),
            "convolve"
        );

        let results = self.run(|lane, barrier| {
            zero(output, lane);
            barrier.wait();
            let ran = variant.run(input, filter, output, lane);
            barrier.wait();
            ran
        });
        results.into_iter().collect::<Result<(), TesseraError>>()?;
        Ok(())
    }

    /// End-to-end self-check: init pattern, blur with `GAUSSIAN_3X3`, verify.
    pub fn check(&self, variant: Variant, width: usize, height: usize) -> Result<(), TeamError> {
        let input = Image::zeros(width, height);
        let output = Image::zeros(width, height);
        let filter = Filter::from_3x3(&GAUSSIAN_3X3);
        ConvProblem::new(&input, &filter, &output).validate(variant)?;
        self.warn_idle(variant, width, &filter);
        tracing::debug!(variant = %variant, width, height, "self-check");

        let results = self.run(|lane, barrier| {
            init(&input, lane);
            zero(&output, lane);
            barrier.wait();
            let ran = variant.run(&input, &filter, &output, lane);
            barrier.wait();
            ran
        });
        results.into_iter().collect::<Result<(), TesseraError>>()?;
        self.verify(&output)?;
        Ok(())
    }

    /// Verify `img` on every lane (resetting checked elements to zero).
    ///
    /// Returns the mismatch with the lowest linear index found by any lane.
    pub fn verify(&self, img: &Image) -> Result<(), Mismatch> {
        let results = self.run(|lane, _| verify(img, lane));
        let first = results
            .into_iter()
            .filter_map(Result::err)
            .min_by_key(|m| m.index);
        match first {
            Some(m) => Err(m),
            None => Ok(()),
        }
    }

    fn warn_idle(&self, variant: Variant, width: usize, filter: &Filter) {
        let idle = variant.idle_lanes(self.num_lanes, width, filter);
        if idle > 0 {
            tracing::warn!(
                variant = %variant,
                idle,
                num_lanes = self.num_lanes,
                width,
                "partition leaves lanes without columns"
            );
        }
    }
}
