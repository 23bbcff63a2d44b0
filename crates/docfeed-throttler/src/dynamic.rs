//! The dynamic throttler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use docfeed_core::clock::{system_clock, Clock};
use docfeed_core::events::{EventListeners, FnListener};
use rand::rngs::{StdRng, SysRng};
use rand::{RngExt, SeedableRng};

use crate::events::ThrottlerEvent;
use crate::Throttler;

/// Smallest number of in-flight operations the throttler will recommend.
pub const MIN_INFLIGHT: u64 = 16;
/// Largest number of in-flight operations the throttler will recommend.
pub const MAX_INFLIGHT: u64 = 256 * MIN_INFLIGHT;

/// Throughput is raised to this power in the optimisation objective; the
/// remaining weight penalises queueing.
const WEIGHT: f64 = 0.7;
/// Log-scale histogram buckets across `[MIN_INFLIGHT, MAX_INFLIGHT)`.
const BUCKETS: usize = 128;

/// A throttler that searches for the in-flight level maximising
/// `throughput × inflight^(WEIGHT − 1)`.
///
/// Recent throughput measurements are kept in a log-scale histogram indexed by
/// the in-flight level they were taken at, so levels spanning several orders
/// of magnitude stay comparable. A measurement window closes when the cubic
/// sample threshold is reached (`sent³ ≥ 100 × target²`), which spaces
/// revisions out as the target grows and keeps single windows statistically
/// meaningful. Each close re-picks the best bucket and jitters the target with
/// an upward-skewed random factor, giving a biased random walk upward when no
/// bucket dominates.
///
/// A secondary ceiling tracks explicit backend throttle signals: it is halved
/// relative to the in-flight level at throttle time and decays slowly upward
/// again with every success.
pub struct DynamicThrottler {
    ok: AtomicU64,
    target_inflight: AtomicU64,
    target_times_ten: AtomicU64,
    window: Mutex<Window>,
    clock: Clock,
    listeners: EventListeners<ThrottlerEvent>,
    name: String,
}

/// Measurement state mutated from `sent`; guarded by one mutex because `sent`
/// is called from every worker.
struct Window {
    throughputs: Vec<f64>,
    sent: u64,
    start: Instant,
    rng: StdRng,
}

impl DynamicThrottler {
    /// Creates a throttler with the default clock and an OS-seeded RNG.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for injecting a clock, an RNG seed, a name, and
    /// event listeners.
    pub fn builder() -> DynamicThrottlerBuilder {
        DynamicThrottlerBuilder::default()
    }
}

impl Default for DynamicThrottler {
    fn default() -> Self {
        Self::new()
    }
}

impl Throttler for DynamicThrottler {
    fn sent(&self) {
        let current = self.target_inflight.load(Ordering::Relaxed);
        let mut window = self.window.lock().unwrap();
        window.sent += 1;
        if window.sent.pow(3) < 100 * current * current {
            return;
        }
        window.sent = 0;
        let now = (self.clock)();
        let elapsed = now.duration_since(window.start);
        window.start = now;
        let ok = self.ok.swap(0, Ordering::Relaxed);
        let throughput = ok as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

        // Bucket throughput by in-flight level, log-scale over
        // [MIN_INFLIGHT, MAX_INFLIGHT).
        let buckets = window.throughputs.len() as f64;
        let level = (current as f64 / MIN_INFLIGHT as f64).clamp(1.0, 255.0);
        let index = (buckets * level.ln() / 256f64.ln()) as usize;
        window.throughputs[index] = throughput;

        // Pick the measurement that optimises throughput (WEIGHT) against
        // queueing (1 - WEIGHT).
        let mut choice = current as f64;
        let mut best = -1.0f64;
        for (i, &measured) in window.throughputs.iter().enumerate().rev() {
            if measured == 0.0 {
                continue; // unknown level
            }
            let inflight = MIN_INFLIGHT as f64 * 256f64.powf((i as f64 + 0.5) / buckets);
            let objective = measured * inflight.powf(WEIGHT - 1.0);
            if objective > best {
                best = objective;
                choice = inflight;
            }
        }
        // Random walk, skewed towards increase.
        let jitter = window.rng.random::<f64>() * 0.20 + 0.92;
        drop(window);

        let target = ((jitter * choice) as u64).clamp(MIN_INFLIGHT, MAX_INFLIGHT);
        let previous = self.target_inflight.swap(target, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            throttler = %self.name,
            previous,
            target,
            throughput,
            "closed throughput window"
        );
        #[cfg(feature = "metrics")]
        metrics::gauge!("docfeed_throttler_target_inflight", "throttler" => self.name.clone())
            .set(target as f64);

        self.listeners.emit(&ThrottlerEvent::TargetUpdated {
            component: self.name.clone(),
            timestamp: now,
            previous,
            target,
        });
    }

    fn success(&self) {
        self.target_times_ten.fetch_add(1, Ordering::Relaxed);
        self.ok.fetch_add(1, Ordering::Relaxed);
    }

    fn throttled(&self, inflight: u64) {
        let ceiling = inflight.saturating_mul(5).max(MIN_INFLIGHT * 10);
        self.target_times_ten.store(ceiling, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        tracing::warn!(throttler = %self.name, inflight, "backend signalled overload");
        #[cfg(feature = "metrics")]
        metrics::counter!("docfeed_throttler_throttle_signals_total", "throttler" => self.name.clone())
            .increment(1);

        self.listeners.emit(&ThrottlerEvent::ThrottleSignaled {
            component: self.name.clone(),
            timestamp: (self.clock)(),
            inflight,
        });
    }

    fn target_inflight(&self) -> u64 {
        let ceiling = (self.target_times_ten.load(Ordering::Relaxed) / 10).min(MAX_INFLIGHT);
        ceiling.min(self.target_inflight.load(Ordering::Relaxed))
    }
}

/// Builder for [`DynamicThrottler`].
pub struct DynamicThrottlerBuilder {
    clock: Clock,
    seed: Option<u64>,
    name: String,
    listeners: EventListeners<ThrottlerEvent>,
}

impl Default for DynamicThrottlerBuilder {
    fn default() -> Self {
        Self {
            clock: system_clock(),
            seed: None,
            name: "throttler".to_string(),
            listeners: EventListeners::new(),
        }
    }
}

impl DynamicThrottlerBuilder {
    /// Sets the clock the throttler measures elapsed time with.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Seeds the jitter RNG for deterministic behavior.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Names this throttler instance in events, logs, and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for every window close, with the previous and the
    /// revised target.
    pub fn on_target_updated<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, u64) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &ThrottlerEvent| {
            if let ThrottlerEvent::TargetUpdated {
                previous, target, ..
            } = event
            {
                f(*previous, *target);
            }
        }));
        self
    }

    /// Registers a callback for backend throttle signals.
    pub fn on_throttle_signaled<F>(mut self, f: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &ThrottlerEvent| {
            if let ThrottlerEvent::ThrottleSignaled { inflight, .. } = event {
                f(*inflight);
            }
        }));
        self
    }

    pub fn build(self) -> DynamicThrottler {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::try_from_rng(&mut SysRng).expect("failed to seed RNG from OS"),
        };
        DynamicThrottler {
            ok: AtomicU64::new(0),
            target_inflight: AtomicU64::new(8 * MIN_INFLIGHT),
            target_times_ten: AtomicU64::new(10 * MAX_INFLIGHT),
            window: Mutex::new(Window {
                throughputs: vec![0.0; BUCKETS],
                sent: 0,
                start: (self.clock)(),
                rng,
            }),
            clock: self.clock,
            listeners: self.listeners,
            name: self.name,
        }
    }
}
