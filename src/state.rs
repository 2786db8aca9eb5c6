use crate::config::AppConfig;
use crate::models::black_scholes::BlackScholes;
use crate::models::monte_carlo::MonteCarloEngine;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Shared Application State ──

/// Request counters. Lock-free, observability only; never feed into prices.
#[derive(Debug, Default)]
pub struct Counters {
    pub requests_priced: AtomicU64,
    pub requests_rejected: AtomicU64,
    pub computations_failed: AtomicU64,
    pub reference_prices: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            requests_priced: self.requests_priced.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            computations_failed: self.computations_failed.load(Ordering::Relaxed),
            reference_prices: self.reference_prices.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CountersSnapshot {
    pub requests_priced: u64,
    pub requests_rejected: u64,
    pub computations_failed: u64,
    pub reference_prices: u64,
}

/// Shared by every handler. Pricers hold no mutable state, so no locks.
pub struct AppState {
    pub config: AppConfig,
    pub engine: MonteCarloEngine,
    pub reference: BlackScholes,
    pub counters: Counters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let engine = MonteCarloEngine::new(config.pricer_seed);
        Arc::new(Self {
            config,
            engine,
            reference: BlackScholes::new(),
            counters: Counters::default(),
        })
    }
}
