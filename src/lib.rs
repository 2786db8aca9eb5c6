//! European option pricing by risk-neutral Monte Carlo simulation under
//! geometric Brownian motion, with a closed-form Black-Scholes cross-check
//! and a small HTTP service in front of both.

pub mod config;
pub mod errors;
pub mod models;
pub mod server;
pub mod state;
