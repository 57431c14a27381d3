//! VarLab Core — variance replication, signal generation, position simulation.
//!
//! This crate contains the heart of the backtesting pipeline:
//! - Domain types (quotes, strike ladders, variance observations, signals,
//!   positions, the NAV ledger)
//! - The variance replicator: log-contract replication over a discrete
//!   strike ladder, trapezoidal quadrature in 1/K^2
//! - The signal generator: EMA-centred Bollinger bands with strict
//!   crossing detection and a reproducible warm-up window
//! - The position simulator: guarded FLAT/LONG/SHORT state machine,
//!   next-available-date fills, append-only NAV ledger
//!
//! Everything here is pure, synchronous computation. Quote ingestion,
//! configuration files, metrics aggregation, and artifact export live in
//! `varlab-runner`.

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod replication;
pub mod signals;
