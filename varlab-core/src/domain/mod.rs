//! Domain types: quotes, variance observations, signals, positions, NAV.

pub mod nav;
pub mod position;
pub mod quote;
pub mod signal;
pub mod variance;

pub use nav::{NavLedger, NavPoint};
pub use position::{Direction, Position};
pub use quote::{LadderError, QuoteRecord, StrikeLadder};
pub use signal::{BandState, Signal, SignalAction};
pub use variance::{SeriesError, VarianceObservation, VarianceSeries};
