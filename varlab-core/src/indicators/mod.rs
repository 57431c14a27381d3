//! Series smoothing and dispersion primitives used by the signal generator.

pub mod ema;
pub mod rolling;

pub use ema::{alpha_from_half_life, alpha_from_span, ewma};
pub use rolling::rolling_std;
