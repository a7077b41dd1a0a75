//! Load generation engine
//!
//! Provides:
//! - Parameter parsing and clamping for the HTTP surface
//! - A thread fan-out/fan-in helper
//! - Trigonometric and Fibonacci CPU burners bounded by wall-clock deadlines

mod fib;
mod params;
mod pool;
mod trig;

pub use fib::*;
pub use params::*;
pub use pool::*;
pub use trig::*;
