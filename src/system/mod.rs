//! Host information and health reporting

mod health;

pub use health::*;
