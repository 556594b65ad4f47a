//! Cargo objects: spawning, field borders, click routing and per-tick motion.

pub mod init;
pub mod routing;
pub mod stepper;

pub use init::{CargoInitSystem, FieldBordersSystem};
pub use routing::CargoClickSystem;
pub use stepper::CargoStepSystem;
