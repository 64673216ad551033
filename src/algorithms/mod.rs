//! Positioning algorithms

pub mod geodesy;
pub mod refiner;
pub mod gate;

pub use refiner::PositionRefiner;
pub use gate::UpdateGate;
