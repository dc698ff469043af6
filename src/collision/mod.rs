//! Collision modules: the SPH neighbor hash and rigid ground contact.

pub mod ground;
pub mod neighbor;

pub use ground::{ContactImpulse, ContactModel, GroundCollision};
pub use neighbor::NeighborSearch;
