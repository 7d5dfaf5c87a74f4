pub mod chunk;
pub mod coord;
pub mod face;
pub mod material;
pub mod neighbor_access;
