pub mod config;
pub mod geometry;
pub mod layers;
pub mod model;
