//! Export: surface → encoded bytes → host sink.

pub mod export;
pub mod sink;
