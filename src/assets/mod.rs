pub mod catalog;
pub mod color;
pub mod crop;
pub mod decode;
pub mod raster;
pub mod text;
