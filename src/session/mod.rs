pub mod editor;
pub mod input;
pub mod viewport;
