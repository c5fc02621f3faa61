pub mod frames;
pub mod metadata;
