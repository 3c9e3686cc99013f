pub mod app;
pub mod assets;
pub mod audio;
pub mod capability;
pub mod config;
pub mod effects;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod surface;
pub mod terminal;
pub mod visual;
