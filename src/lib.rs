pub mod calibration;
pub mod cli;
pub mod config;
pub mod drivers;
pub mod input;
pub mod mapping;
pub mod sync;
