pub mod bounds;
pub mod builder;
pub mod clock;
pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod projection;
pub mod view;
