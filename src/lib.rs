pub mod app;
pub mod logging;
pub mod logic;
pub mod model;
