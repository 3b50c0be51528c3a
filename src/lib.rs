pub mod analysis;
pub mod api;
pub mod controller;
pub mod models;
pub mod ui;
