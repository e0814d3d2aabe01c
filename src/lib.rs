pub mod camera;
pub mod compositor;
pub mod config;
pub mod controls;
pub mod debounce;
pub mod deck;
pub mod draw;
pub mod font;
pub mod gesture;
pub mod output;
pub mod presentation;
pub mod session;
pub mod spotlight;
pub mod tracker;
pub mod types;
