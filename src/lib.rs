pub mod board_utils;
pub mod gui;
pub mod persistence;
pub mod physics;
