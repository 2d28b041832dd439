pub mod anchor;
pub mod board;
pub mod bubble;
pub mod cluster;
pub mod color;
pub mod interaction;
pub mod store;
pub mod text;
pub mod utils;
pub mod viewport;
