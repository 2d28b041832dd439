pub mod feedback;
pub mod frontend;
