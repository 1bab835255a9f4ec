pub mod ground;
pub mod init_index;
pub mod partial;
pub mod universe;

pub use ground::{ground_action, ground_full};
pub use partial::ground_partial;
