pub mod node;
pub mod scene;

pub use node::Node;
pub use scene::{NodeHandle, Scene};
