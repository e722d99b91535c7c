pub mod op;
pub mod tree;

// Re-exports
pub use {
    op::{BlendOpSet, LinearBlend, NearestBlend, SphericalBlend},
    tree::{BlendNode, BlendTree},
};
