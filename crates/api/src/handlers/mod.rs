pub mod documents;
pub mod propagation;
pub mod public;
