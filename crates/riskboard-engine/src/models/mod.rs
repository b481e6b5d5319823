pub mod boosting;
pub mod classifier_trait;
pub mod factory;
pub mod knn;
pub mod logistic;
pub mod svc;
pub mod tree;
pub mod utils;

pub use classifier_trait::{Capabilities, Capability, Classifier};
