//! Class rebalancing for the training partition.
pub mod smote;

pub use smote::{apply_smote, Smote};
