//! Artifact formats understood by the filesystem store.

mod ensemble;
mod preprocessor;
mod shap;

pub use ensemble::{EnsembleError, Tree, TreeEnsemble, TreeNode};
pub use preprocessor::{ColumnPreprocessor, ColumnSpec};
pub use shap::TreeShapExplainer;
