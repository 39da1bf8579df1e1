mod application;
pub mod data;
mod runtime_config;
mod tree_view;

pub use application::{Application, ApplicationError};
pub use runtime_config::RuntimeConfig;
pub use tree_view::{render_tree, stdout_supports_color};
