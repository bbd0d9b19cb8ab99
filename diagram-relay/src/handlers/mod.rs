pub mod generate;
pub mod health;
pub mod metrics;
pub mod root;

pub use generate::generate;
pub use health::health_check;
pub use root::{preflight, root};
