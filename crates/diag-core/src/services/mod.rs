pub mod config_loader;
pub mod dns;
pub mod exhibitor;
pub mod finder;
pub mod providers;

pub use dns::DnsFinder;
pub use exhibitor::ExhibitorFinder;
pub use finder::{FinderChain, NodeFinder};
pub use providers::{load_providers, ClusterTools};
