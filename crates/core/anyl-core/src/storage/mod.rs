pub mod lock;
pub mod registry;
pub mod store;

pub use registry::GameRegistry;
pub use store::RegistryStore;
