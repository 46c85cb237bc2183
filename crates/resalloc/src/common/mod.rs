pub mod error;
pub mod ids;
#[macro_use]
pub mod index;
pub mod wrapped;

pub type Map<K, V> = hashbrown::HashMap<K, V, fxhash::FxBuildHasher>;
pub type Set<T> = hashbrown::HashSet<T, fxhash::FxBuildHasher>;

pub use wrapped::WrappedRcRefCell;
