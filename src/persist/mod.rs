//! Persistence - snapshots, versioned save files and cross-state
//! reference translation

pub mod save;
pub mod snapshot;
pub mod translate;

pub use save::{read_save, write_save, PersistError, SAVE_VERSION};
pub use snapshot::{clone_state, SnapshotScope};
pub use translate::{Translate, TranslateError, Translator};
