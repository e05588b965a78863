pub mod bridge;
pub mod change;
pub mod game;
pub mod history;
pub mod lock;
pub mod player;
pub mod territory;
pub mod unit;

pub use bridge::DelegateBridge;
pub use change::{Change, ChangeError, ChangeLog};
pub use game::{DelegateState, GameState, PropertyValue, Route};
pub use history::HistoryWriter;
pub use lock::GameLock;
