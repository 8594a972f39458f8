pub mod catalog;
pub mod chat;
pub mod config;
pub mod context;
pub mod deck;
pub mod editor;
pub mod events;
pub mod likes;

pub use catalog::{CatalogFilters, ProfileCatalog};
pub use chat::ChatLedger;
pub use config::AppConfig;
pub use context::SessionContext;
pub use deck::{DeckPhase, SwipeDeck};
pub use editor::ProfileEditor;
pub use events::{EventBus, SessionEvent};
pub use likes::LikeCounter;
