pub mod admin_episode;
pub mod catalog_item;
pub mod categories;
pub mod season;
pub mod user;

pub use admin_episode::AdminAppendedEpisode;
pub use catalog_item::{CatalogItem, CatalogKind, CatalogVariant};
pub use categories::Categories;
pub use season::{Episode, Season};
pub use user::UserRecord;
