pub mod config;
pub mod error;
pub mod isbn;
pub mod lookup;
pub mod reading;
pub mod record;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::isbn::{normalize, CanonicalIsbn};
    pub use crate::lookup::{MetadataResolver, MetadataSource};
    pub use crate::record::BookRecord;
}
