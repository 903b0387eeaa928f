pub mod error;
pub mod starship;
pub mod validation;

pub use error::{Result, StoreError};
pub use starship::{Starship, StarshipDraft, StarshipId, is_web_url};
pub use validation::ValidationErrors;
