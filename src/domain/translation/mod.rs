//! Translation module.
//!
//! All user-facing text of a DDT lives in a flat table addressed by
//! deterministically shaped keys; the DDT tree itself holds only keys.

mod key;
mod table;

pub use key::{ParsedKey, TranslationKey};
pub use table::{TranslationError, TranslationTable};
