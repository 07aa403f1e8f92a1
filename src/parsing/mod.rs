pub mod section;
pub mod text;
pub mod xbrl;

pub use section::{SectionName, TextSubsection};
pub use xbrl::{Fact, FactExtraction, FactValue};
