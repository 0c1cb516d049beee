//! Strategy adapters.

mod cloud;
mod flat;
mod local_ocr;
mod native;

pub use cloud::{CloudVisionStrategy, DocumentIntelligenceStrategy};
pub use flat::{docx_text, FlatTextStrategy};
pub use local_ocr::LocalOcrStrategy;
pub use native::NativeTextStrategy;
