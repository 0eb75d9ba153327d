//
//  mod.rs
//  Archlint
//
//  Created by hak (tharun)
//

pub mod extractor;
pub mod language;

pub use extractor::{extract_imports, RawImport};
pub use language::SupportedLanguage;
