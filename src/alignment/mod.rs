pub mod confidence;
pub mod consensus;
pub mod formatting;
pub mod needleman_wunsch;
pub mod progressive;
pub mod report;
pub mod sections;
pub mod similarity;
pub mod tokenization;
