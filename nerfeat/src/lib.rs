pub mod corpus;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod features;
pub mod label;
pub mod locations;
pub mod vocabulary;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn get_version() -> &'static str {
    VERSION
}
