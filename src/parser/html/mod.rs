mod link_extractor;

pub use link_extractor::LinkExtractor;
