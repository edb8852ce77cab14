pub mod html;

pub use html::LinkExtractor;
