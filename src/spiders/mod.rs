pub mod contents;

pub use contents::ContentsSpider;
