mod crawler;
mod offsite;

pub use crawler::Crawler;
pub use offsite::url_is_in_domains;
