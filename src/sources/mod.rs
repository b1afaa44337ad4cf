pub mod arxiv;
pub mod scopus;

pub use arxiv::ArxivSource;
pub use scopus::ScopusSource;
