//! Configuration module

mod site;

pub use site::HighlightConfig;
pub use site::ImagesConfig;
pub use site::MdxConfig;
pub use site::SiteConfig;
