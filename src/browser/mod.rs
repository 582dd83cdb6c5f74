//! Chrome binding for the capture engine
//!
//! - config: launch and connection options
//! - session: browser process and tab management
//! - page: [`crate::dom::Page`] implementation over a tab

pub mod config;
pub mod page;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use page::CdpPage;
pub use session::{BrowserSession, normalize_url};
