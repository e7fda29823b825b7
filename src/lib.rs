// src/lib.rs
//
// PDF link previews for docsify sites: inline viewers, a shared modal and an
// optional paged canvas renderer.

pub mod backend;
pub mod components;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod markup;
pub mod modal;
pub mod options;
pub mod previewer;
pub mod renderer;
pub mod scanner;
pub mod styles;
pub mod utils;

#[cfg(target_arch = "wasm32")]
mod web;

pub use backend::{Backends, PdfEngine};
pub use config::{Backend, Mode, PreviewConfig};
pub use error::{BackendError, Error};
pub use host::{HeadlessHost, Host, KeyPress, NodeId};
pub use lifecycle::{install, Lifecycle};
pub use options::LinkOptions;
pub use previewer::{Msg, Previewer};
pub use scanner::{scan_pdf_links, LinkDescriptor};
