// src/backend/engine.rs
use crate::error::BackendError;
use crate::host::NodeId;

/// Identifies one paged viewer for the lifetime of the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub u64);

/// A fetched page, owned by the engine until released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// The paginated rendering library.
///
/// The three request methods are asynchronous: each completes by delivering
/// exactly one message back to the previewer (`Msg::LibraryLoaded`,
/// `Msg::DocumentOpened`, `Msg::PageReady`). They must never call back
/// synchronously.
pub trait PdfEngine {
    /// Start fetching the library. Called at most once per load attempt.
    fn load_library(&mut self);

    /// Open `url` for `viewer`; completes with the page count.
    fn open_document(&mut self, viewer: ViewerId, url: &str);

    /// Fetch page `page` (1-based) of the viewer's document.
    fn fetch_page(&mut self, viewer: ViewerId, ticket: u64, page: u32);

    fn viewport(&self, page: PageHandle, scale: f64) -> Result<Viewport, BackendError>;

    /// Draw `page` into `canvas`, replacing whatever was drawn before.
    fn draw(
        &mut self,
        page: PageHandle,
        canvas: NodeId,
        viewport: Viewport,
    ) -> Result<(), BackendError>;

    fn release_page(&mut self, page: PageHandle);

    fn close_document(&mut self, viewer: ViewerId);
}
