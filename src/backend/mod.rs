// src/backend/mod.rs
//
// Fills an inline frame area. `native` embeds the URL in a frame; `paged`
// loads the rendering library once, then draws pages onto a canvas. Any
// failure on the paged path ends in the native embed.

pub mod engine;
pub mod loader;
pub mod paged;

pub use engine::{PageHandle, PdfEngine, ViewerId, Viewport};
pub use loader::{Admission, LibraryLoader};
pub use paged::{PageAction, PagedViewer};

use crate::components::paged_toolbar::{ACTION_ATTR, CANVAS_CLASS};
use crate::components::{PagedToolbarProps, Widget};
use crate::config::Backend;
use crate::error::BackendError;
use crate::host::{Host, NodeId};
use crate::markup;
use crate::utils::filename_from_url;
use log::{debug, info, warn};
use std::collections::BTreeMap;

pub fn render_native<H: Host + ?Sized>(host: &mut H, container: NodeId, url: &str) {
    let embed = markup::native_embed(url, &filename_from_url(url));
    host.set_inner_markup(container, &embed);
}

fn toolbar(viewer: &PagedViewer) -> Widget {
    Widget::PagedToolbar(PagedToolbarProps {
        page: viewer.page(),
        total_pages: viewer.total_pages(),
    })
}

pub struct Backends<E: PdfEngine> {
    engine: E,
    loader: LibraryLoader<ViewerId>,
    viewers: BTreeMap<ViewerId, PagedViewer>,
    next_viewer: u64,
}

impl<E: PdfEngine> Backends<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            loader: LibraryLoader::new(),
            viewers: BTreeMap::new(),
            next_viewer: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn viewer(&self, id: ViewerId) -> Option<&PagedViewer> {
        self.viewers.get(&id)
    }

    pub fn viewer_ids(&self) -> Vec<ViewerId> {
        self.viewers.keys().copied().collect()
    }

    /// Populate `frame_area` with `url` using `backend`.
    pub fn populate<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        frame_area: NodeId,
        url: &str,
        backend: Backend,
    ) {
        match backend {
            Backend::Native => render_native(host, frame_area, url),
            Backend::Paged => self.start_paged(frame_area, url),
        }
    }

    fn start_paged(&mut self, frame_area: NodeId, url: &str) {
        self.next_viewer += 1;
        let id = ViewerId(self.next_viewer);
        self.viewers.insert(id, PagedViewer::new(frame_area, url));

        match self.loader.subscribe(id) {
            Admission::Ready => self.engine.open_document(id, url),
            Admission::StartLoad => {
                info!("loading paged PDF renderer");
                self.engine.load_library();
            }
            Admission::Queued => debug!("viewer {:?} waiting for PDF renderer", id),
        }
    }

    pub fn library_loaded<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        result: Result<(), BackendError>,
    ) {
        let success = result.is_ok();
        if let Err(err) = &result {
            warn!("{}; falling back to native embed", err);
        }

        for id in self.loader.complete(success) {
            let Some(url) = self.viewers.get(&id).map(|v| v.url.clone()) else {
                continue;
            };
            if success {
                self.engine.open_document(id, &url);
            } else {
                self.fall_back(host, id);
            }
        }
    }

    pub fn document_opened<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        id: ViewerId,
        result: Result<u32, BackendError>,
    ) {
        let Some(viewer) = self.viewers.get_mut(&id) else {
            debug!("document for discarded viewer {:?} opened; closing", id);
            if result.is_ok() {
                self.engine.close_document(id);
            }
            return;
        };

        match result {
            Ok(0) => {
                warn!("document has no pages; falling back to native embed");
                self.engine.close_document(id);
                self.fall_back(host, id);
            }
            Ok(pages) => {
                viewer.opened(pages);
                host.mount(viewer.frame_area, toolbar(viewer));
                self.request_page(id);
            }
            Err(err) => {
                warn!("{}; falling back to native embed", err);
                self.fall_back(host, id);
            }
        }
    }

    fn request_page(&mut self, id: ViewerId) {
        if let Some(viewer) = self.viewers.get_mut(&id) {
            let ticket = viewer.next_ticket();
            let page = viewer.page();
            self.engine.fetch_page(id, ticket, page);
        }
    }

    pub fn page_ready<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        id: ViewerId,
        ticket: u64,
        result: Result<PageHandle, BackendError>,
    ) {
        // A viewer that is gone, or a ticket that was superseded, only
        // hands its page back.
        let current = self.viewers.get(&id).is_some_and(|v| v.is_current(ticket));
        if !current {
            debug!("dropping page render {} for {:?}", ticket, id);
            if let Ok(page) = result {
                self.engine.release_page(page);
            }
            return;
        }
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!("{}", err);
                return;
            }
        };
        let Some(viewer) = self.viewers.get_mut(&id) else {
            return;
        };

        // Toolbar first: the canvas must exist before it is sized.
        host.mount(viewer.frame_area, toolbar(viewer));
        let canvas_selector = format!(".{}", CANVAS_CLASS);
        let Some(canvas) = host.find(viewer.frame_area, &canvas_selector) else {
            warn!("paged viewer {:?} has no canvas", id);
            self.engine.release_page(page);
            return;
        };

        // Resizing clears the canvas, so it happens right before the draw.
        let drawn = self
            .engine
            .viewport(page, viewer.scale())
            .and_then(|viewport| {
                let width = (viewport.width.floor() as u32).to_string();
                let height = (viewport.height.floor() as u32).to_string();
                host.set_attribute(canvas, "width", &width);
                host.set_attribute(canvas, "height", &height);
                self.engine.draw(page, canvas, viewport)
            });
        if let Err(err) = drawn {
            warn!("{}", err);
        }

        if let Some(previous) = viewer.show(page) {
            self.engine.release_page(previous);
        }
    }

    /// Route a click to a paged toolbar. Returns true when it hit a control.
    pub fn handle_click<H: Host + ?Sized>(&mut self, host: &H, target: NodeId) -> bool {
        let hit = self
            .viewers
            .iter()
            .filter(|(_, viewer)| viewer.is_open())
            .find_map(|(id, viewer)| {
                PageAction::ALL.into_iter().find_map(|action| {
                    let selector = format!("[{}={}]", ACTION_ATTR, action.as_str());
                    let button = host.find(viewer.frame_area, &selector)?;
                    host.contains(button, target).then_some((*id, action))
                })
            });
        let Some((id, action)) = hit else {
            return false;
        };

        let changed = self
            .viewers
            .get_mut(&id)
            .map(|viewer| viewer.apply(action))
            .unwrap_or(false);
        if changed {
            self.request_page(id);
        }
        true
    }

    fn fall_back<H: Host + ?Sized>(&mut self, host: &mut H, id: ViewerId) {
        if let Some(mut viewer) = self.viewers.remove(&id) {
            if let Some(page) = viewer.take_shown() {
                self.engine.release_page(page);
            }
            render_native(host, viewer.frame_area, &viewer.url);
        }
    }

    /// Drop every viewer; the content they lived in is gone.
    pub fn forget_viewers(&mut self) {
        let viewers = std::mem::take(&mut self.viewers);
        for (id, mut viewer) in viewers {
            if let Some(page) = viewer.take_shown() {
                self.engine.release_page(page);
            }
            if viewer.is_open() {
                self.engine.close_document(id);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingEngine};
    use super::*;
    use crate::host::HeadlessHost;

    fn setup(frames: usize) -> (HeadlessHost, Vec<NodeId>, Backends<RecordingEngine>) {
        let markup: String = (0..frames)
            .map(|i| format!(r#"<div class="pdf-preview-frame-area" id="f{}"></div>"#, i))
            .collect();
        let host = HeadlessHost::new(&markup);
        let areas = (0..frames)
            .map(|i| host.query(&format!("#f{}", i)).unwrap())
            .collect();
        (host, areas, Backends::new(RecordingEngine::default()))
    }

    #[test]
    fn test_native_embed_has_frame_and_fallback() {
        let (mut host, areas, mut backends) = setup(1);
        backends.populate(&mut host, areas[0], "/docs/a.pdf", Backend::Native);
        let frame = host.find(areas[0], "iframe").unwrap();
        assert_eq!(host.attribute(frame, "src").as_deref(), Some("/docs/a.pdf"));
        let fallback = host.find(areas[0], ".pdf-preview-fallback").unwrap();
        assert!(host.find(fallback, "a[download=a.pdf]").is_some());
        assert!(backends.engine().calls.is_empty());
    }

    #[test]
    fn test_library_loaded_once_for_many_viewers() {
        let (mut host, areas, mut backends) = setup(3);
        for area in &areas {
            backends.populate(&mut host, *area, "/a.pdf", Backend::Paged);
        }
        assert_eq!(backends.engine().count(|c| *c == Call::LoadLibrary), 1);

        backends.library_loaded(&mut host, Ok(()));
        let opened: Vec<ViewerId> = backends
            .engine()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Open(id, _) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(opened, vec![ViewerId(1), ViewerId(2), ViewerId(3)]);

        // Later viewers open directly.
        backends.populate(&mut host, areas[0], "/b.pdf", Backend::Paged);
        assert_eq!(backends.engine().count(|c| *c == Call::LoadLibrary), 1);
        assert_eq!(
            backends.engine().calls.last(),
            Some(&Call::Open(ViewerId(4), "/b.pdf".to_string()))
        );
    }

    #[test]
    fn test_library_failure_falls_back_to_native() {
        let (mut host, areas, mut backends) = setup(2);
        backends.populate(&mut host, areas[0], "/a.pdf", Backend::Paged);
        backends.populate(&mut host, areas[1], "/b.pdf", Backend::Paged);
        backends.library_loaded(&mut host, Err(BackendError::LibraryUnavailable("offline".into())));

        for (area, url) in areas.iter().zip(["/a.pdf", "/b.pdf"]) {
            let frame = host.find(*area, "iframe").unwrap();
            assert_eq!(host.attribute(frame, "src").as_deref(), Some(url));
        }
        assert!(backends.viewer_ids().is_empty());
    }

    #[test]
    fn test_document_open_failure_falls_back_to_native() {
        let (mut host, areas, mut backends) = setup(1);
        backends.populate(&mut host, areas[0], "/a.pdf", Backend::Paged);
        backends.library_loaded(&mut host, Ok(()));
        backends.document_opened(
            &mut host,
            ViewerId(1),
            Err(BackendError::DocumentOpen("corrupt".into())),
        );

        let frame = host.find(areas[0], "iframe.pdf-preview-frame").unwrap();
        assert_eq!(host.attribute(frame, "src").as_deref(), Some("/a.pdf"));
        assert!(host.find(areas[0], "canvas").is_none());
    }

    fn open_viewer(pages: u32) -> (HeadlessHost, NodeId, Backends<RecordingEngine>) {
        let (mut host, areas, mut backends) = setup(1);
        backends.populate(&mut host, areas[0], "/a.pdf", Backend::Paged);
        backends.library_loaded(&mut host, Ok(()));
        backends.document_opened(&mut host, ViewerId(1), Ok(pages));
        (host, areas[0], backends)
    }

    #[test]
    fn test_opened_viewer_renders_first_page() {
        let (mut host, area, mut backends) = open_viewer(3);
        assert_eq!(
            backends.engine().calls.last(),
            Some(&Call::Fetch(ViewerId(1), 1, 1))
        );
        backends.page_ready(&mut host, ViewerId(1), 1, Ok(PageHandle(10)));

        let canvas = host.find(area, "canvas").unwrap();
        assert_eq!(host.attribute(canvas, "width").as_deref(), Some("600"));
        assert_eq!(host.attribute(canvas, "height").as_deref(), Some("800"));
        assert_eq!(host.attribute(canvas, "aria-label").as_deref(), Some("PDF page 1 of 3"));
        let info = host.find(area, ".pdf-paged-page-info").unwrap();
        assert_eq!(host.text(info), "Page 1 / 3");

        let prev = host.find(area, ".pdf-paged-prev").unwrap();
        let next = host.find(area, ".pdf-paged-next").unwrap();
        assert!(host.attribute(prev, "disabled").is_some());
        assert!(host.attribute(next, "disabled").is_none());

        let toolbar = host.find(area, "[role=toolbar]").unwrap();
        assert_eq!(
            host.attribute(toolbar, "aria-label").as_deref(),
            Some("PDF navigation controls")
        );
    }

    #[test]
    fn test_stale_page_does_not_override_newer_navigation() {
        let (mut host, area, mut backends) = open_viewer(5);
        backends.page_ready(&mut host, ViewerId(1), 1, Ok(PageHandle(1)));

        let next = host.find(area, ".pdf-paged-next").unwrap();
        assert!(backends.handle_click(&host, next));
        assert!(backends.handle_click(&host, next));
        assert_eq!(backends.viewer(ViewerId(1)).unwrap().page(), 3);

        // Page 3 (ticket 3) resolves before page 2 (ticket 2).
        backends.page_ready(&mut host, ViewerId(1), 3, Ok(PageHandle(3)));
        backends.page_ready(&mut host, ViewerId(1), 2, Ok(PageHandle(2)));

        let info = host.find(area, ".pdf-paged-page-info").unwrap();
        assert_eq!(host.text(info), "Page 3 / 5");
        let draws: Vec<PageHandle> = backends
            .engine()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(page, _, _) => Some(*page),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![PageHandle(1), PageHandle(3)]);
        assert!(backends.engine().calls.contains(&Call::Release(PageHandle(2))));
        assert!(backends.engine().calls.contains(&Call::Release(PageHandle(1))));
    }

    #[test]
    fn test_zoom_rerenders_at_new_scale() {
        let (mut host, area, mut backends) = open_viewer(1);
        backends.page_ready(&mut host, ViewerId(1), 1, Ok(PageHandle(1)));

        let zoom_in = host.find(area, ".pdf-paged-zoom-in").unwrap();
        assert!(backends.handle_click(&host, zoom_in));
        assert_eq!(
            backends.engine().calls.last(),
            Some(&Call::Fetch(ViewerId(1), 2, 1))
        );
        backends.page_ready(&mut host, ViewerId(1), 2, Ok(PageHandle(2)));
        let canvas = host.find(area, "canvas").unwrap();
        assert_eq!(host.attribute(canvas, "width").as_deref(), Some("750"));
    }

    #[test]
    fn test_click_outside_toolbar_is_ignored() {
        let (host, area, mut backends) = open_viewer(2);
        assert!(!backends.handle_click(&host, area));
    }

    #[test]
    fn test_zero_page_document_falls_back() {
        let (host, area, backends) = open_viewer(0);
        let frame = host.find(area, "iframe.pdf-preview-frame").unwrap();
        assert_eq!(host.attribute(frame, "src").as_deref(), Some("/a.pdf"));
        assert!(host.find(area, "canvas").is_none());
        assert!(backends.engine().calls.contains(&Call::Close(ViewerId(1))));
        assert!(backends.viewer_ids().is_empty());
    }

    #[test]
    fn test_page_error_keeps_viewer() {
        let (mut host, area, mut backends) = open_viewer(3);
        backends.page_ready(&mut host, ViewerId(1), 1, Ok(PageHandle(1)));
        let next = host.find(area, ".pdf-paged-next").unwrap();
        assert!(backends.handle_click(&host, next));

        let failure = BackendError::PageRender {
            page: 2,
            reason: "bad xref".into(),
        };
        backends.page_ready(&mut host, ViewerId(1), 2, Err(failure));

        let info = host.find(area, ".pdf-paged-page-info").unwrap();
        assert_eq!(host.text(info), "Page 1 / 3");
        assert!(host.find(area, "canvas").is_some());
        assert!(host.find(area, "iframe").is_none());
        assert_eq!(backends.viewer_ids(), vec![ViewerId(1)]);
        assert!(!backends.engine().calls.contains(&Call::Release(PageHandle(1))));
    }

    #[test]
    fn test_late_document_for_forgotten_viewer_is_closed() {
        let (mut host, areas, mut backends) = setup(1);
        backends.populate(&mut host, areas[0], "/a.pdf", Backend::Paged);
        backends.library_loaded(&mut host, Ok(()));
        backends.forget_viewers();

        backends.document_opened(&mut host, ViewerId(1), Ok(4));
        assert_eq!(backends.engine().calls.last(), Some(&Call::Close(ViewerId(1))));
        assert!(host.find(areas[0], "canvas").is_none());
        assert_eq!(backends.engine().count(|c| matches!(c, Call::Fetch(..))), 0);
    }

    #[test]
    fn test_results_for_forgotten_viewers_are_released() {
        let (mut host, _area, mut backends) = open_viewer(2);
        backends.forget_viewers();
        assert!(backends.engine().calls.contains(&Call::Close(ViewerId(1))));
        backends.page_ready(&mut host, ViewerId(1), 1, Ok(PageHandle(9)));
        assert_eq!(backends.engine().calls.last(), Some(&Call::Release(PageHandle(9))));
    }
}
