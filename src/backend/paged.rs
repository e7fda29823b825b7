// src/backend/paged.rs
use super::engine::PageHandle;
use crate::host::NodeId;

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;
pub const ZOOM_STEP: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Prev,
    Next,
    ZoomIn,
    ZoomOut,
}

impl PageAction {
    pub const ALL: [PageAction; 4] = [
        PageAction::Prev,
        PageAction::Next,
        PageAction::ZoomIn,
        PageAction::ZoomOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageAction::Prev => "prev",
            PageAction::Next => "next",
            PageAction::ZoomIn => "zoom-in",
            PageAction::ZoomOut => "zoom-out",
        }
    }
}

/// State of one canvas viewer.
///
/// Every page request takes a fresh ticket. Only a result carrying the
/// latest ticket may be drawn, so a slow fetch for an older page can never
/// replace the page the reader navigated to last.
#[derive(Debug)]
pub struct PagedViewer {
    pub frame_area: NodeId,
    pub url: String,
    opened: bool,
    page: u32,
    total_pages: u32,
    scale: f64,
    latest_ticket: u64,
    shown: Option<PageHandle>,
}

impl PagedViewer {
    pub fn new(frame_area: NodeId, url: &str) -> Self {
        Self {
            frame_area,
            url: url.to_string(),
            opened: false,
            page: 1,
            total_pages: 0,
            scale: 1.0,
            latest_ticket: 0,
            shown: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn opened(&mut self, total_pages: u32) {
        self.total_pages = total_pages;
        self.page = 1;
        self.opened = true;
    }

    /// Apply a toolbar action. Returns true when the page or zoom changed
    /// and a new render is needed.
    pub fn apply(&mut self, action: PageAction) -> bool {
        match action {
            PageAction::Prev if self.page > 1 => {
                self.page -= 1;
                true
            }
            PageAction::Next if self.page < self.total_pages => {
                self.page += 1;
                true
            }
            PageAction::ZoomIn => self.set_scale(self.scale + ZOOM_STEP),
            PageAction::ZoomOut => self.set_scale(self.scale - ZOOM_STEP),
            _ => false,
        }
    }

    fn set_scale(&mut self, scale: f64) -> bool {
        let clamped = scale.clamp(MIN_ZOOM, MAX_ZOOM);
        if (clamped - self.scale).abs() < f64::EPSILON {
            return false;
        }
        self.scale = clamped;
        true
    }

    pub fn next_ticket(&mut self) -> u64 {
        self.latest_ticket += 1;
        self.latest_ticket
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest_ticket
    }

    /// Record the page now on the canvas, returning the one it replaced.
    pub fn show(&mut self, page: PageHandle) -> Option<PageHandle> {
        self.shown.replace(page).filter(|previous| *previous != page)
    }

    pub fn take_shown(&mut self) -> Option<PageHandle> {
        self.shown.take()
    }

    pub fn can_go_back(&self) -> bool {
        self.page > 1
    }

    pub fn can_go_forward(&self) -> bool {
        self.page < self.total_pages
    }
}
