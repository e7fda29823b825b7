// src/previewer.rs
use crate::backend::{Backends, PageHandle, PdfEngine, ViewerId};
use crate::config::PreviewConfig;
use crate::error::BackendError;
use crate::host::{Host, KeyPress, NodeId};
use crate::modal::Modal;
use crate::options::encode_options_in_markdown;
use crate::renderer::process_link;
use crate::scanner::{scan_pdf_links, LinkDescriptor};
use log::debug;

pub enum Msg {
    /// Initial mount of the host application.
    Mounted { route: String },
    /// The content area was re-rendered for `route`.
    ContentRendered { route: String },
    Click(NodeId),
    KeyDown(KeyPress),
    PopState,
    FocusTimer(u64),
    LibraryLoaded(Result<(), BackendError>),
    DocumentOpened {
        viewer: ViewerId,
        result: Result<u32, BackendError>,
    },
    PageReady {
        viewer: ViewerId,
        ticket: u64,
        result: Result<PageHandle, BackendError>,
    },
}

/// A control that opens the shared modal for one link.
#[derive(Debug)]
struct ModalBinding {
    control: NodeId,
    info: LinkDescriptor,
    config: PreviewConfig,
}

/// Everything the plugin keeps for one page session.
pub struct Previewer<H: Host, E: PdfEngine> {
    config: PreviewConfig,
    base_path: String,
    host: H,
    backends: Backends<E>,
    modal: Modal,
    bindings: Vec<ModalBinding>,
}

impl<H: Host, E: PdfEngine> Previewer<H, E> {
    pub fn new(config: PreviewConfig, base_path: &str, host: H, engine: E) -> Self {
        Self {
            config,
            base_path: base_path.to_string(),
            host,
            backends: Backends::new(engine),
            modal: Modal::new(),
            bindings: Vec::new(),
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn backends(&self) -> &Backends<E> {
        &self.backends
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// Pre-render hook: the old content is about to be replaced.
    pub fn before_render(&mut self, markdown: &str) -> String {
        self.modal.close(&mut self.host);
        self.backends.forget_viewers();
        self.bindings.clear();
        encode_options_in_markdown(markdown)
    }

    /// Scan the current content and render every new PDF link. Returns the
    /// number of links processed.
    pub fn process_links(&mut self, route: &str) -> usize {
        // Whatever the previous render left behind is detached by now.
        self.host.release_detached();

        let links = scan_pdf_links(&self.host, &self.config, &self.base_path, route);
        for info in &links {
            let (config, placement) =
                process_link(&mut self.host, &mut self.backends, info, &self.config);
            if let Some(control) = placement.modal_control() {
                self.bindings.push(ModalBinding {
                    control,
                    info: info.clone(),
                    config,
                });
            }
        }
        if !links.is_empty() {
            debug!("processed {} PDF links on {}", links.len(), route);
        }
        links.len()
    }

    /// Returns true when the event's default action must be prevented.
    pub fn update(&mut self, msg: Msg) -> bool {
        match msg {
            Msg::Mounted { route } | Msg::ContentRendered { route } => {
                self.process_links(&route);
                false
            }
            Msg::Click(target) => {
                self.click(target);
                false
            }
            Msg::KeyDown(key) => self.modal.handle_key(&mut self.host, &key),
            Msg::PopState => {
                self.modal.location_changed(&mut self.host);
                false
            }
            Msg::FocusTimer(token) => {
                self.modal.focus_timer_elapsed(&mut self.host, token);
                false
            }
            Msg::LibraryLoaded(result) => {
                self.backends.library_loaded(&mut self.host, result);
                false
            }
            Msg::DocumentOpened { viewer, result } => {
                self.backends.document_opened(&mut self.host, viewer, result);
                false
            }
            Msg::PageReady { viewer, ticket, result } => {
                self.backends.page_ready(&mut self.host, viewer, ticket, result);
                false
            }
        }
    }

    fn click(&mut self, target: NodeId) {
        if self.modal.handle_click(&mut self.host, target) {
            return;
        }
        if self.backends.handle_click(&self.host, target) {
            return;
        }
        let host = &self.host;
        let hit = self.bindings.iter().find(|b| host.contains(b.control, target));
        let Some(binding) = hit else {
            return;
        };
        let trigger = Some(binding.control);
        self.modal
            .open(&mut self.host, &binding.info, &binding.config, trigger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{Call, RecordingEngine};
    use crate::config::Mode;
    use crate::host::HeadlessHost;

    type TestPreviewer = Previewer<HeadlessHost, RecordingEngine>;

    fn previewer(content: &str, config: PreviewConfig) -> TestPreviewer {
        let host = HeadlessHost::new(content);
        Previewer::new(config, "/docs", host, RecordingEngine::default())
    }

    fn page_ready(ticket: u64, page: u64) -> Msg {
        Msg::PageReady {
            viewer: ViewerId(1),
            ticket,
            result: Ok(PageHandle(page)),
        }
    }

    fn modal_config() -> PreviewConfig {
        PreviewConfig {
            mode: Mode::Modal,
            route_param: Some("pdf".to_string()),
            ..PreviewConfig::default()
        }
    }

    #[test]
    fn test_rendering_twice_processes_nothing_new() {
        let mut p = previewer(
            r#"<p><a href="a.pdf">A</a> <a href="b.pdf">B</a></p>"#,
            PreviewConfig::default(),
        );
        assert_eq!(p.process_links("/"), 2);
        assert_eq!(p.process_links("/"), 0);
    }

    #[test]
    fn test_trigger_click_opens_modal_and_close_restores_focus() {
        let mut p = previewer(r#"<p><a href="guide/a.pdf">A</a></p>"#, modal_config());
        p.update(Msg::Mounted { route: "/".to_string() });
        let trigger = p.host().query(".pdf-preview-modal-btn").unwrap();

        p.update(Msg::Click(trigger));
        assert!(p.modal().is_open());
        assert_eq!(p.host().location_hash(), "#/?pdf=%2Fdocs%2Fguide%2Fa.pdf");
        let frame = p.host().query("#pdf-preview-modal-frame").unwrap();
        assert_eq!(p.host().attribute(frame, "src").as_deref(), Some("/docs/guide/a.pdf"));

        let timers = p.host_mut().take_timers();
        p.update(Msg::FocusTimer(timers[0].1));
        assert_eq!(p.host().active_element(), p.host().query("#pdf-modal-close-btn"));

        assert!(!p.update(Msg::KeyDown(KeyPress::new("Escape"))));
        assert!(!p.modal().is_open());
        assert_eq!(p.host().active_element(), Some(trigger));
        assert_eq!(p.host().location_hash(), "#/");
    }

    #[test]
    fn test_expand_button_opens_modal() {
        let mut p = previewer(r#"<p><a href="a.pdf">A</a></p>"#, PreviewConfig::default());
        p.update(Msg::ContentRendered { route: "/".to_string() });
        let expand = p.host().query(".pdf-inline-expand-btn").unwrap();
        p.update(Msg::Click(expand));
        assert!(p.modal().is_open());
        assert_eq!(p.modal().trigger(), Some(expand));
    }

    #[test]
    fn test_tab_in_open_modal_prevents_default() {
        let mut p = previewer(r#"<p><a href="a.pdf">A</a></p>"#, modal_config());
        p.update(Msg::Mounted { route: "/".to_string() });
        assert!(!p.update(Msg::KeyDown(KeyPress::new("Tab"))));

        let trigger = p.host().query(".pdf-preview-modal-btn").unwrap();
        p.update(Msg::Click(trigger));
        assert!(p.update(Msg::KeyDown(KeyPress::new("Tab"))));
    }

    #[test]
    fn test_popstate_without_param_closes_modal() {
        let mut p = previewer(r#"<p><a href="a.pdf">A</a></p>"#, modal_config());
        p.update(Msg::Mounted { route: "/".to_string() });
        let trigger = p.host().query(".pdf-preview-modal-btn").unwrap();
        p.update(Msg::Click(trigger));

        p.host_mut().set_hash("#/");
        p.update(Msg::PopState);
        assert!(!p.modal().is_open());
    }

    #[test]
    fn test_route_change_closes_modal_and_encodes_options() {
        let mut p = previewer(r#"<p><a href="a.pdf">A</a></p>"#, modal_config());
        p.update(Msg::Mounted { route: "/".to_string() });
        let trigger = p.host().query(".pdf-preview-modal-btn").unwrap();
        p.update(Msg::Click(trigger));

        let markdown = p.before_render(r#"[Manual](manual.pdf ':pdf-preview mode=inline')"#);
        assert!(!p.modal().is_open());
        assert_eq!(markdown, "[Manual](manual.pdf?__pdfOpts=mode%3Dinline)");

        // Old controls no longer open anything.
        p.host_mut().set_content("<p>next page</p>");
        p.update(Msg::Click(trigger));
        assert!(!p.modal().is_open());
    }

    #[test]
    fn test_paged_fallback_through_messages() {
        let config = PreviewConfig {
            backend: crate::config::Backend::Paged,
            ..PreviewConfig::default()
        };
        let mut p = previewer(r#"<p><a href="a.pdf">A</a></p>"#, config);
        p.update(Msg::Mounted { route: "/".to_string() });
        assert_eq!(p.backends().engine().calls, vec![Call::LoadLibrary]);

        p.update(Msg::LibraryLoaded(Ok(())));
        p.update(Msg::DocumentOpened {
            viewer: ViewerId(1),
            result: Err(BackendError::DocumentOpen("404".to_string())),
        });
        let frame = p.host().query("iframe.pdf-preview-frame").unwrap();
        assert_eq!(p.host().attribute(frame, "src").as_deref(), Some("/docs/a.pdf"));
    }

    #[test]
    fn test_paged_navigation_through_messages() {
        let config = PreviewConfig {
            backend: crate::config::Backend::Paged,
            ..PreviewConfig::default()
        };
        let mut p = previewer(r#"<p><a href="a.pdf">A</a></p>"#, config);
        p.update(Msg::Mounted { route: "/".to_string() });
        p.update(Msg::LibraryLoaded(Ok(())));
        p.update(Msg::DocumentOpened {
            viewer: ViewerId(1),
            result: Ok(2),
        });
        p.update(page_ready(1, 1));

        let next = p.host().query(".pdf-paged-next").unwrap();
        p.update(Msg::Click(next));
        p.update(page_ready(2, 2));

        let info = p.host().query(".pdf-paged-page-info").unwrap();
        assert_eq!(p.host().text(info), "Page 2 / 2");
        assert!(!p.modal().is_open());
    }
}
