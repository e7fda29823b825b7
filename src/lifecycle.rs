// src/lifecycle.rs
//
// Installation against the host application's hook registry.

use crate::backend::PdfEngine;
use crate::host::Host;
use crate::previewer::{Msg, Previewer};
use crate::styles::{PLUGIN_CSS, STYLE_ID};
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;

/// Hooks exposed by the host application.
pub trait Lifecycle {
    /// Runs before each render with the raw markdown; returns what is rendered.
    fn before_each(&mut self, hook: Box<dyn FnMut(String) -> String>);
    /// Runs after each content update.
    fn done_each(&mut self, hook: Box<dyn FnMut()>);
    /// Runs once after the initial mount.
    fn mounted(&mut self, hook: Box<dyn FnMut()>);
}

pub type RouteProvider = Rc<dyn Fn() -> String>;

/// Register the plugin. Returns false, installing nothing, when disabled.
pub fn install<L, H, E>(
    lifecycle: &mut L,
    previewer: Rc<RefCell<Previewer<H, E>>>,
    route: RouteProvider,
) -> bool
where
    L: Lifecycle + ?Sized,
    H: Host + 'static,
    E: PdfEngine + 'static,
{
    {
        let Ok(mut p) = previewer.try_borrow_mut() else {
            warn!("previewer busy during install");
            return false;
        };
        if !p.config().enabled {
            info!("PDF preview disabled");
            return false;
        }
        p.host_mut().inject_styles(STYLE_ID, PLUGIN_CSS);
    }

    let before = Rc::clone(&previewer);
    lifecycle.before_each(Box::new(move |markdown| match before.try_borrow_mut() {
        Ok(mut p) => p.before_render(&markdown),
        Err(_) => {
            warn!("previewer busy; rendering markdown unchanged");
            markdown
        }
    }));

    let done = Rc::clone(&previewer);
    let done_route = Rc::clone(&route);
    lifecycle.done_each(Box::new(move || {
        dispatch(&done, Msg::ContentRendered { route: done_route() });
    }));

    let mounted = Rc::clone(&previewer);
    lifecycle.mounted(Box::new(move || {
        dispatch(&mounted, Msg::Mounted { route: route() });
    }));

    info!("PDF preview installed");
    true
}

fn dispatch<H: Host, E: PdfEngine>(previewer: &Rc<RefCell<Previewer<H, E>>>, msg: Msg) {
    match previewer.try_borrow_mut() {
        Ok(mut p) => {
            p.update(msg);
        }
        Err(_) => warn!("previewer busy; dropping lifecycle event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::RecordingEngine;
    use crate::config::PreviewConfig;
    use crate::host::HeadlessHost;

    #[derive(Default)]
    struct RecordingLifecycle {
        before_each: Vec<Box<dyn FnMut(String) -> String>>,
        done_each: Vec<Box<dyn FnMut()>>,
        mounted: Vec<Box<dyn FnMut()>>,
    }

    impl Lifecycle for RecordingLifecycle {
        fn before_each(&mut self, hook: Box<dyn FnMut(String) -> String>) {
            self.before_each.push(hook);
        }

        fn done_each(&mut self, hook: Box<dyn FnMut()>) {
            self.done_each.push(hook);
        }

        fn mounted(&mut self, hook: Box<dyn FnMut()>) {
            self.mounted.push(hook);
        }
    }

    type Shared = Rc<RefCell<Previewer<HeadlessHost, RecordingEngine>>>;

    fn shared(content: &str, config: PreviewConfig) -> Shared {
        Rc::new(RefCell::new(Previewer::new(
            config,
            "",
            HeadlessHost::new(content),
            RecordingEngine::default(),
        )))
    }

    fn root_route() -> RouteProvider {
        Rc::new(|| "/".to_string())
    }

    #[test]
    fn test_disabled_installs_nothing() {
        let previewer = shared(
            r#"<a href="a.pdf">A</a>"#,
            PreviewConfig {
                enabled: false,
                ..PreviewConfig::default()
            },
        );
        let mut lifecycle = RecordingLifecycle::default();
        assert!(!install(&mut lifecycle, Rc::clone(&previewer), root_route()));
        assert!(lifecycle.done_each.is_empty());
        assert!(lifecycle.mounted.is_empty());
        assert!(lifecycle.before_each.is_empty());
        assert!(previewer.borrow().host().stylesheets().is_empty());
    }

    #[test]
    fn test_hooks_drive_the_pipeline() {
        let previewer = shared(r#"<p><a href="a.pdf">A</a></p>"#, PreviewConfig::default());
        let mut lifecycle = RecordingLifecycle::default();
        assert!(install(&mut lifecycle, Rc::clone(&previewer), root_route()));
        assert_eq!(previewer.borrow().host().stylesheets(), &[STYLE_ID.to_string()]);

        (lifecycle.mounted[0])();
        assert!(previewer.borrow().host().query(".pdf-preview-inline").is_some());

        let out = (lifecycle.before_each[0])("[A](a.pdf ':pdf-preview mode=modal')".to_string());
        assert_eq!(out, "[A](a.pdf?__pdfOpts=mode%3Dmodal)");

        previewer
            .borrow_mut()
            .host_mut()
            .set_content(r#"<p><a href="a.pdf?__pdfOpts=mode%3Dmodal">A</a></p>"#);
        (lifecycle.done_each[0])();
        assert!(previewer.borrow().host().query(".pdf-preview-modal-btn").is_some());
    }

    #[test]
    fn test_styles_injected_once() {
        let previewer = shared("", PreviewConfig::default());
        let mut lifecycle = RecordingLifecycle::default();
        install(&mut lifecycle, Rc::clone(&previewer), root_route());
        install(&mut lifecycle, Rc::clone(&previewer), root_route());
        assert_eq!(previewer.borrow().host().stylesheets().len(), 1);
    }
}
