// src/web/mod.rs
//
// Browser entry point: registers the plugin with docsify and forwards DOM
// events into the previewer.

mod docsify;
mod host;
mod pdfjs;

use crate::config::PreviewConfig;
use crate::host::KeyPress;
use crate::lifecycle::install;
use crate::previewer::{Msg, Previewer};
use gloo::events::EventListener;
use gloo_events::EventListenerOptions;
use gloo_utils::{document, window};
use host::{BrowserHost, NodeTable};
use log::warn;
use pdfjs::PdfJsEngine;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, KeyboardEvent};

type WebPreviewer = Previewer<BrowserHost, PdfJsEngine>;

/// Route from callbacks and futures back into the previewer.
#[derive(Clone, Default)]
pub(crate) struct Mailbox {
    slot: Rc<RefCell<Weak<RefCell<WebPreviewer>>>>,
}

impl Mailbox {
    fn bind(&self, previewer: &Rc<RefCell<WebPreviewer>>) {
        *self.slot.borrow_mut() = Rc::downgrade(previewer);
    }

    fn with<R>(&self, f: impl FnOnce(&mut WebPreviewer) -> R) -> Option<R> {
        let previewer = self.slot.borrow().upgrade()?;
        let Ok(mut previewer) = previewer.try_borrow_mut() else {
            warn!("previewer busy; dropping event");
            return None;
        };
        Some(f(&mut previewer))
    }

    /// Deliver now. Only for callbacks the browser invokes on its own.
    pub fn send(&self, msg: Msg) {
        self.with(|p| p.update(msg));
    }

    /// Deliver on a later task, outside whatever is running now.
    pub fn post(&self, msg: Msg) {
        let mailbox = self.clone();
        spawn_local(async move { mailbox.send(msg) });
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    wasm_logger::init(wasm_logger::Config::default());

    let docsify = docsify::global_config();
    let plugin = Closure::wrap(Box::new(move |hook: JsValue, vm: JsValue| {
        install_plugin(hook, vm);
    }) as Box<dyn FnMut(JsValue, JsValue)>);
    docsify::register_plugin(&docsify, plugin.into_js_value());
}

fn install_plugin(hook: JsValue, vm: JsValue) {
    let docsify = docsify::global_config();
    let config = docsify::read_config(&docsify).unwrap_or_else(|err| {
        warn!("{}; using default PDF preview settings", err);
        PreviewConfig::default()
    });
    let base_path = docsify::base_path(&docsify);

    let mailbox = Mailbox::default();
    let nodes = NodeTable::default();
    let previewer = Rc::new(RefCell::new(Previewer::new(
        config,
        &base_path,
        BrowserHost::new(nodes.clone(), mailbox.clone()),
        PdfJsEngine::new(nodes, mailbox.clone()),
    )));
    mailbox.bind(&previewer);

    let mut hooks = docsify::DocsifyHooks::new(hook);
    if install(&mut hooks, Rc::clone(&previewer), docsify::route_provider(vm)) {
        listen(mailbox);
    }
}

fn listen(mailbox: Mailbox) {
    let on_click = mailbox.clone();
    EventListener::new(&document(), "click", move |event| {
        let Some(element) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let prevent = on_click.with(|p| {
            let target = p.host_mut().intern(&element);
            p.update(Msg::Click(target))
        });
        if prevent == Some(true) {
            event.prevent_default();
        }
    })
    .forget();

    let on_key = mailbox.clone();
    EventListener::new_with_options(
        &document(),
        "keydown",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let Some(keyboard) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let mut press = KeyPress::new(&keyboard.key());
            if keyboard.shift_key() {
                press = press.with_shift();
            }
            if on_key.with(|p| p.update(Msg::KeyDown(press))) == Some(true) {
                event.prevent_default();
            }
        },
    )
    .forget();

    EventListener::new(&window(), "popstate", move |_| mailbox.send(Msg::PopState)).forget();
}
