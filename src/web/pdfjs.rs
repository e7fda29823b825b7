// src/web/pdfjs.rs
//
// `PdfEngine` over pdf.js, loaded from a CDN script tag on first use.

use super::host::NodeTable;
use super::Mailbox;
use crate::backend::{PageHandle, PdfEngine, ViewerId, Viewport};
use crate::error::BackendError;
use crate::host::NodeId;
use crate::previewer::Msg;
use gloo::events::EventListener;
use gloo_utils::{document, window};
use js_sys::{Function, Object, Promise, Reflect};
use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{HtmlCanvasElement, HtmlScriptElement};

const PDFJS_VERSION: &str = "3.11.174";
const CDN_BASE: &str = "https://cdnjs.cloudflare.com/ajax/libs/pdf.js";

fn cdn_url(file: &str) -> String {
    format!("{}/{}/{}", CDN_BASE, PDFJS_VERSION, file)
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, String> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(|err| describe(&err))
}

/// Call `target[method](args...)`.
fn call(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, String> {
    let function: Function = get(target, method)?
        .dyn_into()
        .map_err(|_| format!("{} is not a function", method))?;
    let args: js_sys::Array = args.iter().collect();
    function.apply(target, &args).map_err(|err| describe(&err))
}

fn object(entries: &[(&str, &JsValue)]) -> Result<JsValue, String> {
    let obj = Object::new();
    for (key, value) in entries {
        Reflect::set(&obj, &JsValue::from_str(key), value).map_err(|err| describe(&err))?;
    }
    Ok(obj.into())
}

fn library() -> Result<JsValue, String> {
    let lib = get(&window(), "pdfjsLib")?;
    if lib.is_undefined() || lib.is_null() {
        return Err("pdfjsLib is not defined".to_string());
    }
    Ok(lib)
}

fn configure_worker(lib: &JsValue) -> Result<(), String> {
    let options = get(lib, "GlobalWorkerOptions")?;
    Reflect::set(
        &options,
        &JsValue::from_str("workerSrc"),
        &JsValue::from_str(&cdn_url("pdf.worker.min.js")),
    )
    .map(|_| ())
    .map_err(|err| describe(&err))
}

#[derive(Default)]
struct Registry {
    documents: HashMap<ViewerId, JsValue>,
    pages: HashMap<PageHandle, JsValue>,
    viewports: HashMap<PageHandle, JsValue>,
    next_page: u64,
}

pub struct PdfJsEngine {
    mailbox: Mailbox,
    nodes: NodeTable,
    registry: Rc<RefCell<Registry>>,
    /// Render in progress per canvas; a new draw cancels the previous one.
    render_tasks: HashMap<NodeId, JsValue>,
}

impl PdfJsEngine {
    pub fn new(nodes: NodeTable, mailbox: Mailbox) -> Self {
        Self {
            mailbox,
            nodes,
            registry: Rc::new(RefCell::new(Registry::default())),
            render_tasks: HashMap::new(),
        }
    }

    fn document(&self, viewer: ViewerId) -> Option<JsValue> {
        self.registry.borrow().documents.get(&viewer).cloned()
    }

    fn page(&self, page: PageHandle) -> Option<JsValue> {
        self.registry.borrow().pages.get(&page).cloned()
    }
}

fn promise_of(value: JsValue) -> Result<Promise, String> {
    value.dyn_into::<Promise>().map_err(|_| "expected a promise".to_string())
}

impl PdfEngine for PdfJsEngine {
    fn load_library(&mut self) {
        let mailbox = self.mailbox.clone();

        if let Ok(lib) = library() {
            let result = configure_worker(&lib).map_err(BackendError::LibraryUnavailable);
            mailbox.post(Msg::LibraryLoaded(result));
            return;
        }

        let script = match document()
            .create_element("script")
            .map(|el| el.unchecked_into::<HtmlScriptElement>())
        {
            Ok(script) => script,
            Err(err) => {
                let reason = describe(&err);
                mailbox.post(Msg::LibraryLoaded(Err(BackendError::LibraryUnavailable(reason))));
                return;
            }
        };
        script.set_src(&cdn_url("pdf.min.js"));

        let on_load = mailbox.clone();
        EventListener::once(&script, "load", move |_| {
            let result = library()
                .and_then(|lib| configure_worker(&lib))
                .map_err(BackendError::LibraryUnavailable);
            if result.is_ok() {
                info!("pdf.js {} loaded", PDFJS_VERSION);
            }
            on_load.send(Msg::LibraryLoaded(result));
        })
        .forget();

        let on_error = mailbox.clone();
        EventListener::once(&script, "error", move |_| {
            on_error.send(Msg::LibraryLoaded(Err(BackendError::LibraryUnavailable(format!(
                "could not fetch {}",
                cdn_url("pdf.min.js")
            )))));
        })
        .forget();

        let appended = document()
            .head()
            .ok_or_else(|| "document has no head".to_string())
            .and_then(|head| head.append_child(&script).map_err(|err| describe(&err)));
        if let Err(reason) = appended {
            mailbox.post(Msg::LibraryLoaded(Err(BackendError::LibraryUnavailable(reason))));
        }
    }

    fn open_document(&mut self, viewer: ViewerId, url: &str) {
        let mailbox = self.mailbox.clone();
        let opening = library()
            .and_then(|lib| call(&lib, "getDocument", &[JsValue::from_str(url)]))
            .and_then(|task| get(&task, "promise"))
            .and_then(promise_of);
        let promise = match opening {
            Ok(promise) => promise,
            Err(reason) => {
                mailbox.post(Msg::DocumentOpened {
                    viewer,
                    result: Err(BackendError::DocumentOpen(reason)),
                });
                return;
            }
        };

        let registry = Rc::clone(&self.registry);
        spawn_local(async move {
            let result = match JsFuture::from(promise).await {
                Ok(doc) => {
                    let pages = get(&doc, "numPages")
                        .ok()
                        .and_then(|n| n.as_f64())
                        .unwrap_or(0.0) as u32;
                    registry.borrow_mut().documents.insert(viewer, doc);
                    Ok(pages)
                }
                Err(err) => Err(BackendError::DocumentOpen(describe(&err))),
            };
            mailbox.send(Msg::DocumentOpened { viewer, result });
        });
    }

    fn fetch_page(&mut self, viewer: ViewerId, ticket: u64, page: u32) {
        let mailbox = self.mailbox.clone();
        let fetching = self
            .document(viewer)
            .ok_or_else(|| "document is not open".to_string())
            .and_then(|doc| call(&doc, "getPage", &[JsValue::from(page)]))
            .and_then(promise_of);
        let promise = match fetching {
            Ok(promise) => promise,
            Err(reason) => {
                mailbox.post(Msg::PageReady {
                    viewer,
                    ticket,
                    result: Err(BackendError::PageRender { page, reason }),
                });
                return;
            }
        };

        let registry = Rc::clone(&self.registry);
        spawn_local(async move {
            let result = match JsFuture::from(promise).await {
                Ok(proxy) => {
                    let mut registry = registry.borrow_mut();
                    registry.next_page += 1;
                    let handle = PageHandle(registry.next_page);
                    registry.pages.insert(handle, proxy);
                    Ok(handle)
                }
                Err(err) => Err(BackendError::PageRender {
                    page,
                    reason: describe(&err),
                }),
            };
            mailbox.send(Msg::PageReady { viewer, ticket, result });
        });
    }

    fn viewport(&self, page: PageHandle, scale: f64) -> Result<Viewport, BackendError> {
        let failed = |reason: String| BackendError::PageRender { page: 0, reason };
        let proxy = self.page(page).ok_or_else(|| failed("page was released".to_string()))?;
        let options = object(&[("scale", &JsValue::from(scale))]).map_err(failed)?;
        let viewport = call(&proxy, "getViewport", &[options]).map_err(failed)?;

        let dimension = |key: &str| {
            get(&viewport, key)
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
        };
        let size = Viewport {
            width: dimension("width"),
            height: dimension("height"),
        };
        self.registry.borrow_mut().viewports.insert(page, viewport);
        Ok(size)
    }

    fn draw(
        &mut self,
        page: PageHandle,
        canvas: NodeId,
        _viewport: Viewport,
    ) -> Result<(), BackendError> {
        let failed = |reason: String| BackendError::PageRender { page: 0, reason };
        let proxy = self.page(page).ok_or_else(|| failed("page was released".to_string()))?;
        let viewport = self
            .registry
            .borrow()
            .viewports
            .get(&page)
            .cloned()
            .ok_or_else(|| failed("viewport not computed".to_string()))?;
        let canvas_element: HtmlCanvasElement = self
            .nodes
            .get(canvas)
            .and_then(|el| el.dyn_into().ok())
            .ok_or_else(|| failed("canvas not found".to_string()))?;
        let context = canvas_element
            .get_context("2d")
            .map_err(|err| failed(describe(&err)))?
            .ok_or_else(|| failed("2d context unavailable".to_string()))?;

        if let Some(previous) = self.render_tasks.remove(&canvas) {
            if let Err(reason) = call(&previous, "cancel", &[]) {
                debug!("cancelling render failed: {}", reason);
            }
        }

        let context = JsValue::from(context);
        let params =
            object(&[("canvasContext", &context), ("viewport", &viewport)]).map_err(failed)?;
        let task = call(&proxy, "render", &[params]).map_err(failed)?;
        if let Ok(promise) = get(&task, "promise").and_then(promise_of) {
            spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    debug!("page render ended: {}", describe(&err));
                }
            });
        }
        self.render_tasks.insert(canvas, task);
        Ok(())
    }

    fn release_page(&mut self, page: PageHandle) {
        let mut registry = self.registry.borrow_mut();
        registry.viewports.remove(&page);
        if let Some(proxy) = registry.pages.remove(&page) {
            if let Err(reason) = call(&proxy, "cleanup", &[]) {
                debug!("page cleanup failed: {}", reason);
            }
        }
    }

    fn close_document(&mut self, viewer: ViewerId) {
        let doc = self.registry.borrow_mut().documents.remove(&viewer);
        if let Some(doc) = doc {
            if let Err(reason) = call(&doc, "destroy", &[]) {
                debug!("closing document failed: {}", reason);
            }
        }
    }
}
