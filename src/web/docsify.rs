// src/web/docsify.rs
use crate::config::{ConfigOverrides, PreviewConfig};
use crate::error::Error;
use crate::lifecycle::{Lifecycle, RouteProvider};
use gloo_utils::window;
use js_sys::{Function, Object, Reflect, RegExp, JSON};
use log::{debug, warn};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// `window.$docsify`, created when the page has not defined it.
pub fn global_config() -> JsValue {
    let key = JsValue::from_str("$docsify");
    if let Some(existing) = get(&window(), "$docsify") {
        return existing;
    }
    let created: JsValue = Object::new().into();
    if Reflect::set(&window(), &key, &created).is_err() {
        warn!("could not define window.$docsify");
    }
    created
}

pub fn base_path(docsify: &JsValue) -> String {
    get(docsify, "basePath")
        .and_then(|value| value.as_string())
        .unwrap_or_default()
}

/// Translate a JS `RegExp` into the equivalent `regex` source.
fn regexp_source(pattern: &RegExp) -> String {
    let source = String::from(pattern.source());
    if String::from(pattern.flags()).contains('i') {
        format!("(?i){}", source)
    } else {
        source
    }
}

/// Merge `$docsify.pdfPreview` over the defaults.
pub fn read_config(docsify: &JsValue) -> Result<PreviewConfig, Error> {
    let Some(user) = get(docsify, "pdfPreview") else {
        return PreviewConfig::merged(&ConfigOverrides::default());
    };

    let copy = Object::assign(&Object::new(), user.unchecked_ref::<Object>());
    if let Some(pattern) = get(&user, "match").and_then(|m| m.dyn_into::<RegExp>().ok()) {
        let source = JsValue::from_str(&regexp_source(&pattern));
        if let Err(err) = Reflect::set(&copy, &JsValue::from_str("match"), &source) {
            debug!("could not copy match pattern: {:?}", err);
        }
    }

    let json = JSON::stringify(&copy)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| "{}".to_string());
    PreviewConfig::from_json(&json)
}

pub fn register_plugin(docsify: &JsValue, plugin: JsValue) {
    let plugins = get(docsify, "plugins")
        .and_then(|p| p.dyn_into::<js_sys::Array>().ok())
        .unwrap_or_else(js_sys::Array::new);
    plugins.push(&plugin);
    if Reflect::set(docsify, &JsValue::from_str("plugins"), &plugins).is_err() {
        warn!("could not register plugin with docsify");
    }
}

pub fn route_provider(vm: JsValue) -> RouteProvider {
    Rc::new(move || {
        get(&vm, "route")
            .and_then(|route| get(&route, "path"))
            .and_then(|path| path.as_string())
            .unwrap_or_else(|| "/".to_string())
    })
}

/// The `hook` object docsify hands to each plugin.
pub struct DocsifyHooks {
    hook: JsValue,
}

impl DocsifyHooks {
    pub fn new(hook: JsValue) -> Self {
        Self { hook }
    }

    fn register(&self, name: &str, callback: JsValue) {
        let registered = get(&self.hook, name)
            .and_then(|f| f.dyn_into::<Function>().ok())
            .map(|f| f.call1(&self.hook, &callback));
        match registered {
            Some(Ok(_)) => {}
            _ => warn!("docsify hook `{}` unavailable", name),
        }
    }
}

impl Lifecycle for DocsifyHooks {
    fn before_each(&mut self, mut hook: Box<dyn FnMut(String) -> String>) {
        // Docsify uses the return value of a one-argument hook as the new content.
        let callback = Closure::wrap(Box::new(move |content: JsValue| -> JsValue {
            match content.as_string() {
                Some(markdown) => JsValue::from_str(&hook(markdown)),
                None => content,
            }
        }) as Box<dyn FnMut(JsValue) -> JsValue>);
        self.register("beforeEach", callback.into_js_value());
    }

    fn done_each(&mut self, mut hook: Box<dyn FnMut()>) {
        let callback = Closure::wrap(Box::new(move || hook()) as Box<dyn FnMut()>);
        self.register("doneEach", callback.into_js_value());
    }

    fn mounted(&mut self, mut hook: Box<dyn FnMut()>) {
        let callback = Closure::wrap(Box::new(move || hook()) as Box<dyn FnMut()>);
        self.register("mounted", callback.into_js_value());
    }
}
