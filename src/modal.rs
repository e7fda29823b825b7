// src/modal.rs
//
// The single shared overlay dialog. Created on first open and reused for
// every later one; nothing else in the crate touches its elements.

use crate::components::modal_panel::{MODAL_CLOSE_ID, MODAL_PANEL_CLASS};
use crate::components::{ModalPanelProps, Widget};
use crate::config::PreviewConfig;
use crate::host::{Host, KeyPress, NodeId};
use crate::markup;
use crate::scanner::LinkDescriptor;
use crate::utils::{hash_has_param, hash_with_param, hash_without_param};
use log::{debug, warn};

/// Delay before focus moves into a freshly opened modal, so layout settles.
pub const FOCUS_DELAY_MS: u32 = 50;

#[derive(Debug, Default)]
pub struct Modal {
    overlay: Option<NodeId>,
    /// What the panel shows now; kept so closing can empty the frame.
    panel: Option<ModalPanelProps>,
    open: bool,
    trigger: Option<NodeId>,
    /// Identifies the pending focus timer; bumped on every open and close.
    focus_token: u64,
    /// Route-state parameter written by the current open.
    route_param: Option<String>,
}

impl Modal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.overlay
    }

    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    fn ensure_overlay<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<NodeId> {
        if self.overlay.is_none() {
            self.overlay = host.append_to_body(&markup::modal_overlay());
        }
        self.overlay
    }

    fn find<H: Host + ?Sized>(&self, host: &H, selector: &str) -> Option<NodeId> {
        host.find(self.overlay?, selector)
    }

    fn close_button<H: Host + ?Sized>(&self, host: &H) -> Option<NodeId> {
        self.find(host, &format!("#{}", MODAL_CLOSE_ID))
    }

    /// Show `info` in the modal. Opening while already open re-populates in
    /// place; `trigger` receives focus again on close.
    pub fn open<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        info: &LinkDescriptor,
        config: &PreviewConfig,
        trigger: Option<NodeId>,
    ) {
        let Some(overlay) = self.ensure_overlay(host) else {
            warn!("could not create PDF modal");
            return;
        };
        let url = info.resolved_url.as_str();

        // Panel content
        let props = ModalPanelProps {
            url: url.to_string(),
            filename: info.filename.clone(),
            frame_src: Some(url.to_string()),
            width: config.modal_width.clone(),
            height: config.modal_height.clone(),
            open_button: config.open_button,
            download_button: config.download_button,
        };
        let label = format!("PDF Viewer: {}", props.filename);
        host.set_attribute(overlay, "aria-label", &label);
        host.mount(overlay, Widget::ModalPanel(props.clone()));
        self.panel = Some(props);

        // Show and lock the page behind it
        host.set_style(overlay, "display", "flex");
        host.set_scroll_locked(true);
        self.open = true;
        self.trigger = trigger;

        // Route state, replaced in place when already present
        if let Some(param) = &config.route_param {
            let hash = host.location_hash();
            let updated = hash_with_param(&hash, param, url);
            if updated != hash {
                host.push_hash(&updated);
            }
            self.route_param = Some(param.clone());
        }

        self.focus_token += 1;
        host.schedule_timer(FOCUS_DELAY_MS, self.focus_token);
        debug!("modal opened for {}", url);
    }

    /// Hide the modal. Returns false when it was already closed.
    pub fn close<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        if !self.open {
            return false;
        }
        let Some(overlay) = self.overlay else {
            return false;
        };

        host.set_style(overlay, "display", "none");
        host.set_scroll_locked(false);
        if let Some(props) = self.panel.as_mut() {
            props.frame_src = None;
            host.mount(overlay, Widget::ModalPanel(props.clone()));
        }

        self.open = false;
        self.focus_token += 1;

        if let Some(trigger) = self.trigger.take() {
            host.focus(trigger);
        }
        if let Some(param) = self.route_param.take() {
            if let Some(hash) = hash_without_param(&host.location_hash(), &param) {
                host.push_hash(&hash);
            }
        }
        true
    }

    /// Completes the delayed focus move of the open that scheduled `token`.
    pub fn focus_timer_elapsed<H: Host + ?Sized>(&mut self, host: &mut H, token: u64) {
        if !self.open || token != self.focus_token {
            debug!("ignoring stale focus timer {}", token);
            return;
        }
        if let Some(close) = self.close_button(&*host) {
            host.focus(close);
        }
    }

    /// Close button or a click on the backdrop itself. Returns true when the
    /// click was consumed.
    pub fn handle_click<H: Host + ?Sized>(&mut self, host: &mut H, target: NodeId) -> bool {
        if !self.open || self.overlay.is_none() {
            return false;
        }
        let on_close = self
            .close_button(&*host)
            .is_some_and(|close| host.contains(close, target));
        if self.overlay == Some(target) || on_close {
            return self.close(host);
        }
        false
    }

    /// Escape closes; Tab and Shift+Tab stay inside the panel. Returns true
    /// when the browser's default action must be suppressed.
    pub fn handle_key<H: Host + ?Sized>(&mut self, host: &mut H, key: &KeyPress) -> bool {
        if !self.open {
            return false;
        }
        match key.key.as_str() {
            "Escape" | "Esc" => {
                self.close(host);
                false
            }
            "Tab" => self.trap_focus(host, key.shift),
            _ => false,
        }
    }

    fn trap_focus<H: Host + ?Sized>(&mut self, host: &mut H, backwards: bool) -> bool {
        let Some(panel) = self.find(&*host, &format!(".{}", MODAL_PANEL_CLASS)) else {
            return false;
        };
        let focusable = host.focusable_within(panel);
        let (Some(&first), Some(&last)) = (focusable.first(), focusable.last()) else {
            return false;
        };

        let active = host.active_element();
        let inside = active.is_some_and(|node| host.contains(panel, node));
        let target = match (backwards, inside) {
            (true, false) => last,
            (false, false) => first,
            (true, true) if active == Some(first) => last,
            (false, true) if active == Some(last) => first,
            _ => return false,
        };
        host.focus(target);
        true
    }

    /// Back/forward navigation: close once the route-state parameter is gone.
    pub fn location_changed<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(param) = self.route_param.clone() else {
            return;
        };
        if self.open && !hash_has_param(&host.location_hash(), &param) {
            debug!("route-state parameter removed; closing modal");
            self.close(host);
        }
    }
}
