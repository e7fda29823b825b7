// src/components/modal_panel.rs
use yew::prelude::*;

pub const MODAL_PANEL_CLASS: &str = "pdf-preview-modal";
pub const MODAL_TITLE_ID: &str = "pdf-preview-modal-title";
pub const MODAL_FRAME_ID: &str = "pdf-preview-modal-frame";
pub const MODAL_CLOSE_ID: &str = "pdf-modal-close-btn";
pub const MODAL_OPEN_ID: &str = "pdf-modal-open-btn";
pub const MODAL_DOWNLOAD_ID: &str = "pdf-modal-download-btn";
pub const MODAL_FALLBACK_OPEN_ID: &str = "pdf-modal-fallback-open";
pub const MODAL_FALLBACK_DOWNLOAD_ID: &str = "pdf-modal-fallback-dl";

#[derive(Properties, PartialEq, Clone, Debug)]
pub struct ModalPanelProps {
    pub url: String,
    pub filename: String,
    /// `None` leaves the frame without a source so it stops loading.
    pub frame_src: Option<String>,
    pub width: String,
    pub height: String,
    pub open_button: bool,
    pub download_button: bool,
}

/// Header, frame and fallback of the shared modal. The overlay around it
/// belongs to the modal controller.
#[function_component(ModalPanel)]
pub fn modal_panel(props: &ModalPanelProps) -> Html {
    let url = props.url.clone();
    let name = props.filename.clone();
    let open_label = format!("Open {} in new tab", name);
    let size = format!("width:{};height:{}", props.width, props.height);

    html! {
        <div class={MODAL_PANEL_CLASS} role="document" style={size}>
            <div class="pdf-preview-modal-header">
                <span class="pdf-preview-modal-spacer"></span>
                <a
                    class="pdf-preview-modal-filename"
                    id={MODAL_TITLE_ID}
                    href={url.clone()}
                    target="_blank"
                    rel="noopener noreferrer"
                    aria-label={open_label.clone()}
                >
                    { name.clone() }
                </a>
                <span class="pdf-preview-modal-actions">
                    <a
                        class="pdf-btn"
                        id={MODAL_OPEN_ID}
                        href={url.clone()}
                        target="_blank"
                        rel="noopener noreferrer"
                        aria-label={open_label}
                        hidden={!props.open_button}
                    >
                        { "Open" }
                    </a>
                    <a
                        class="pdf-btn"
                        id={MODAL_DOWNLOAD_ID}
                        href={url.clone()}
                        download={name.clone()}
                        aria-label={format!("Download {}", name)}
                        hidden={!props.download_button}
                    >
                        { "Download" }
                    </a>
                    <button
                        class="pdf-modal-close-btn"
                        id={MODAL_CLOSE_ID}
                        type="button"
                        aria-label="Close PDF viewer"
                    >
                        { "\u{2715}" }
                    </button>
                </span>
            </div>
            <div class="pdf-preview-modal-body">
                <iframe
                    class="pdf-preview-frame"
                    id={MODAL_FRAME_ID}
                    src={props.frame_src.clone()}
                    title={format!("PDF preview: {}", name)}
                    aria-label="PDF preview"
                ></iframe>
                <div class="pdf-preview-fallback" aria-live="polite">
                    { "Your browser cannot display this PDF. " }
                    <a
                        id={MODAL_FALLBACK_OPEN_ID}
                        href={url.clone()}
                        target="_blank"
                        rel="noopener noreferrer"
                    >
                        { "Open" }
                    </a>
                    { " or " }
                    <a id={MODAL_FALLBACK_DOWNLOAD_ID} href={url} download={name}>
                        { "Download" }
                    </a>
                    { " it." }
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Widget;
    use crate::host::{HeadlessHost, Host};

    fn props(url: &str, name: &str) -> ModalPanelProps {
        ModalPanelProps {
            url: url.to_string(),
            filename: name.to_string(),
            frame_src: Some(url.to_string()),
            width: "96vw".to_string(),
            height: "97vh".to_string(),
            open_button: true,
            download_button: true,
        }
    }

    fn mounted(props: ModalPanelProps) -> HeadlessHost {
        let mut host = HeadlessHost::new(r#"<div id="root"></div>"#);
        let root = host.query("#root").unwrap();
        host.mount(root, Widget::ModalPanel(props));
        host
    }

    #[test]
    fn test_crafted_filename_stays_text() {
        let host = mounted(props(
            r#"/docs/x.pdf"onmouseover="alert(1)"#,
            "<img src=x onerror=alert(1)>.pdf",
        ));
        assert!(host.query("img").is_none());

        let title = host.query("#pdf-preview-modal-title").unwrap();
        assert_eq!(host.text(title).trim(), "<img src=x onerror=alert(1)>.pdf");
        assert_eq!(
            host.attribute(title, "href").as_deref(),
            Some(r#"/docs/x.pdf"onmouseover="alert(1)"#)
        );
        assert!(host.attribute(title, "onmouseover").is_none());
    }

    #[test]
    fn test_actions_follow_flags() {
        let host = mounted(ModalPanelProps {
            open_button: false,
            ..props("/a.pdf", "a.pdf")
        });
        let open = host.query("#pdf-modal-open-btn").unwrap();
        let download = host.query("#pdf-modal-download-btn").unwrap();
        assert!(host.attribute(open, "hidden").is_some());
        assert!(host.attribute(download, "hidden").is_none());
        assert_eq!(host.attribute(download, "download").as_deref(), Some("a.pdf"));
    }

    #[test]
    fn test_closed_panel_frame_has_no_source() {
        let host = mounted(ModalPanelProps {
            frame_src: None,
            ..props("/a.pdf", "a.pdf")
        });
        let frame = host.query("#pdf-preview-modal-frame").unwrap();
        assert!(host.attribute(frame, "src").is_none());
        assert_eq!(host.attribute(frame, "title").as_deref(), Some("PDF preview: a.pdf"));
    }
}
