// src/styles.rs

/// Id of the injected `<style>` element.
pub const STYLE_ID: &str = "docsify-pdf-preview-styles";

/// Colors come from the host theme variables so previews follow the theme.
pub const PLUGIN_CSS: &str = concat!(
    // inline viewer
    ".pdf-preview-inline{margin:1em 0;border:1px solid var(--sidebar-border-color);border-radius:var(--border-radius-m,2px);overflow:hidden}",
    ".pdf-preview-header{display:flex;align-items:center;justify-content:space-between;gap:6px;padding:5px 10px;border-bottom:1px solid var(--sidebar-border-color);background:var(--base-background-color)}",
    ".pdf-preview-filename{flex:1;text-align:center;font-weight:600;font-size:.88em;color:var(--theme-color);text-decoration:none;white-space:nowrap;overflow:hidden;text-overflow:ellipsis}",
    ".pdf-preview-filename:hover,.pdf-preview-filename:focus{text-decoration:underline;outline:none}",
    ".pdf-preview-controls{display:flex;gap:4px;flex-shrink:0}",
    ".pdf-preview-frame-area{position:relative;width:100%;background:var(--base-background-color)}",
    ".pdf-preview-frame{display:block;width:100%;height:100%;border:none}",
    // the fallback is visible only while the frame has no source
    ".pdf-preview-fallback{display:none;padding:12px;font-size:.9em;color:var(--base-color);border-top:1px solid var(--sidebar-border-color)}",
    ".pdf-preview-frame:not([src])+.pdf-preview-fallback,.pdf-preview-frame[src=\"\"]+.pdf-preview-fallback{display:block}",
    // buttons
    ".pdf-btn,.pdf-preview-modal-btn{display:inline-flex;align-items:center;gap:4px;padding:3px 8px;border:1px solid var(--sidebar-border-color);border-radius:var(--border-radius-m,2px);background:var(--base-background-color);color:var(--base-color);font:inherit;font-size:.8em;text-decoration:none;white-space:nowrap;cursor:pointer}",
    ".pdf-preview-modal-btn{margin:0 4px;padding:4px 10px;font-size:.85em}",
    ".pdf-btn:hover,.pdf-btn:focus,.pdf-preview-modal-btn:hover,.pdf-preview-modal-btn:focus{border-color:var(--theme-color);color:var(--theme-color);outline:none}",
    ".pdf-btn:focus-visible,.pdf-preview-modal-btn:focus-visible,.pdf-inline-expand-btn:focus-visible{outline:2px solid var(--theme-color);outline-offset:2px}",
    ".pdf-btn[disabled]{opacity:.5;cursor:default}",
    ".pdf-btn[hidden]{display:none}",
    ".pdf-inline-expand-btn,.pdf-modal-close-btn{display:inline-flex;align-items:center;justify-content:center;width:24px;height:24px;padding:0;border:1px solid var(--sidebar-border-color);border-radius:var(--border-radius-m,2px);background:var(--base-background-color);color:var(--base-color);font:inherit;font-size:.8em;line-height:1;cursor:pointer;flex-shrink:0}",
    ".pdf-modal-close-btn:hover,.pdf-modal-close-btn:focus{border-color:#d93025;color:#d93025;outline:none}",
    // modal
    ".pdf-preview-modal-overlay{position:fixed;inset:0;z-index:100000;display:flex;align-items:center;justify-content:center;background:rgba(0,0,0,.75);box-sizing:border-box}",
    ".pdf-preview-modal{display:flex;flex-direction:column;max-width:100%;max-height:100%;overflow:hidden;background:var(--base-background-color);box-shadow:0 8px 40px rgba(0,0,0,.5);box-sizing:border-box}",
    ".pdf-preview-modal-header{display:flex;align-items:center;justify-content:space-between;gap:6px;padding:5px 10px;flex-shrink:0;border-bottom:1px solid var(--sidebar-border-color)}",
    ".pdf-preview-modal-filename{flex:1;text-align:center;font-weight:600;font-size:.88em;color:var(--theme-color);text-decoration:none;white-space:nowrap;overflow:hidden;text-overflow:ellipsis}",
    ".pdf-preview-modal-actions{display:flex;gap:4px;align-items:center;flex-shrink:0}",
    ".pdf-preview-modal-spacer{width:24px;flex-shrink:0}",
    ".pdf-preview-modal-body{position:relative;flex:1;display:flex;flex-direction:column;overflow:auto}",
    ".pdf-preview-modal-body .pdf-preview-frame{flex:1;min-height:0}",
    // paged viewer
    ".pdf-paged-viewer{display:flex;flex-direction:column;height:100%;background:#525659}",
    ".pdf-paged-controls{display:flex;flex-wrap:wrap;align-items:center;gap:6px;padding:6px 10px;flex-shrink:0;background:#3c3c3c}",
    ".pdf-paged-page-info{min-width:80px;text-align:center;font-size:.85em;color:#fff}",
    ".pdf-paged-canvas{display:block;margin:0 auto;max-width:100%}",
    "@media(max-width:600px){",
    ".pdf-preview-modal{width:100vw !important;height:100vh !important}",
    ".pdf-preview-header,.pdf-preview-modal-header{flex-wrap:wrap}",
    "}",
);
