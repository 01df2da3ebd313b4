#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-clinic-ui]";

/// Default CSS for the pages along with easy-to-override design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --clinic-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --clinic-bg: #ffffff;
  --clinic-card-bg: #ffffff;
  --clinic-card-border: rgba(148, 163, 184, 0.28);
  --clinic-radius: 14px;
  --clinic-text: #1f2933;
  --clinic-muted: #52606d;
  --clinic-heading: #11181c;
  --clinic-surface: #f8fafc;
  --clinic-accent: #2563eb;
  --clinic-accent-text: #ffffff;
  --clinic-danger: #b42318;
  --clinic-danger-bg: rgba(180, 35, 24, 0.1);
  --clinic-affirm: #047857;
  --clinic-affirm-bg: rgba(16, 185, 129, 0.14);
  --clinic-notice-bg: rgba(220, 104, 3, 0.12);
  --clinic-notice-text: #b54708;
}

.clinic-root {
  font-family: var(--clinic-font-family);
  background: var(--clinic-bg);
  color: var(--clinic-text);
  border-radius: var(--clinic-radius);
  max-width: 960px;
  margin: 0 auto;
  padding: 28px;
}

.clinic-root h1 {
  color: var(--clinic-heading);
  font-size: 1.6rem;
  margin: 0 0 24px;
  text-align: center;
}

.clinic-notice {
  background: var(--clinic-notice-bg);
  color: var(--clinic-notice-text);
  border-radius: 10px;
  padding: 10px 14px;
  margin-bottom: 18px;
  font-size: 0.92rem;
}

.clinic-card {
  background: var(--clinic-card-bg);
  border: 1px solid var(--clinic-card-border);
  border-radius: var(--clinic-radius);
  padding: 20px;
  margin-bottom: 20px;
  box-shadow: 0 12px 24px rgba(15, 23, 42, 0.06);
}

.clinic-card h2,
.clinic-card h3 {
  margin: 0 0 12px;
  color: var(--clinic-heading);
}

.clinic-field {
  display: flex;
  flex-direction: column;
  gap: 6px;
  margin-bottom: 14px;
}

.clinic-field label {
  font-weight: 600;
  font-size: 0.9rem;
}

.clinic-field input,
.clinic-field select,
.clinic-field textarea {
  border: 1px solid var(--clinic-card-border);
  border-radius: 8px;
  padding: 9px 12px;
  font: inherit;
  background: var(--clinic-surface);
}

.clinic-field-row {
  display: grid;
  gap: 14px;
  grid-template-columns: 1fr 1fr;
}

.doctor-profile {
  display: flex;
  gap: 16px;
  align-items: flex-start;
}

.doctor-avatar {
  width: 84px;
  height: 84px;
  border-radius: 50%;
  object-fit: cover;
  background: var(--clinic-surface);
  display: flex;
  align-items: center;
  justify-content: center;
  font-weight: 700;
  color: var(--clinic-muted);
}

.doctor-about {
  color: var(--clinic-muted);
  margin: 4px 0;
}

.doctor-pricing {
  color: var(--clinic-accent);
  font-weight: 600;
}

.doctor-aid-list {
  margin: 4px 0 0 18px;
  font-size: 0.9rem;
}

.clinic-terms {
  display: flex;
  gap: 10px;
  align-items: flex-start;
  font-size: 0.9rem;
  margin: 14px 0;
}

.clinic-button {
  background: var(--clinic-accent);
  color: var(--clinic-accent-text);
  border: none;
  border-radius: 9px;
  padding: 10px 18px;
  font: inherit;
  font-weight: 600;
  cursor: pointer;
}

.clinic-button:disabled {
  opacity: 0.5;
  cursor: not-allowed;
}

.clinic-button.secondary {
  background: transparent;
  color: var(--clinic-text);
  border: 1px solid var(--clinic-card-border);
}

.clinic-button.danger {
  background: var(--clinic-danger);
}

.clinic-button.block {
  width: 100%;
}

.clinic-modal-backdrop {
  position: fixed;
  inset: 0;
  background: rgba(15, 23, 42, 0.5);
  display: flex;
  align-items: center;
  justify-content: center;
  z-index: 50;
}

.clinic-modal {
  background: var(--clinic-card-bg);
  border-radius: var(--clinic-radius);
  padding: 24px;
  width: min(92vw, 380px);
  box-shadow: 0 24px 48px rgba(15, 23, 42, 0.2);
}

.clinic-modal h2 {
  margin: 0 0 14px;
}

.clinic-modal-actions {
  display: flex;
  justify-content: flex-end;
  gap: 10px;
  margin-top: 16px;
}

.otp-row {
  display: flex;
  gap: 8px;
  margin-bottom: 8px;
}

.otp-digit {
  width: 44px;
  height: 48px;
  text-align: center;
  font-size: 1.2rem;
  border: 1px solid var(--clinic-card-border);
  border-radius: 8px;
}

.questionnaire-intro {
  color: var(--clinic-muted);
  font-size: 0.9rem;
  margin-bottom: 14px;
}

.clinic-tabs {
  display: grid;
  grid-template-columns: repeat(3, 1fr);
  gap: 8px;
  margin-bottom: 20px;
}

.clinic-tab {
  padding: 10px;
  border-radius: 9px;
  border: 1px solid var(--clinic-card-border);
  background: var(--clinic-surface);
  font: inherit;
  cursor: pointer;
}

.clinic-tab.is-active {
  background: var(--clinic-accent);
  color: var(--clinic-accent-text);
  border-color: var(--clinic-accent);
}

.clinic-table {
  width: 100%;
  border-collapse: collapse;
  font-size: 0.92rem;
}

.clinic-table th,
.clinic-table td {
  text-align: left;
  padding: 9px 10px;
  border-bottom: 1px solid var(--clinic-card-border);
}

.clinic-table th {
  color: var(--clinic-muted);
  font-weight: 600;
}

.status-pill {
  display: inline-block;
  border-radius: 999px;
  padding: 2px 10px;
  font-size: 0.8rem;
  font-weight: 600;
  background: var(--clinic-surface);
}

.status-pill[data-status="CNC"] {
  background: var(--clinic-danger-bg);
  color: var(--clinic-danger);
}

.status-pill[data-status="CNF"] {
  background: var(--clinic-affirm-bg);
  color: var(--clinic-affirm);
}

.clinic-empty {
  color: var(--clinic-muted);
  padding: 14px 0;
}

@media (max-width: 640px) {
  .clinic-field-row {
    grid-template-columns: 1fr;
  }

  .doctor-profile {
    flex-direction: column;
  }
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-clinic-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
