#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-inspection-ui]";

/// Default CSS; `--category-color` is set per card and row.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --planner-font-family: 'Inter', system-ui, -apple-system, 'Segoe UI', sans-serif;
  --planner-card-bg: #ffffff;
  --planner-border: rgba(148, 163, 184, 0.32);
  --planner-radius: 12px;
  --planner-text: #1f2933;
  --planner-muted: #52606d;
}

.planner-root {
  font-family: var(--planner-font-family);
  color: var(--planner-text);
  display: grid;
  gap: 16px;
}

.planner-cards {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
  gap: 12px;
}

.planner-card {
  display: flex;
  flex-direction: column;
  align-items: flex-start;
  padding: 12px 14px;
  border: 1px solid var(--planner-border);
  border-left: 6px solid var(--category-color, #475467);
  border-radius: var(--planner-radius);
  background: var(--planner-card-bg);
  cursor: pointer;
  text-align: left;
}

.planner-card.is-active {
  box-shadow: 0 0 0 2px var(--category-color, #475467);
}

.planner-card-count {
  font-size: 1.6rem;
  font-weight: 600;
}

.planner-card-label {
  color: var(--planner-muted);
  font-size: 0.85rem;
}

.planner-toolbar {
  display: flex;
  gap: 8px;
  margin-bottom: 8px;
}

.planner-toolbar input {
  flex: 1;
  padding: 6px 10px;
  border: 1px solid var(--planner-border);
  border-radius: 8px;
}

.planner-schools {
  list-style: none;
  margin: 0;
  padding: 0;
}

.planner-school {
  display: flex;
  align-items: center;
  gap: 10px;
  padding: 10px 4px;
  border-bottom: 1px solid var(--planner-border);
}

.planner-dot {
  width: 10px;
  height: 10px;
  border-radius: 50%;
  background: var(--category-color, #475467);
}

.planner-school-body {
  display: flex;
  flex-direction: column;
  flex: 1;
}

.planner-school-hint,
.planner-status,
.planner-empty {
  color: var(--planner-muted);
  font-size: 0.85rem;
}

@media (max-width: 640px) {
  .planner-toolbar {
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
        .ok_or_else(|| JsValue::from_str("Document has no <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-inspection-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
