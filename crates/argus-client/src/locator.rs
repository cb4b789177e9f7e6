//! In-page element location.
//!
//! Queries run as one self-contained script per call, so every read sees the
//! live DOM and nothing is cached between polls. The matching rules mirror
//! `argus_core::descriptor`: whitespace-normalised text, exact equality or
//! case-insensitive substring, deepest element for text matches, and first
//! match in document order.

use argus_core::descriptor::ElementDescriptor;
use argus_core::error::AppError;
use serde::{Deserialize, Serialize};

/// What to do with the located element.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LocatorOp {
    /// Return an `ElementSnapshot`, or `null` if nothing matches.
    Inspect,
    /// Set the value the way a user edit would, firing `input` and `change`.
    Fill { text: String },
    /// Scroll into view and return the centre point for a real mouse click.
    Point,
}

/// Result of a `Fill` or `Point` operation.
#[derive(Debug, Clone, Deserialize)]
pub struct LocatorOutcome {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

const LOCATOR_JS: &str = r#"(descriptor, op) => {
  const norm = (s) => (s || "").replace(/\s+/g, " ").trim();
  const matches = (actual, expected, exact) => {
    const a = norm(actual);
    const e = norm(expected);
    return exact ? a === e : a.toLowerCase().includes(e.toLowerCase());
  };
  const FORM_TAGS = ["input", "textarea", "select"];

  const roleOf = (el) => {
    const explicit = el.getAttribute("role");
    if (explicit) return explicit.trim().split(/\s+/)[0];
    const tag = el.tagName.toLowerCase();
    switch (tag) {
      case "button": return "button";
      case "a": return el.hasAttribute("href") ? "link" : null;
      case "textarea": return "textbox";
      case "select": return "combobox";
      case "dialog": return "dialog";
      case "img": return "img";
      case "h1": case "h2": case "h3": case "h4": case "h5": case "h6": return "heading";
      case "input": {
        const type = (el.getAttribute("type") || "text").toLowerCase();
        if (type === "checkbox") return "checkbox";
        if (type === "radio") return "radio";
        if (type === "range") return "slider";
        if (type === "number") return "spinbutton";
        if (["button", "submit", "reset"].includes(type)) return "button";
        return "textbox";
      }
      default: return null;
    }
  };

  const labelsOf = (el) => (el.labels ? Array.from(el.labels).map((l) => l.textContent) : []);

  const labelledByOf = (el) => {
    const ids = el.getAttribute("aria-labelledby");
    if (!ids) return "";
    return norm(ids.split(/\s+/)
      .map((id) => document.getElementById(id))
      .filter(Boolean)
      .map((n) => n.textContent)
      .join(" "));
  };

  const nameOf = (el) => {
    const labelledBy = labelledByOf(el);
    if (labelledBy) return labelledBy;
    const candidates = [
      el.getAttribute("aria-label"),
      labelsOf(el).join(" "),
      el.getAttribute("alt"),
      el.getAttribute("title"),
      FORM_TAGS.includes(el.tagName.toLowerCase()) ? "" : el.textContent,
      el.getAttribute("placeholder"),
    ];
    for (const candidate of candidates) {
      if (norm(candidate)) return norm(candidate);
    }
    return "";
  };

  const isVisible = (el) => {
    const rect = el.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return false;
    const style = getComputedStyle(el);
    return style.visibility !== "hidden" && style.display !== "none";
  };

  const all = (root) => Array.from(root.querySelectorAll("*"));
  const SKIP = ["SCRIPT", "STYLE", "HEAD", "TITLE", "NOSCRIPT"];

  const find = (d, root) => {
    switch (d.by) {
      case "selector":
        return root.querySelector(d.value);
      case "role":
        return all(root).find((el) => roleOf(el) === d.role
          && (d.name == null || matches(nameOf(el), d.name, d.exact))) || null;
      case "text": {
        const hits = all(root).filter((el) => !SKIP.includes(el.tagName)
          && matches(el.textContent, d.value, d.exact));
        return hits.find((el) => !hits.some((other) => other !== el && el.contains(other))) || null;
      }
      case "label":
        return all(root).find((el) => labelsOf(el).some((l) => matches(l, d.value, d.exact))
          || (el.hasAttribute("aria-label") && matches(el.getAttribute("aria-label"), d.value, d.exact))
          || (labelledByOf(el) !== "" && matches(labelledByOf(el), d.value, d.exact))) || null;
      case "within": {
        const scope = find(d.scope, root);
        return scope ? find(d.inner, scope) : null;
      }
      default:
        throw new Error("unknown descriptor kind: " + d.by);
    }
  };

  const snapshot = (el) => {
    const tag = el.tagName.toLowerCase();
    const attributes = {};
    for (const a of Array.from(el.attributes)) attributes[a.name] = a.value;
    let checked = null;
    const type = (el.getAttribute("type") || "").toLowerCase();
    if (tag === "input" && (type === "checkbox" || type === "radio")) {
      checked = el.checked;
    } else if (el.hasAttribute("aria-checked")) {
      checked = el.getAttribute("aria-checked") === "true";
    }
    return {
      tag,
      role: roleOf(el),
      name: nameOf(el),
      text: norm(el.innerText !== undefined ? el.innerText : el.textContent),
      value: FORM_TAGS.includes(tag) ? String(el.value) : null,
      visible: isVisible(el),
      checked,
      attributes,
    };
  };

  const el = find(descriptor, document);
  if (op.op === "inspect") return el ? snapshot(el) : null;
  if (!el) return { ok: false, error: "no element matches" };

  if (op.op === "fill") {
    const tag = el.tagName.toLowerCase();
    if (!FORM_TAGS.includes(tag) || el.disabled || el.readOnly) {
      return { ok: false, error: "element is not editable" };
    }
    el.focus();
    const proto = tag === "textarea" ? HTMLTextAreaElement.prototype
      : tag === "select" ? HTMLSelectElement.prototype
      : HTMLInputElement.prototype;
    Object.getOwnPropertyDescriptor(proto, "value").set.call(el, op.text);
    el.dispatchEvent(new Event("input", { bubbles: true }));
    el.dispatchEvent(new Event("change", { bubbles: true }));
    return { ok: true };
  }

  if (op.op === "point") {
    el.scrollIntoView({ block: "center", inline: "center" });
    if (!isVisible(el)) return { ok: false, error: "element is not visible" };
    const r = el.getBoundingClientRect();
    return { ok: true, x: r.left + r.width / 2, y: r.top + r.height / 2 };
  }

  throw new Error("unknown locator op: " + op.op);
}"#;

/// Build the expression that applies `op` to the element matching `target`.
pub fn locator_script(target: &ElementDescriptor, op: &LocatorOp) -> Result<String, AppError> {
    let descriptor = serde_json::to_string(target)?;
    let op = serde_json::to_string(op)?;
    Ok(format!("({LOCATOR_JS})({descriptor}, {op})"))
}

/// Write a local-storage entry, ignoring origins that forbid storage
/// (e.g. `about:blank`). Evaluates to whether the write happened.
pub fn storage_script(key: &str, value: &str) -> Result<String, AppError> {
    let key = serde_json::to_string(key)?;
    let value = serde_json::to_string(value)?;
    Ok(format!(
        "(() => {{ try {{ localStorage.setItem({key}, {value}); return true; }} catch (e) {{ return false; }} }})()"
    ))
}
