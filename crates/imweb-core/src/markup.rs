//! HTML markup for declared elements.
//!
//! Rendered through `minijinja` with HTML auto-escaping, so neither an
//! element ID nor text content can break out of its element. The renderer
//! locates elements by their `id` attribute, which always equals the
//! [`ElementId`].

use imweb_types::{ElementId, Event};
use minijinja::{Environment, context};

const TEXT_TEMPLATE: &str = r#"<div id="{{ id }}">{{ content }}</div>"#;

const BUTTON_TEMPLATE: &str =
    r#"<button id="{{ id }}" onclick="window.IMWEB_notify({{ notify }})">{{ id }}</button>"#;

/// Errors raised while rendering element markup.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// A template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The click payload could not be encoded.
    #[error("failed to encode click payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Compiled element templates, shared by every session.
#[derive(Debug)]
pub struct Markup {
    env: Environment<'static>,
}

impl Markup {
    /// Compile the element templates.
    pub fn new() -> Result<Self, MarkupError> {
        let mut env = Environment::new();
        // The `.html` suffix turns on auto-escaping.
        env.add_template("text.html", TEXT_TEMPLATE)?;
        env.add_template("button.html", BUTTON_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Markup of a text label.
    pub fn text(&self, id: &ElementId, content: &str) -> Result<String, MarkupError> {
        let html = self
            .env
            .get_template("text.html")?
            .render(context! { id => id.as_str(), content => content })?;
        Ok(html)
    }

    /// Markup of a button that reports `clicked` for its ID. The label is
    /// the ID itself.
    pub fn button(&self, id: &ElementId) -> Result<String, MarkupError> {
        let notify = serde_json::to_string(&Event::clicked(id))?;
        let html = self
            .env
            .get_template("button.html")?
            .render(context! { id => id.as_str(), notify => notify })?;
        Ok(html)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn text_markup_carries_id_and_content() {
        let markup = Markup::new().unwrap();
        let html = markup.text(&ElementId::from("count-text"), "0").unwrap();
        assert_eq!(html, r#"<div id="count-text">0</div>"#);
    }

    #[test]
    fn text_content_is_escaped() {
        let markup = Markup::new().unwrap();
        let html = markup
            .text(&ElementId::from("t"), "<script>alert(1)</script>")
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn button_notifies_click_for_its_id() {
        let markup = Markup::new().unwrap();
        let html = markup.button(&ElementId::from("Increment")).unwrap();
        assert!(html.starts_with(r#"<button id="Increment""#));
        assert!(html.ends_with(">Increment</button>"));
        assert!(html.contains("window.IMWEB_notify("));
        // Quotes inside the attribute are entity-encoded; the browser
        // decodes them before running the handler.
        assert!(html.contains("&quot;clicked&quot;") || html.contains("&#34;clicked&#34;"));
        assert!(!html.contains(r#""clicked""#));
    }
}
