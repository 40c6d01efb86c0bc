//! Page-level helpers: positions, identifiers, event shims, and the
//! element-construction passthrough.

use dom::{Document, DomError, DomRect, Event, NodeId, Result};
use serde::{Deserialize, Serialize};

/// Vertical extent of an element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub bottom: f64,
    pub height: f64,
}

/// Element position in document-coordinate space: the viewport-relative
/// layout box shifted by the current vertical scroll offset. An element
/// the host never laid out reports a zero rect, so its position collapses
/// to the scroll offset itself.
pub fn get_pos(doc: &Document, el: NodeId) -> Result<Position> {
    let node = doc.node(el)?;
    if !node.is_element() {
        return Err(DomError::NotAnElement(el));
    }

    let rect = node.layout.unwrap_or_else(DomRect::zero);
    let scroll = doc.viewport.scroll_offset();
    Ok(Position {
        top: rect.y + scroll,
        bottom: rect.y + rect.height + scroll,
        height: rect.height,
    })
}

/// Location-derived identifier of the document.
pub fn uri(doc: &Document) -> String {
    doc.location().to_string()
}

/// Document-attribute-derived identifier: the href of the first
/// `link[rel=canonical]`, falling back to [`uri`].
pub fn page_uri(doc: &Document) -> Result<String> {
    for link in doc.query_selector_all("link[rel=canonical]")? {
        if let Some(href) = doc.attr(link, "href") {
            return Ok(href.to_string());
        }
    }
    Ok(uri(doc))
}

/// Suppress the event's default action. Cancelable events get the real
/// cancellation; for the rest only the legacy flag is cleared.
pub fn prevent_default(event: &mut Event) {
    if event.cancelable {
        event.default_prevented = true;
    }
    event.return_value = false;
}

/// Parse a markup fragment into a detached node. Passthrough to the host's
/// fragment parser; no logic of its own.
pub fn create_element(doc: &mut Document, markup: &str) -> Result<NodeId> {
    dom::parse_fragment(doc, markup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Viewport;

    #[test]
    fn get_pos_adds_scroll_offset() {
        let mut doc = Document::new_page("about:blank");
        let body = doc.body();
        let el = doc.create_element("div");
        doc.append_child(body, el).unwrap();
        doc.set_layout(el, DomRect::new(0.0, 40.0, 300.0, 60.0)).unwrap();
        doc.viewport = Viewport {
            page_y_offset: Some(100.0),
            ..Viewport::default()
        };

        let pos = get_pos(&doc, el).unwrap();
        assert_eq!(pos.top, 140.0);
        assert_eq!(pos.bottom, 200.0);
        assert_eq!(pos.height, 60.0);
    }

    #[test]
    fn get_pos_falls_back_through_scroll_sources() {
        let mut doc = Document::new_page("about:blank");
        let el = doc.create_element("div");
        doc.set_layout(el, DomRect::new(0.0, 10.0, 10.0, 10.0)).unwrap();
        doc.viewport = Viewport {
            page_y_offset: None,
            doc_scroll_top: Some(0.0),
            body_scroll_top: Some(25.0),
        };

        assert_eq!(get_pos(&doc, el).unwrap().top, 35.0);
    }

    #[test]
    fn get_pos_without_layout_is_zero_rect() {
        let mut doc = Document::new_page("about:blank");
        let el = doc.create_element("div");
        let pos = get_pos(&doc, el).unwrap();
        assert_eq!(pos.top, 0.0);
        assert_eq!(pos.height, 0.0);

        let text = doc.create_text("x");
        assert!(matches!(
            get_pos(&doc, text),
            Err(DomError::NotAnElement(_))
        ));
    }

    #[test]
    fn page_uri_prefers_canonical_link() {
        let mut doc = Document::new_page("https://example.test/long?session=1");
        assert_eq!(uri(&doc), "https://example.test/long?session=1");
        assert_eq!(page_uri(&doc).unwrap(), "https://example.test/long?session=1");

        let head = doc.head();
        let link = doc.create_element_with_attrs(
            "link",
            &[("rel", "canonical"), ("href", "https://example.test/long")],
        );
        doc.append_child(head, link).unwrap();
        assert_eq!(page_uri(&doc).unwrap(), "https://example.test/long");
    }

    #[test]
    fn prevent_default_respects_cancelable() {
        let mut cancelable = Event::new("click", true);
        prevent_default(&mut cancelable);
        assert!(cancelable.default_prevented);
        assert!(!cancelable.return_value);

        let mut rigid = Event::new("scroll", false);
        prevent_default(&mut rigid);
        assert!(!rigid.default_prevented);
        assert!(!rigid.return_value);
    }

    #[test]
    fn create_element_parses_markup() {
        let mut doc = Document::new_page("about:blank");
        let node = create_element(&mut doc, "<div class=\"card\"><p>hi</p></div>").unwrap();
        assert_eq!(doc.tag_name(node), Some("div"));
        assert_eq!(doc.attr(node, "class"), Some("card"));
        assert!(create_element(&mut doc, "<broken").is_err());
    }
}
