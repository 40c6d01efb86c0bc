//! Element lookup and traversal.
//!
//! Absence is never an error here: `find` returns `None`, `find_all` an
//! empty vec. The only argument that is validated is `closest`'s selector,
//! which fails fast before any ascent so caller mistakes are not
//! confusable with "no match found".

use dom::{Document, DomError, NodeId, Result};

/// First element matching `selector`, searching the whole document when
/// `scope` is `None`, otherwise `scope`'s descendants.
pub fn find(doc: &Document, scope: Option<NodeId>, selector: &str) -> Result<Option<NodeId>> {
    match scope {
        Some(root) => doc.query_selector_from(root, selector),
        None => doc.query_selector(selector),
    }
}

/// All elements matching `selector`, document order; empty on no match.
pub fn find_all(doc: &Document, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>> {
    match scope {
        Some(root) => doc.query_selector_all_from(root, selector),
        None => doc.query_selector_all(selector),
    }
}

/// Would `node` be selected by `selector`?
///
/// Delegates to the host's native match test when available. On hosts
/// without one, emulates it: query the node's parent (or the document for
/// a detached node) for everything matching `selector` and scan the
/// result for identity with `node`.
pub fn matches(doc: &Document, node: NodeId, selector: &str) -> Result<bool> {
    if doc.caps().native_matches {
        return doc.matches_selector(node, selector);
    }

    let candidates = match doc.parent(node) {
        Some(parent) => doc.query_selector_all_from(parent, selector)?,
        None => doc.query_selector_all(selector)?,
    };
    Ok(candidates.into_iter().any(|candidate| candidate == node))
}

/// Nearest ancestor-or-self of `node` matching `selector`.
///
/// `node` itself is tested first; the ascent stops (with `None`) after
/// testing the root `html` element. An empty selector is an
/// invalid-argument error raised before any ascent.
pub fn closest(doc: &Document, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
    if selector.trim().is_empty() {
        return Err(DomError::InvalidSelector(selector.to_string()));
    }

    let mut cursor = Some(node);
    while let Some(id) = cursor {
        let n = doc.node(id)?;
        if n.node_type == dom::NodeType::Document {
            break;
        }
        if n.is_element() && matches(doc, id, selector)? {
            return Ok(Some(id));
        }
        if n.tag_name() == Some("html") {
            break;
        }
        cursor = doc.parent(id);
    }
    Ok(None)
}

/// First child of `parent` that is an element, skipping text and comment
/// nodes; `None` when there is no element child.
pub fn get_first_child_element(doc: &Document, parent: NodeId) -> Option<NodeId> {
    doc.children(parent)
        .into_iter()
        .find(|&child| doc.is_element(child))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new_page("about:blank");
        let body = doc.body();
        let section = doc.create_element_with_attrs("section", &[("class", "content")]);
        let article = doc.create_element_with_attrs("article", &[("id", "story")]);
        let p = doc.create_element_with_attrs("p", &[("class", "lede")]);
        doc.append_child(body, section).unwrap();
        doc.append_child(section, article).unwrap();
        doc.append_child(article, p).unwrap();
        (doc, section, article, p)
    }

    #[test]
    fn find_whole_document_or_scoped() {
        let (doc, section, article, p) = sample_doc();
        assert_eq!(find(&doc, None, "article").unwrap(), Some(article));
        assert_eq!(find(&doc, Some(section), "p").unwrap(), Some(p));
        assert_eq!(find(&doc, Some(p), "article").unwrap(), None);
        assert_eq!(find(&doc, None, ".missing").unwrap(), None);
    }

    #[test]
    fn find_all_ordered_and_empty_on_no_match() {
        let (mut doc, section, _, p) = sample_doc();
        let p2 = doc.create_element("p");
        doc.append_child(section, p2).unwrap();

        assert_eq!(find_all(&doc, None, "p").unwrap(), vec![p, p2]);
        assert_eq!(find_all(&doc, Some(section), "p").unwrap(), vec![p, p2]);
        assert!(find_all(&doc, None, "h1").unwrap().is_empty());
    }

    #[test]
    fn matches_native_and_polyfill_agree() {
        let (mut doc, _, article, p) = sample_doc();

        for native in [true, false] {
            doc.set_native_matches(native);
            assert!(matches(&doc, article, "#story").unwrap());
            assert!(matches(&doc, p, "article > .lede").unwrap());
            assert!(!matches(&doc, p, "section > .lede").unwrap());
        }
    }

    #[test]
    fn matches_polyfill_scans_document_for_detached_nodes() {
        let mut doc = Document::new_page("about:blank");
        doc.set_native_matches(false);
        let loner = doc.create_element_with_attrs("div", &[("class", "loner")]);
        // Detached and not in the document: candidates never contain it.
        assert!(!matches(&doc, loner, ".loner").unwrap());
    }

    #[test]
    fn closest_matches_self_then_ancestors() {
        let (doc, section, article, p) = sample_doc();
        assert_eq!(closest(&doc, p, ".lede").unwrap(), Some(p));
        assert_eq!(closest(&doc, p, "article").unwrap(), Some(article));
        assert_eq!(closest(&doc, p, ".content").unwrap(), Some(section));
        assert_eq!(closest(&doc, p, "html").unwrap(), Some(doc.html_element()));
        assert_eq!(closest(&doc, p, "nav").unwrap(), None);
    }

    #[test]
    fn closest_rejects_empty_selector_before_ascending() {
        let (doc, _, _, p) = sample_doc();
        assert!(matches!(
            closest(&doc, p, ""),
            Err(DomError::InvalidSelector(_))
        ));
        assert!(matches!(
            closest(&doc, p, "   "),
            Err(DomError::InvalidSelector(_))
        ));

        // Same contract for a head-resident node.
        let mut doc = Document::new_page("about:blank");
        let head = doc.head();
        let meta = doc.create_element("meta");
        doc.append_child(head, meta).unwrap();
        assert!(matches!(
            closest(&doc, meta, ""),
            Err(DomError::InvalidSelector(_))
        ));
        assert_eq!(closest(&doc, meta, "head").unwrap(), Some(head));
    }

    #[test]
    fn first_child_element_skips_text() {
        let (mut doc, section, article, _) = sample_doc();
        let text = doc.create_text("  leading ");
        doc.insert_before(section, text, Some(article)).unwrap();
        let comment = doc.create_comment("x");
        doc.insert_before(section, comment, Some(article)).unwrap();

        assert_eq!(get_first_child_element(&doc, section), Some(article));

        let empty = doc.create_element("div");
        assert_eq!(get_first_child_element(&doc, empty), None);

        let text_only = doc.create_element("div");
        let t = doc.create_text("just text");
        doc.append_child(text_only, t).unwrap();
        assert_eq!(get_first_child_element(&doc, text_only), None);
    }
}
