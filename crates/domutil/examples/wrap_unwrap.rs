//! Wrap a list's items, watch one of them, then unwrap and see the
//! one-shot removal callback fire.
//!
//! Run with: `cargo run -p domutil --example wrap_unwrap`

use domutil::{
    create_element, find_all, on_remove, unwrap_elements, wrap_elements, Document, Result,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut doc = Document::new_page("https://example.test/demo");
    let body = doc.body();

    let list = create_element(
        &mut doc,
        "<ul id=\"menu\"><li>home</li><li>docs</li><li>about</li></ul>",
    )?;
    doc.append_child(body, list)?;

    let items = find_all(&doc, Some(list), "li")?;
    println!("found {} items", items.len());

    let wrapper = wrap_elements(&mut doc, items.clone(), "nav")?;
    doc.append_child(list, wrapper)?;
    println!("wrapped into <nav> with {} children", doc.children(wrapper).len());

    let mut handler = on_remove(&mut doc, items[0], || {
        println!("first item left its parent");
    })?;

    unwrap_elements(&mut doc, list, wrapper)?;
    handler.deliver(&mut doc)?;

    println!(
        "list restored, {} items, handler fired: {}",
        doc.children(list).len(),
        handler.has_fired()
    );
    Ok(())
}
