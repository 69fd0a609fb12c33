use dioxus::prelude::{Element, VirtualDom};

/// Build a page from its root component and render the full HTML document.
///
/// Pages are rendered once per request; nothing is kept between renders.
pub fn render_page<P: Clone + 'static>(root: fn(P) -> Element, props: P) -> String {
    let mut dom = VirtualDom::new_with_props(root, props);
    dom.rebuild_in_place();
    format!(
        "<!DOCTYPE html><html lang=\"en\">{}</html>",
        dioxus::ssr::render(&dom)
    )
}
