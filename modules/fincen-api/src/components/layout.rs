use dioxus::prelude::*;

use fincen_common::View;

use crate::templates::render_page;

/// Dashboard layout with the view selector in the sidebar.
#[allow(non_snake_case)]
#[component]
pub fn Layout(title: String, active: String, children: Element) -> Element {
    let full_title = format!("{title} · FinCEN Graph");
    rsx! {
        head {
            meta { charset: "utf-8" }
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            title { "{full_title}" }
            script { src: "https://cdn.tailwindcss.com" }
            script { src: "https://cdn.jsdelivr.net/npm/chart.js@4" }
        }
        body { class: "flex min-h-screen bg-gray-50 font-sans text-gray-900",
            div { class: "w-56 bg-gray-900 text-white flex flex-col shrink-0 fixed inset-y-0 left-0 z-50",
                div { class: "px-5 py-4 text-lg font-semibold border-b border-gray-700",
                    "FinCEN Graph"
                }
                nav { class: "flex flex-col py-3",
                    for view in View::all() {
                        {
                            let class = if view.slug() == active {
                                "block px-5 py-2.5 text-sm text-white bg-blue-600"
                            } else {
                                "block px-5 py-2.5 text-sm text-gray-400 hover:text-white hover:bg-gray-700 transition-colors"
                            };
                            let href = format!("/{}", view.slug());
                            let label = view.label();
                            rsx! { a { href: href, class: class, "{label}" } }
                        }
                    }
                }
            }
            div { class: "ml-56 flex-1 min-w-0",
                {children}
            }
        }
    }
}

#[allow(non_snake_case)]
#[component]
fn ErrorPage(view: String, title: String, message: String) -> Element {
    rsx! {
        Layout { title: title.clone(), active: view,
            div { class: "max-w-5xl mx-auto p-6",
                h2 { class: "text-xl font-semibold mb-4", "{title}" }
                { error_panel(&message) }
            }
        }
    }
}

/// Red inline panel used for query failures.
pub fn error_panel(message: &str) -> Element {
    rsx! {
        div { class: "bg-red-50 border border-red-200 text-red-800 text-sm px-3 py-2 rounded mb-4 font-mono whitespace-pre-wrap",
            "{message}"
        }
    }
}

/// Full page showing a failure for `view`.
pub fn render_error(view: View, message: String) -> String {
    render_page(
        ErrorPage,
        ErrorPageProps {
            view: view.slug().to_string(),
            title: view.label().to_string(),
            message,
        },
    )
}
