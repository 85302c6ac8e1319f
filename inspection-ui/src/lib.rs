//! Visit planner view for WebAssembly hosts.

pub mod filter;

#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use crate::filter::{visible_entries, PlannerFilter};
    use crate::styles;
    use chrono::Utc;
    use inspection_core::views::visit_hint;
    use inspection_core::{BucketEntry, Category, CategoryCounts, PlannerSnapshot};
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen::prelude::*;
    use web_sys::{console, Document, Element, HtmlInputElement, Window};
    use yew::events::InputEvent;
    use yew::prelude::*;
    use yew::TargetCast;

    #[derive(Properties, PartialEq)]
    pub struct PlannerViewProps {
        pub snapshot: PlannerSnapshot,
    }

    #[function_component(PlannerView)]
    fn planner_view(props: &PlannerViewProps) -> Html {
        let snapshot = &props.snapshot;

        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let filter = use_state(PlannerFilter::default);
        let filter_value = (*filter).clone();
        let entries = visible_entries(&snapshot.categories, &filter_value);

        let on_search = {
            let filter = filter.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                let mut next = (*filter).clone();
                next.query = input.value();
                filter.set(next);
            })
        };

        let on_clear = {
            let filter = filter.clone();
            Callback::from(move |_| filter.set(PlannerFilter::default()))
        };

        html! {
            <div class="planner-root">
                <section class="planner-cards" role="group" aria-label="Filter schools by status">
                    { render_total(&snapshot.counts, filter_value.category.is_none(), on_clear.clone()) }
                    { for Category::ALL.into_iter().map(|category| render_card(category, &snapshot.counts, filter.clone())) }
                </section>
                <section class="planner-list" aria-live="polite">
                    <header class="planner-toolbar">
                        <input
                            type="search"
                            placeholder="Search schools"
                            value={filter_value.query.clone()}
                            oninput={on_search}
                            aria-label="Search schools by name"
                        />
                        <button type="button" onclick={on_clear}>{"Reset"}</button>
                    </header>
                    <ul class="planner-schools">
                        {
                            if entries.is_empty() {
                                html! { <li class="planner-empty">{"No schools match the current filter."}</li> }
                            } else {
                                html! { for entries.into_iter().map(|(category, entry)| render_school(category, entry)) }
                            }
                        }
                    </ul>
                </section>
            </div>
        }
    }

    fn render_total(counts: &CategoryCounts, active: bool, onclick: Callback<MouseEvent>) -> Html {
        html! {
            <button
                type="button"
                class={classes!("planner-card", active.then_some("is-active"))}
                onclick={onclick}
            >
                <span class="planner-card-count">{ counts.all_schools }</span>
                <span class="planner-card-label">{"All schools"}</span>
            </button>
        }
    }

    fn render_card(
        category: Category,
        counts: &CategoryCounts,
        filter: UseStateHandle<PlannerFilter>,
    ) -> Html {
        let is_active = filter.category == Some(category);
        let onclick = Callback::from(move |_| {
            let mut next = (*filter).clone();
            next.toggle(category);
            filter.set(next);
        });
        html! {
            <button
                type="button"
                class={classes!("planner-card", is_active.then_some("is-active"))}
                style={format!("--category-color: {}", category.color())}
                title={category.tooltip()}
                onclick={onclick}
            >
                <span class="planner-card-count">{ counts.get(category) }</span>
                <span class="planner-card-label">{ category.label() }</span>
            </button>
        }
    }

    fn render_school(category: Category, entry: &BucketEntry) -> Html {
        let hint = visit_hint(entry, category, Utc::now());
        html! {
            <li class="planner-school" style={format!("--category-color: {}", category.color())}>
                <span class="planner-dot" aria-hidden="true"></span>
                <div class="planner-school-body">
                    <span class="planner-school-name">{ entry.org_unit_name().to_string() }</span>
                    <span class="planner-school-hint">{ hint }</span>
                </div>
                <span class="planner-status">{ entry.status_label().to_string() }</span>
            </li>
        }
    }

    #[wasm_bindgen]
    pub fn mount_planner_view(selector: &str, snapshot: JsValue) -> Result<(), JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;
        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Invalid selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("No element matches the selector"))?;
        let snapshot: PlannerSnapshot = from_value(snapshot)?;
        yew::Renderer::<PlannerView>::with_root_and_props(target, PlannerViewProps { snapshot })
            .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_planner_view;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_planner_view(_: &str, _: wasm_bindgen::JsValue) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "inspection-ui only supports the wasm32 target",
    ))
}
