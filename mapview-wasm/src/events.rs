use std::cell::RefCell;
use std::rc::Rc;

use mapview_core::shortcuts::{KeyPress, command_for};
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlElement, HtmlInputElement, KeyboardEvent, PopStateEvent};

use crate::app::filter_change;
use crate::constants::*;
use crate::leaflet::MouseEvent;
use crate::state::App;
use crate::ui;
use crate::utils::set_display;

fn on_click(
    app: &Rc<RefCell<App>>,
    id: &str,
    f: impl Fn(&mut App) + 'static,
) -> Result<(), JsValue> {
    let doc = app.borrow().document.clone();
    let Some(btn) = doc.get_element_by_id(id) else {
        log::debug!("No #{id} on this page");
        return Ok(());
    };
    let btn: HtmlElement = btn.dyn_into()?;
    let st = app.clone();
    let onclick = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |e: Event| {
        e.stop_propagation();
        if let Ok(mut s) = st.try_borrow_mut() {
            f(&mut *s);
        }
    }));
    btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
    onclick.forget();
    Ok(())
}

fn target_element(e: &Event) -> Option<Element> {
    e.target()?.dyn_into::<Element>().ok()
}

fn is_typing(e: &Event) -> bool {
    target_element(e).is_some_and(|el| {
        matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
            || el.get_attribute("contenteditable").is_some()
    })
}

/// Register every long-lived DOM and map listener.
pub fn attach_ui(state: Rc<RefCell<App>>) -> Result<(), JsValue> {
    let (doc, window, map) = {
        let s = state.borrow();
        (s.document.clone(), s.window.clone(), s.surface.map().clone())
    };

    // Toolbar buttons
    on_click(&state, TOGGLE_SIDEBAR_BTN, |s| {
        s.set_sidebar(s.session.sidebar().toggled())
    })?;
    on_click(&state, TOGGLE_SOUND_BTN, App::toggle_sound)?;
    on_click(&state, TOGGLE_MARKERS_BTN, App::toggle_markers)?;
    on_click(&state, TOGGLE_FILTERS_BTN, App::toggle_filter_panel)?;
    on_click(&state, MEASURE_BTN, App::toggle_measure)?;
    on_click(&state, TOGGLE_BLURB_BTN, |s| ui::toggle_blurb(&s.document, None))?;
    on_click(&state, TOGGLE_COORDS_BTN, |s| ui::toggle_coords(&s.document))?;
    on_click(&state, CLOSE_HELP_BTN, |s| ui::toggle_help(&s.document, Some(false)))?;

    // Theme switch
    if let Some(cb) = doc.get_element_by_id(THEME_CHECKBOX) {
        let cb: HtmlElement = cb.dyn_into()?;
        let st = state.clone();
        let onchange = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            if let Ok(mut s) = st.try_borrow_mut() {
                s.toggle_theme();
            }
        }));
        cb.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();
    }

    // Sidebar tree, delegated to the list
    if let Some(list) = doc.get_element_by_id(MAP_LIST) {
        let list: HtmlElement = list.dyn_into()?;
        let st = state.clone();
        let onclick = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |e: Event| {
            let Some(item) = target_element(&e)
                .and_then(|t| t.closest(".folder-header, .map-item").ok().flatten())
            else {
                return;
            };
            if item.class_list().contains("folder-header") {
                if let Some(li) = item.parent_element() {
                    let _ = li.class_list().toggle("closed");
                }
                return;
            }
            let Some(id) = item.get_attribute("data-map-id") else {
                return;
            };
            let Ok(mut s) = st.try_borrow_mut() else {
                return;
            };
            match item.get_attribute("data-action").as_deref() {
                Some("load") => s.load_map(&id),
                Some("soon") => s.announce_coming_soon(&id),
                _ => {}
            }
        }));
        list.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();

        let st = state.clone();
        let ondblclick = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |e: Event| {
            let Some(header) = target_element(&e)
                .and_then(|t| t.closest(".folder-header").ok().flatten())
            else {
                return;
            };
            let (Some(li), Ok(mut s)) = (header.parent_element(), st.try_borrow_mut()) else {
                return;
            };
            let Some(id) = li.get_attribute("data-map-id") else {
                return;
            };
            match header.get_attribute("data-action").as_deref() {
                Some("load") => s.load_map(&id),
                Some("soon") => s.announce_coming_soon(&id),
                _ => {}
            }
        }));
        list.set_ondblclick(Some(ondblclick.as_ref().unchecked_ref()));
        ondblclick.forget();
    }

    // Filter panel
    if let Some(panel) = doc.get_element_by_id(FILTER_PANEL) {
        let panel: HtmlElement = panel.dyn_into()?;
        let st = state.clone();
        let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |e: Event| {
            let Some(input) = target_element(&e).and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let change = filter_change(
                &input.id(),
                &input.class_name(),
                &input.value(),
                input.get_attribute("data-group"),
                input.checked(),
            );
            if let (Some(change), Ok(mut s)) = (change, st.try_borrow_mut()) {
                s.apply_filter(&change);
            }
        }));
        panel.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        let onclick = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |e: Event| {
            e.stop_propagation();
            let Some(t) = target_element(&e) else {
                return;
            };
            // The group checkbox sits inside the header; only the header itself folds.
            if t.tag_name() == "INPUT" {
                return;
            }
            let group = t
                .closest(".filter-group-header")
                .ok()
                .flatten()
                .and_then(|h| h.closest(".filter-group").ok().flatten());
            if let Some(group) = group {
                let _ = group.class_list().toggle("closed");
            }
        }));
        panel.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    // Search
    if let Some(input) = doc.get_element_by_id(SEARCH_INPUT) {
        let input: HtmlInputElement = input.dyn_into()?;
        let st = state.clone();
        let field = input.clone();
        let oninput = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            if let Ok(mut s) = st.try_borrow_mut() {
                s.search(&field.value());
            }
        }));
        input.set_oninput(Some(oninput.as_ref().unchecked_ref()));
        oninput.forget();
    }
    if let Some(results) = doc.get_element_by_id(SEARCH_RESULTS) {
        let results: HtmlElement = results.dyn_into()?;
        let st = state.clone();
        let onclick = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |e: Event| {
            e.stop_propagation();
            let record = target_element(&e)
                .and_then(|t| t.closest("[data-record]").ok().flatten())
                .and_then(|el| el.get_attribute("data-record"))
                .and_then(|r| r.parse::<usize>().ok());
            if let (Some(record), Ok(mut s)) = (record, st.try_borrow_mut()) {
                s.focus_hit(record);
            }
        }));
        results.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    // Keyboard
    {
        let st = state.clone();
        let keydown = Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
            let Ok(mut s) = st.try_borrow_mut() else {
                return;
            };
            let key = e.key();
            let press = KeyPress {
                key: &key,
                command: e.ctrl_key() || e.meta_key(),
            };
            let ui = s.ui_state(is_typing(&e));
            if let Some(cmd) = command_for(press, &ui) {
                e.prevent_default();
                s.run(cmd);
            }
        }));
        doc.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Back / forward
    {
        let st = state.clone();
        let onpopstate = Closure::<dyn FnMut(PopStateEvent)>::wrap(Box::new(move |e: PopStateEvent| {
            if let Ok(mut s) = st.try_borrow_mut() {
                s.on_pop(&e.state());
            }
        }));
        window.set_onpopstate(Some(onpopstate.as_ref().unchecked_ref()));
        onpopstate.forget();
    }

    // Map pointer: coordinate readout and dismissing panels
    {
        let st = state.clone();
        let mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            if let Ok(mut s) = st.try_borrow_mut() {
                s.pointer_moved(e.position());
            }
        }));
        map.on("mousemove", mousemove.as_ref().unchecked_ref());
        mousemove.forget();

        let st = state.clone();
        let dblclick = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            if let Ok(mut s) = st.try_borrow_mut() {
                s.lock_coords(e.position());
            }
        }));
        map.on("dblclick", dblclick.as_ref().unchecked_ref());
        dblclick.forget();

        let st = state.clone();
        let click = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_e: MouseEvent| {
            if let Ok(s) = st.try_borrow() {
                ui::toggle_blurb(&s.document, Some(false));
                set_display(&s.document, SEARCH_RESULTS, false, "block");
                if !s.session.measure().is_active() {
                    ui::set_filter_panel(&s.document, false);
                }
            }
        }));
        map.on("click", click.as_ref().unchecked_ref());
        click.forget();
    }
    Ok(())
}
