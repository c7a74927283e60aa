use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mapview_core::constants::{AMBIENT_FADE_MS, AMBIENT_VOLUME};
use mapview_core::prefs::{Preferences, Theme};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlAudioElement};

struct Track {
    el: HtmlAudioElement,
    /// Bumped by every fade; an older fade loop stops when it sees a newer one.
    fade: Rc<Cell<u32>>,
}

/// The per-theme ambient loops.
pub struct Ambient {
    tracks: Vec<(Theme, Track)>,
}

impl Ambient {
    pub fn new(document: &Document) -> Self {
        let tracks = [Theme::Light, Theme::Dark]
            .into_iter()
            .filter_map(|theme| {
                let el: HtmlAudioElement = document
                    .get_element_by_id(theme.ambient_track())?
                    .dyn_into()
                    .ok()?;
                el.set_volume(0.0);
                Some((
                    theme,
                    Track {
                        el,
                        fade: Rc::new(Cell::new(0)),
                    },
                ))
            })
            .collect();
        Ambient { tracks }
    }

    /// Fade the track of the current theme in and the other one out, or both
    /// out when sound is off.
    pub fn sync(&self, prefs: &Preferences) {
        for (theme, track) in &self.tracks {
            let target = if prefs.sound_enabled && *theme == prefs.theme {
                AMBIENT_VOLUME
            } else {
                0.0
            };
            fade(track, target);
        }
    }
}

fn play(el: &HtmlAudioElement) {
    let Ok(promise) = el.play() else {
        return;
    };
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = JsFuture::from(promise).await {
            log::warn!("Audio playback blocked: {e:?}");
        }
    });
}

fn fade(track: &Track, target: f64) {
    let el = track.el.clone();
    let token = track.fade.get().wrapping_add(1);
    track.fade.set(token);
    if target > 0.0 && el.paused() {
        el.set_volume(0.0);
        play(&el);
    } else if target == 0.0 && el.paused() {
        el.set_volume(0.0);
        let _ = el.pause();
        return;
    }
    let current = track.fade.clone();
    let from = el.volume();
    let started = js_sys::Date::now();

    type RafClosure = Closure<dyn FnMut(f64)>;
    let f: Rc<RefCell<Option<RafClosure>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        if current.get() != token {
            let _ = f.borrow_mut().take();
            return;
        }
        let t = ((js_sys::Date::now() - started) / AMBIENT_FADE_MS).clamp(0.0, 1.0);
        el.set_volume(from + (target - from) * t);
        if t >= 1.0 {
            if target == 0.0 {
                let _ = el.pause();
            }
            let _ = f.borrow_mut().take();
            return;
        }
        if let (Some(window), Some(cb)) = (web_sys::window(), f.borrow().as_ref()) {
            let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(window), Some(cb)) = (web_sys::window(), g.borrow().as_ref()) {
        let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
