//! Browser wiring: event listeners and the per-frame loop.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, EventTarget, MouseEvent, Window, window};

use crate::app::App;
use crate::config::SiteConfig;
use crate::geom::{Point, Viewport};
use crate::prefs::LocalStore;
use crate::sound::{Cue, WebAudioBackend};
use crate::view::{SiteView, TARGET_CLASS, TARGET_ID_ATTR, all};

type WebApp = App<LocalStore, WebAudioBackend>;

struct Site {
    app: WebApp,
    view: SiteView,
    loop_started: bool,
}

impl Site {
    fn frame(&mut self, now: f64) {
        let viewport = window().map(|w| viewport_of(&w)).unwrap_or_default();
        self.app.frame(now, viewport);
        if let Err(e) = self.view.render(&self.app, now) {
            log::debug!("render skipped: {e:?}");
        }
    }
}

fn performance_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn viewport_of(win: &Window) -> Viewport {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
    let fallback = Viewport::default();
    Viewport {
        width: dim(win.inner_width()).unwrap_or(fallback.width),
        height: dim(win.inner_height()).unwrap_or(fallback.height),
    }
}

fn pointer_of(evt: &MouseEvent) -> Point {
    Point::new(evt.client_x() as f64, evt.client_y() as f64)
}

/// Nearest ancestor-or-self of the event target matching `selector`.
fn closest(evt: &MouseEvent, selector: &str) -> Option<Element> {
    evt.target()?
        .dyn_into::<Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}

fn on_mouse(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(MouseEvent) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(MouseEvent)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Runs `f` against the site unless it is already borrowed by another callback.
fn with_site(site: &Rc<RefCell<Site>>, f: impl FnOnce(&mut Site)) {
    match site.try_borrow_mut() {
        Ok(mut s) => f(&mut s),
        Err(_) => log::debug!("site busy; event dropped"),
    }
}

pub fn start(config: SiteConfig) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let app = App::new(
        config,
        LocalStore::from_window(),
        WebAudioBackend,
        StdRng::from_entropy(),
    );
    let view = SiteView::mount(&doc, &app)?;
    let site = Rc::new(RefCell::new(Site {
        app,
        view,
        loop_started: false,
    }));

    // Pointer: cursor, trail, press state
    {
        let s = site.clone();
        on_mouse(&win, "mousemove", move |evt| {
            with_site(&s, |site| site.app.pointer_moved(pointer_of(&evt), performance_now()));
        })?;
        let s = site.clone();
        on_mouse(&win, "mousedown", move |_| with_site(&s, |site| site.app.pointer_down()))?;
        let s = site.clone();
        on_mouse(&win, "mouseup", move |_| with_site(&s, |site| site.app.pointer_up()))?;
    }

    // Delegated sound directives
    {
        let s = site.clone();
        on_mouse(&doc, "mouseover", move |evt| {
            if closest(&evt, "[data-sound=\"hover\"]").is_some() {
                with_site(&s, |site| site.app.play_cue(Cue::Hover));
            }
        })?;
        let s = site.clone();
        on_mouse(&doc, "click", move |evt| {
            if closest(&evt, "[data-sound=\"click\"]").is_some() {
                with_site(&s, |site| site.app.play_cue(Cue::Click));
            }
        })?;
    }

    // Target hits, delegated from the game layer
    if let Some(layer) = doc.get_element_by_id("game-container") {
        let s = site.clone();
        on_mouse(&layer, "click", move |evt| {
            let Some(el) = closest(&evt, &format!(".{TARGET_CLASS}")) else {
                return;
            };
            evt.stop_propagation();
            let Some(id) = el
                .get_attribute(TARGET_ID_ATTR)
                .and_then(|v| v.parse().ok())
            else {
                return;
            };
            let at = pointer_of(&evt);
            with_site(&s, |site| {
                site.app.shoot(id, at, performance_now());
            });
        })?;
    }

    // Settings widgets
    if let Some(btn) = doc.get_element_by_id("game-toggle") {
        let s = site.clone();
        on_mouse(&btn, "click", move |_| {
            with_site(&s, |site| {
                site.app.toggle_game(performance_now());
            });
        })?;
    }
    if let Some(btn) = doc.get_element_by_id("sound-toggle") {
        let s = site.clone();
        on_mouse(&btn, "click", move |_| {
            with_site(&s, |site| {
                let enabled = site.app.toggle_sound();
                site.view.apply_sound(enabled);
            });
        })?;
    }
    if let Some(btn) = doc.get_element_by_id("theme-toggle") {
        let s = site.clone();
        on_mouse(&btn, "click", move |_| {
            with_site(&s, |site| {
                let theme = site.app.toggle_theme();
                site.view.apply_theme(theme);
            });
        })?;
    }
    for swatch in all(&doc, ".color-swatch") {
        let Some(color) = swatch.get_attribute("data-color") else {
            continue;
        };
        let s = site.clone();
        on_mouse(&swatch, "click", move |_| {
            with_site(&s, |site| {
                site.app.set_accent(&color);
                site.view.apply_accent(&color);
            });
        })?;
    }
    for btn in all(&doc, ".lang-btn") {
        let Some(lang) = btn.get_attribute("data-lang") else {
            continue;
        };
        let s = site.clone();
        on_mouse(&btn, "click", move |_| {
            with_site(&s, |site| {
                site.app.set_language(&lang);
                site.view.apply_language(&lang);
            });
        })?;
    }

    start_frame_loop(site);
    log::info!("portfolio effects started");
    Ok(())
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(cb: &FrameCallback) {
    if let (Some(w), Some(cb)) = (window(), cb.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

/// Runs `Site::frame` on every animation frame. A second call is ignored.
fn start_frame_loop(site: Rc<RefCell<Site>>) {
    {
        let mut s = site.borrow_mut();
        if s.loop_started {
            return;
        }
        s.loop_started = true;
    }
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        with_site(&site, |s| s.frame(ts));
        request_frame(&f);
    }) as Box<dyn FnMut(f64)>));
    request_frame(&g);
}
