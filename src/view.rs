//! DOM renderer. Reconciles page elements with [`App`] state once per frame.
//!
//! Optional page nodes (cursor, timeline, settings widgets) are looked up once
//! at mount; when one is absent its effect is skipped.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

use crate::app::App;
use crate::effects::{spotlight_origin, timeline_progress};
use crate::game::{EntityId, TargetState};
use crate::geom::{Point, Rect};
use crate::prefs::{KeyValueStore, Theme};
use crate::sound::AudioBackend;

#[wasm_bindgen(inline_js = "export function refresh_icons() { if (window.lucide) window.lucide.createIcons(); }")]
extern "C" {
    fn refresh_icons();
}

pub const TARGET_CLASS: &str = "game-target";
pub const TARGET_ID_ATTR: &str = "data-target-id";

const PLAY_ICON: &str = "<i data-lucide=\"play\"></i>";
const PAUSE_ICON: &str = "<i data-lucide=\"pause\"></i>";

// --- Element helpers -----------------------------------------------------------

fn style(el: &HtmlElement, prop: &str, value: &str) {
    el.style().set_property(prop, value).ok();
}

fn place(el: &HtmlElement, at: Point) {
    style(el, "left", &format!("{}px", at.x));
    style(el, "top", &format!("{}px", at.y));
}

fn by_id(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)?.dyn_into().ok()
}

fn first(doc: &Document, selector: &str) -> Option<HtmlElement> {
    doc.query_selector(selector).ok()??.dyn_into().ok()
}

pub(crate) fn all(doc: &Document, selector: &str) -> Vec<HtmlElement> {
    let Ok(list) = doc.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
        .collect()
}

fn rect_of(el: &Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect {
        left: r.left(),
        top: r.top(),
        width: r.width(),
        height: r.height(),
    }
}

fn show(el: &Option<HtmlElement>, visible: bool) {
    if let Some(el) = el {
        style(el, "display", if visible { "inline-block" } else { "none" });
    }
}

/// Keyed set of transient elements (targets, explosions, trail particles).
struct DomLayer {
    class: &'static str,
    nodes: HashMap<EntityId, HtmlElement>,
}

impl DomLayer {
    fn new(class: &'static str) -> Self {
        Self {
            class,
            nodes: HashMap::new(),
        }
    }

    fn node(
        &mut self,
        doc: &Document,
        parent: &Element,
        id: EntityId,
        id_attr: Option<&str>,
    ) -> Result<&HtmlElement, JsValue> {
        match self.nodes.entry(id) {
            Entry::Occupied(o) => Ok(&*o.into_mut()),
            Entry::Vacant(v) => {
                let el: HtmlElement = doc.create_element("div")?.dyn_into()?;
                el.class_list().add_1(self.class)?;
                if let Some(attr) = id_attr {
                    el.set_attribute(attr, &id.to_string())?;
                }
                parent.append_child(&el)?;
                Ok(&*v.insert(el))
            }
        }
    }

    /// Removes every element whose id is not in `live`.
    fn retain(&mut self, live: &HashSet<EntityId>) {
        self.nodes.retain(|id, el| {
            let keep = live.contains(id);
            if !keep {
                el.remove();
            }
            keep
        });
    }
}

// --- View ----------------------------------------------------------------------

pub struct SiteView {
    doc: Document,
    game_layer: Option<Element>,
    trail_layer: Option<Element>,
    targets: DomLayer,
    explosions: DomLayer,
    trail: DomLayer,
    banner: Option<(HtmlElement, f64)>,
    score: Option<HtmlElement>,
    high_score: Option<HtmlElement>,
    toggle: Option<HtmlElement>,
    cursor_dot: Option<HtmlElement>,
    cursor_outline: Option<HtmlElement>,
    floating: Vec<HtmlElement>,
    magnetic: Vec<HtmlElement>,
    spotlights: Vec<HtmlElement>,
    timeline: Option<HtmlElement>,
    timeline_fill: Option<HtmlElement>,
    shown_active: bool,
    shown_score: Option<u32>,
    shown_high: Option<u32>,
    last_pointer: Option<Point>,
}

impl SiteView {
    /// Builds the game controls and applies the saved preferences.
    pub fn mount<S: KeyValueStore, B: AudioBackend>(
        doc: &Document,
        app: &App<S, B>,
    ) -> Result<Self, JsValue> {
        let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
        mount_controls(doc, &body, app.session().high_score())?;

        let game_layer = doc.get_element_by_id("game-container");
        if game_layer.is_none() {
            log::debug!("#game-container missing; targets will not be drawn");
        }

        let view = Self {
            doc: doc.clone(),
            game_layer,
            trail_layer: Some(body.into()),
            targets: DomLayer::new(TARGET_CLASS),
            explosions: DomLayer::new("explosion"),
            trail: DomLayer::new("trail-particle"),
            banner: None,
            score: by_id(doc, "score-val"),
            high_score: by_id(doc, "highscore-val"),
            toggle: by_id(doc, "game-toggle"),
            cursor_dot: first(doc, ".cursor-dot"),
            cursor_outline: first(doc, ".cursor-outline"),
            floating: all(doc, ".floating-element"),
            magnetic: all(doc, ".magnetic-wrap"),
            spotlights: all(doc, ".spotlight"),
            timeline: first(doc, ".timeline"),
            timeline_fill: first(doc, ".timeline-progress"),
            shown_active: false,
            shown_score: None,
            shown_high: None,
            last_pointer: None,
        };

        let prefs = app.prefs();
        view.apply_theme(prefs.theme());
        if let Some(color) = prefs.accent_color() {
            view.apply_accent(color);
        }
        view.apply_language(prefs.language());
        view.apply_sound(app.sounds().is_enabled());
        Ok(view)
    }

    pub fn render<S: KeyValueStore, B: AudioBackend>(
        &mut self,
        app: &App<S, B>,
        now: f64,
    ) -> Result<(), JsValue> {
        self.render_game(app, now)?;
        self.render_hud(app, now)?;
        self.render_cursor(app, now);
        self.render_trail(app, now)?;
        self.render_timeline(app);
        Ok(())
    }

    fn render_game<S: KeyValueStore, B: AudioBackend>(
        &mut self,
        app: &App<S, B>,
        now: f64,
    ) -> Result<(), JsValue> {
        let Some(layer) = self.game_layer.as_ref() else {
            return Ok(());
        };
        let field = app.field();
        let grace = field.config().fade_grace_ms;

        let live: HashSet<EntityId> = field.targets().iter().map(|t| t.id).collect();
        self.targets.retain(&live);
        for t in field.targets() {
            let el = self.targets.node(&self.doc, layer, t.id, Some(TARGET_ID_ATTR))?;
            place(el, t.origin);
            let off = t.offset_at(now);
            let fade = t.fade_level(now, grace);
            style(
                el,
                "transform",
                &format!("translate({}px, {}px) scale({})", off.x, off.y, fade),
            );
            style(el, "opacity", &fade.to_string());
            if matches!(t.state, TargetState::Fading { .. }) {
                style(el, "pointer-events", "none");
            }
        }

        let live: HashSet<EntityId> = field.explosions().iter().map(|e| e.id).collect();
        self.explosions.retain(&live);
        for e in field.explosions() {
            let el = self.explosions.node(&self.doc, layer, e.id, None)?;
            place(el, e.corner);
        }

        if let Some(el) = layer.dyn_ref::<HtmlElement>() {
            let visible = app.session().is_active() || !field.explosions().is_empty();
            style(el, "display", if visible { "block" } else { "none" });
        }
        Ok(())
    }

    fn render_hud<S: KeyValueStore, B: AudioBackend>(
        &mut self,
        app: &App<S, B>,
        now: f64,
    ) -> Result<(), JsValue> {
        let session = app.session();

        if let Some(el) = &self.score {
            if self.shown_score != Some(session.score()) {
                el.set_inner_text(&session.score().to_string());
                self.shown_score = Some(session.score());
            }
            style(el, "transform", &format!("scale({})", session.score_scale(now)));
        }
        if let Some(el) = &self.high_score {
            if self.shown_high != Some(session.high_score()) {
                el.set_inner_text(&session.high_score().to_string());
                self.shown_high = Some(session.high_score());
                if session.record_broken() {
                    style(el, "color", &app.field().config().record_color);
                }
            }
        }

        if session.is_active() != self.shown_active {
            self.shown_active = session.is_active();
            if let Some(btn) = &self.toggle {
                btn.class_list()
                    .toggle_with_force("active", self.shown_active)?;
                btn.set_inner_html(if self.shown_active { PAUSE_ICON } else { PLAY_ICON });
                refresh_icons();
            }
        }

        let wanted = session.banner().map(|b| (b.text.as_str(), b.until_ms));
        let current = self.banner.as_ref().map(|(_, until)| *until);
        if wanted.map(|(_, until)| until) != current {
            if let Some((el, _)) = self.banner.take() {
                el.remove();
            }
            if let (Some((text, until)), Some(body)) = (wanted, self.doc.body()) {
                let el: HtmlElement = self.doc.create_element("div")?.dyn_into()?;
                el.set_class_name("game-message");
                el.set_text_content(Some(text));
                body.append_child(&el)?;
                self.banner = Some((el, until));
            }
        }
        Ok(())
    }

    fn render_cursor<S: KeyValueStore, B: AudioBackend>(&mut self, app: &App<S, B>, now: f64) {
        let fx = app.effects();
        if let (Some(el), Some(p)) = (&self.cursor_dot, fx.cursor().dot()) {
            place(el, p);
            style(
                el,
                "transform",
                &format!("translate(-50%, -50%) scale({})", fx.dot_scale()),
            );
        }
        if let (Some(el), Some(p)) = (&self.cursor_outline, fx.cursor().outline_at(now)) {
            place(el, p);
            el.class_list()
                .toggle_with_force("shooting", fx.is_pressed())
                .ok();
        }

        // Layout-reading effects only follow pointer movement.
        let pointer = fx.pointer();
        if pointer == self.last_pointer {
            return;
        }
        self.last_pointer = pointer;
        let Some(p) = pointer else { return };

        let vp = app.viewport();
        for (i, el) in self.floating.iter().enumerate() {
            if let Some(off) = fx.parallax(i, vp) {
                style(el, "transform", &format!("translate({}px, {}px)", off.x, off.y));
            }
        }
        for el in &self.magnetic {
            let m = fx.magnetic(&rect_of(el));
            style(el, "transform", &format!("translate({}px, {}px)", m.x, m.y));
        }
        for el in &self.spotlights {
            let o = spotlight_origin(&rect_of(el), p);
            style(el, "--spot-x", &format!("{}px", o.x));
            style(el, "--spot-y", &format!("{}px", o.y));
        }
    }

    fn render_trail<S: KeyValueStore, B: AudioBackend>(
        &mut self,
        app: &App<S, B>,
        now: f64,
    ) -> Result<(), JsValue> {
        let Some(layer) = self.trail_layer.as_ref() else {
            return Ok(());
        };
        let particles = app.effects().trail().particles();
        let live: HashSet<EntityId> = particles.iter().map(|p| p.id).collect();
        self.trail.retain(&live);
        for p in particles {
            let el = self.trail.node(&self.doc, layer, p.id, None)?;
            let half = p.size / 2.0;
            place(el, Point::new(p.at.x - half, p.at.y - half));
            style(el, "width", &format!("{}px", p.size));
            style(el, "height", &format!("{}px", p.size));
            style(el, "background", &p.color);
            let k = 1.0 - p.progress(now);
            style(el, "opacity", &k.to_string());
            style(el, "transform", &format!("scale({k})"));
        }
        Ok(())
    }

    fn render_timeline<S: KeyValueStore, B: AudioBackend>(&self, app: &App<S, B>) {
        let (Some(tl), Some(fill)) = (&self.timeline, &self.timeline_fill) else {
            return;
        };
        if let Some(pct) = timeline_progress(&rect_of(tl), app.viewport().height) {
            style(fill, "height", &format!("{pct}%"));
        }
    }

    // --- Preference widgets ------------------------------------------------------

    pub fn apply_theme(&self, theme: Theme) {
        if let Some(body) = self.doc.body() {
            body.set_attribute("data-theme", theme.as_str()).ok();
        }
        if let Some(text) = by_id(&self.doc, "theme-text") {
            text.set_inner_text(match theme {
                Theme::Light => "Dark Mode",
                Theme::Dark => "Light Mode",
            });
        }
        show(&first(&self.doc, ".sun-icon"), theme == Theme::Dark);
        show(&first(&self.doc, ".moon-icon"), theme == Theme::Light);
        refresh_icons();
    }

    pub fn apply_accent(&self, color: &str) {
        if let Some(root) = self
            .doc
            .document_element()
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        {
            style(&root, "--primary-color", color);
        }
        for swatch in all(&self.doc, ".color-swatch") {
            let active = swatch.get_attribute("data-color").as_deref() == Some(color);
            swatch.class_list().toggle_with_force("active", active).ok();
        }
    }

    pub fn apply_language(&self, language: &str) {
        if let Some(root) = self.doc.document_element() {
            root.set_attribute("lang", language).ok();
        }
        for btn in all(&self.doc, ".lang-btn") {
            let active = btn.get_attribute("data-lang").as_deref() == Some(language);
            btn.class_list().toggle_with_force("active", active).ok();
        }
    }

    pub fn apply_sound(&self, enabled: bool) {
        if let Some(text) = by_id(&self.doc, "sound-text") {
            text.set_inner_text(if enabled { "Sound: ON" } else { "Sound: OFF" });
        }
        show(&first(&self.doc, ".volume-on-icon"), enabled);
        show(&first(&self.doc, ".volume-off-icon"), !enabled);
    }
}

/// Score panel plus play/pause button, appended to `<body>`.
fn mount_controls(doc: &Document, body: &HtmlElement, high_score: u32) -> Result<(), JsValue> {
    if doc.get_element_by_id("game-toggle").is_some() {
        return Ok(());
    }
    let controls = doc.create_element("div")?;
    controls.set_class_name("game-controls");
    controls.set_inner_html(&format!(
        "<div class=\"score-panel\">\
           <div class=\"current-score\"><i data-lucide=\"crosshair\"></i> <span id=\"score-val\">0</span></div>\
           <div class=\"high-score\"><i data-lucide=\"trophy\"></i> <span id=\"highscore-val\">{high_score}</span></div>\
         </div>\
         <button id=\"game-toggle\" class=\"game-btn\" data-sound=\"click\">{PLAY_ICON}</button>"
    ));
    body.append_child(&controls)?;

    // The static page ships a floating score board that the panel replaces.
    if let Some(old) = first(doc, ".score-board") {
        style(&old, "display", "none");
    }
    refresh_icons();
    Ok(())
}
