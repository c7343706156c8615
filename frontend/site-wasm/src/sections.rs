pub const HEADER_HEIGHT: f32 = 80.0;
pub const LOOKAHEAD_MARGIN: f32 = 150.0;

/// Page sections in document order.
pub const SITE_SECTIONS: [&str; 8] = [
    "home",
    "who-we-are",
    "services",
    "reviews",
    "milestone",
    "why-partner",
    "future-outlook",
    "partners",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SectionBounds {
    pub id: String,
    pub top: f32,
    pub height: f32,
}

impl SectionBounds {
    pub fn new(id: &str, top: f32, height: f32) -> Self {
        Self {
            id: id.to_string(),
            top,
            height,
        }
    }

    fn contains(&self, y: f32) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSection {
    /// No navigation item is highlighted.
    None,
    Section(String),
}

/// Works out which section the navigation should highlight for a scroll
/// offset. Recomputation is throttled to one per animation frame.
pub struct SectionTracker {
    sections: Vec<SectionBounds>,
    header_height: f32,
    lookahead: f32,
    hero: String,
    shared_highlights: Vec<(String, String)>,
    active: ActiveSection,
    frame_pending: bool,
}

impl Default for SectionTracker {
    fn default() -> Self {
        let mut tracker = Self::new(HEADER_HEIGHT, LOOKAHEAD_MARGIN)
            .with_hero("home")
            .with_shared_highlight("why-partner", "partners");
        tracker.set_sections(
            SITE_SECTIONS
                .iter()
                .map(|id| SectionBounds::new(id, 0.0, 0.0))
                .collect(),
        );
        tracker
    }
}

impl SectionTracker {
    pub fn new(header_height: f32, lookahead: f32) -> Self {
        Self {
            sections: Vec::new(),
            header_height,
            lookahead,
            hero: String::new(),
            shared_highlights: Vec::new(),
            active: ActiveSection::None,
            frame_pending: false,
        }
    }

    pub fn with_hero(mut self, id: &str) -> Self {
        self.hero = id.to_string();
        self
    }

    /// Section `from` lights up the navigation item of `to`.
    pub fn with_shared_highlight(mut self, from: &str, to: &str) -> Self {
        self.shared_highlights.push((from.to_string(), to.to_string()));
        self
    }

    pub fn set_sections(&mut self, sections: Vec<SectionBounds>) {
        self.sections = sections;
    }

    /// Updates the measured bounds of the section at `index`.
    pub fn set_bounds(&mut self, index: usize, top: f32, height: f32) -> bool {
        match self.sections.get_mut(index) {
            Some(section) => {
                section.top = top;
                section.height = height;
                true
            }
            None => false,
        }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.id == id)
    }

    pub fn active(&self) -> &ActiveSection {
        &self.active
    }

    pub fn locate(&self, scroll_y: f32) -> ActiveSection {
        let probe = scroll_y + self.header_height + self.lookahead;
        let Some(section) = self.sections.iter().find(|section| section.contains(probe)) else {
            return ActiveSection::None;
        };

        if section.id == self.hero {
            return ActiveSection::None;
        }
        let id = self
            .shared_highlights
            .iter()
            .find(|(from, _)| *from == section.id)
            .map(|(_, to)| to.clone())
            .unwrap_or_else(|| section.id.clone());
        ActiveSection::Section(id)
    }

    /// Scroll event. Returns true when the host must schedule a frame; further
    /// events before that frame are folded into it.
    pub fn on_scroll(&mut self) -> bool {
        if self.frame_pending {
            return false;
        }
        self.frame_pending = true;
        true
    }

    /// Frame callback after `on_scroll`. Returns the new active section when
    /// it changed.
    pub fn on_frame(&mut self, scroll_y: f32) -> Option<&ActiveSection> {
        self.frame_pending = false;
        self.refresh(scroll_y)
    }

    /// Recomputes without throttling, used for the initial check.
    pub fn refresh(&mut self, scroll_y: f32) -> Option<&ActiveSection> {
        let located = self.locate(scroll_y);
        if located == self.active {
            return None;
        }
        self.active = located;
        Some(&self.active)
    }

    /// Scroll offset that brings the section at `index` just under the header.
    pub fn anchor_target(&self, index: usize) -> Option<f32> {
        self.sections
            .get(index)
            .map(|section| section.top - self.header_height)
    }
}

/// Share of the scrollable document already passed, in percent.
pub fn scroll_progress(scroll_y: f32, document_height: f32, viewport_height: f32) -> f32 {
    let scrollable = document_height - viewport_height;
    if scrollable <= 0.0 {
        return 0.0;
    }
    (scroll_y / scrollable * 100.0).clamp(0.0, 100.0)
}
