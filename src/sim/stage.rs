/// The stage: the minimal visual-surface capability the sim needs.
///
/// The scene never touches the terminal directly. It creates placards
/// (greeting, emojis, photos) through this trait and adjusts their
/// visibility, opacity and emphasis; the ui layer decides what they look
/// like. Positions are in terminal cell coordinates, fixed at creation —
/// a later viewport resize does not move placards already placed.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HandleId(pub u32);

#[derive(Clone, PartialEq, Debug)]
pub enum VisualKind {
    /// The greeting banner text.
    Greeting(String),
    /// One decorative emoji glyph.
    Emoji(String),
    /// A photo placard, labeled from the configured deck.
    Photo(String),
}

#[derive(Clone, PartialEq, Debug)]
pub struct VisualSpec {
    pub kind: VisualKind,
    pub col: i32,
    pub row: i32,
    pub width: u16,
    pub height: u16,
    pub visible: bool,
    pub opacity: f32,
}

pub trait Stage {
    fn create(&mut self, spec: VisualSpec) -> HandleId;
    fn set_visible(&mut self, id: HandleId, visible: bool);
    fn set_opacity(&mut self, id: HandleId, opacity: f32);
    /// Emphasis is the placard's accent state: "revealed" on the greeting,
    /// "bouncing" on an emoji. Photos ignore it.
    fn set_emphasis(&mut self, id: HandleId, on: bool);
    fn remove(&mut self, id: HandleId);
    /// Drop every placard (full scene reset).
    fn clear(&mut self);
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// In-memory stage that records placard state for assertions.
    /// Handles index into `items`; removed placards stay listed with
    /// `removed = true` so tests can inspect their final state.
    pub struct RecordingStage {
        pub items: Vec<Item>,
        pub cleared: u32,
    }

    pub struct Item {
        pub spec: VisualSpec,
        pub visible: bool,
        pub opacity: f32,
        pub emphasis: bool,
        pub removed: bool,
    }

    impl RecordingStage {
        pub fn new() -> Self {
            RecordingStage { items: Vec::new(), cleared: 0 }
        }

        pub fn item(&self, id: HandleId) -> &Item {
            &self.items[id.0 as usize]
        }

        pub fn live_photos(&self) -> Vec<&Item> {
            self.items
                .iter()
                .filter(|i| !i.removed && matches!(i.spec.kind, VisualKind::Photo(_)))
                .collect()
        }
    }

    impl Stage for RecordingStage {
        fn create(&mut self, spec: VisualSpec) -> HandleId {
            let id = HandleId(self.items.len() as u32);
            self.items.push(Item {
                visible: spec.visible,
                opacity: spec.opacity,
                emphasis: false,
                removed: false,
                spec,
            });
            id
        }

        fn set_visible(&mut self, id: HandleId, visible: bool) {
            self.items[id.0 as usize].visible = visible;
        }

        fn set_opacity(&mut self, id: HandleId, opacity: f32) {
            self.items[id.0 as usize].opacity = opacity;
        }

        fn set_emphasis(&mut self, id: HandleId, on: bool) {
            self.items[id.0 as usize].emphasis = on;
        }

        fn remove(&mut self, id: HandleId) {
            self.items[id.0 as usize].removed = true;
        }

        fn clear(&mut self) {
            self.items.clear();
            self.cleared += 1;
        }
    }
}
