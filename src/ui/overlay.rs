/// Production stage: placards composited over the firework canvas.
///
/// Pure data — the renderer reads the placard list each frame and decides
/// how a greeting, emoji or photo looks. Placard positions are frozen at
/// creation; a terminal resize only clips them.

use crate::sim::stage::{HandleId, Stage, VisualKind, VisualSpec};

pub struct Placard {
    pub id: HandleId,
    pub kind: VisualKind,
    pub col: i32,
    pub row: i32,
    pub width: u16,
    pub height: u16,
    pub visible: bool,
    pub opacity: f32,
    pub emphasis: bool,
}

pub struct OverlayStage {
    items: Vec<Placard>,
    next_id: u32,
}

impl OverlayStage {
    pub fn new() -> Self {
        OverlayStage { items: Vec::new(), next_id: 0 }
    }

    /// Placards in creation order (later ones draw on top).
    pub fn placards(&self) -> &[Placard] {
        &self.items
    }

    fn find(&mut self, id: HandleId) -> Option<&mut Placard> {
        self.items.iter_mut().find(|p| p.id == id)
    }
}

impl Stage for OverlayStage {
    fn create(&mut self, spec: VisualSpec) -> HandleId {
        let id = HandleId(self.next_id);
        self.next_id += 1;
        self.items.push(Placard {
            id,
            kind: spec.kind,
            col: spec.col,
            row: spec.row,
            width: spec.width,
            height: spec.height,
            visible: spec.visible,
            opacity: spec.opacity,
            emphasis: false,
        });
        id
    }

    fn set_visible(&mut self, id: HandleId, visible: bool) {
        if let Some(p) = self.find(id) {
            p.visible = visible;
        }
    }

    fn set_opacity(&mut self, id: HandleId, opacity: f32) {
        if let Some(p) = self.find(id) {
            p.opacity = opacity;
        }
    }

    fn set_emphasis(&mut self, id: HandleId, on: bool) {
        if let Some(p) = self.find(id) {
            p.emphasis = on;
        }
    }

    fn remove(&mut self, id: HandleId) {
        self.items.retain(|p| p.id != id);
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}
