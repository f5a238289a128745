use crate::compile::plan::HitRegion;
use crate::foundation::core::{Canvas, Point};
use crate::model::layers::Selection;
use crate::model::ops::Op;
use crate::model::state::MixerState;

/// Pointer input in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    Press { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Release,
    /// Wheel step; positive `delta_y` shrinks the selected layer.
    Scroll { delta_y: f64 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub enum Cursor {
    #[default]
    Default,
    Move,
}

#[derive(Clone, Debug)]
struct Drag {
    target: Selection,
    last: Point,
}

/// Turns pointer events into state ops against the hit regions of the last frame.
#[derive(Debug, Default)]
pub struct InteractionResolver {
    drag: Option<Drag>,
    cursor: Cursor,
}

/// Topmost region containing `p`, edges inclusive.
pub fn hit_test<'a>(hits: &'a [HitRegion], p: Point) -> Option<&'a HitRegion> {
    hits.iter().rev().find(|h| {
        let r = h.rect;
        p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
    })
}

impl InteractionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        hits: &[HitRegion],
        state: &MixerState,
        canvas: Canvas,
    ) -> Vec<Op> {
        match event {
            PointerEvent::Press { x, y } => {
                let p = Point::new(x, y);
                match hit_test(hits, p) {
                    Some(hit) => {
                        self.drag = Some(Drag {
                            target: hit.target.clone(),
                            last: p,
                        });
                        vec![Op::Select {
                            target: hit.target.clone(),
                        }]
                    }
                    None => {
                        self.drag = None;
                        vec![Op::Select {
                            target: Selection::None,
                        }]
                    }
                }
            }
            PointerEvent::Move { x, y } => {
                let p = Point::new(x, y);
                let Some(drag) = self.drag.as_mut() else {
                    self.cursor = if hit_test(hits, p).is_some() {
                        Cursor::Move
                    } else {
                        Cursor::Default
                    };
                    return Vec::new();
                };
                let (dx, dy) = (p.x - drag.last.x, p.y - drag.last.y);
                drag.last = p;
                if dx == 0.0 && dy == 0.0 {
                    return Vec::new();
                }
                let (dx, dy) = match drag.target {
                    Selection::None => return Vec::new(),
                    Selection::Overlay(_) => (dx, dy),
                    Selection::Text(_) | Selection::Visualizer | Selection::Watermark => {
                        (dx / canvas.w() * 100.0, dy / canvas.h() * 100.0)
                    }
                };
                vec![Op::MoveLayer {
                    target: drag.target.clone(),
                    dx,
                    dy,
                }]
            }
            PointerEvent::Release => {
                self.drag = None;
                Vec::new()
            }
            PointerEvent::Scroll { delta_y } => {
                if state.selection.is_none() || delta_y == 0.0 || !delta_y.is_finite() {
                    return Vec::new();
                }
                vec![Op::ResizeLayer {
                    target: state.selection.clone(),
                    grow: delta_y < 0.0,
                }]
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/pointer.rs"]
mod tests;
