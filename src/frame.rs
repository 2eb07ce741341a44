use crate::{Frame, NodeEntry};

/// Grows `current` to the minimal window covering itself and every node's
/// padded extent at its committed placement. The result never shrinks
/// relative to `current`.
///
/// Invoked on drag commit and, mandatorily, before exporting a modified
/// layout — exported artifacts cannot rely on container overflow.
pub fn expand_frame<'a>(
    current: Frame,
    nodes: impl IntoIterator<Item = &'a NodeEntry>,
    padding: f32,
) -> Frame {
    let mut min_x = current.min_x;
    let mut min_y = current.min_y;
    let mut max_x = current.max_x();
    let mut max_y = current.max_y();

    for entry in nodes {
        let offset = entry.committed();
        let cx = entry.center.x + offset.dx;
        let cy = entry.center.y + offset.dy;
        min_x = min_x.min(cx - entry.width / 2.0 - padding);
        max_x = max_x.max(cx + entry.width / 2.0 + padding);
        min_y = min_y.min(cy - entry.height / 2.0 - padding);
        max_y = max_y.max(cy + entry.height / 2.0 + padding);
    }

    Frame {
        min_x,
        min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}
