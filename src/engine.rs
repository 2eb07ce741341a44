use std::collections::{BTreeMap, HashMap};

use crate::deform::deform_path;
use crate::frame::expand_frame;
use crate::store::PositionStore;
use crate::topology::{self, EdgeEndpoints};
use crate::{codec, map_point, offset_transform, Affine, Frame, Offset, Point, Scene, FRAME_PADDING};

/// An edge as tracked across drags: endpoint identifiers plus the baseline
/// geometry that deformation starts from. Baselines are refreshed on commit
/// so subsequent drags deform from the post-commit shape.
#[derive(Debug, Clone)]
struct TrackedEdge {
    path_index: usize,
    source: Option<String>,
    target: Option<String>,
    points: Vec<Point>,
    label_baseline: Option<Affine>,
}

impl TrackedEdge {
    fn touches(&self, id: &str) -> Option<(&str, &str)> {
        // Edges with an unresolved endpoint are excluded from deformation.
        let (Some(source), Some(target)) = (self.source.as_deref(), self.target.as_deref())
        else {
            return None;
        };
        (source == id || target == id).then_some((source, target))
    }
}

/// At most one active session. The coordinate mapping is captured at drag
/// start and frozen for the session's duration; recomputing it mid-drag
/// would feed back into itself whenever movement resizes the visible frame.
#[derive(Debug, Clone)]
struct DragSession {
    node_id: String,
    screen_to_local: Affine,
    start: Point,
}

/// Per-scene repositioning engine.
///
/// Constructed once per render via [`Engine::track`]; dropping it is the
/// teardown. Pointer events are synchronous handlers, and the final
/// displayed geometry always reflects only the most recent pointer
/// position.
#[derive(Debug)]
pub struct Engine {
    scene: Scene,
    store: PositionStore,
    edges: Vec<TrackedEdge>,
    node_index: HashMap<String, usize>,
    session: Option<DragSession>,
    repositioned: bool,
}

impl Engine {
    /// Begins tracking a freshly rendered scene. Returns `None` for a
    /// node-less scene (a no-op, not an error).
    pub fn track(scene: Scene) -> Option<Engine> {
        if scene.nodes.is_empty() {
            return None;
        }

        let mut store = PositionStore::new();
        let mut node_index = HashMap::new();
        for (index, node) in scene.nodes.iter().enumerate() {
            store.register(node);
            node_index.insert(node.id.clone(), index);
        }

        let edges = scene
            .paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let EdgeEndpoints { source, target } =
                    topology::resolve_endpoints(&scene.nodes, path);
                TrackedEdge {
                    path_index: index,
                    source,
                    target,
                    points: path.points.clone(),
                    label_baseline: path.label.as_ref().map(|label| label.transform),
                }
            })
            .collect();

        Some(Engine {
            scene,
            store,
            edges,
            node_index,
            session: None,
            repositioned: false,
        })
    }

    /// The tracked scene with all live and committed mutations applied.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Whether the document has been manually repositioned since this
    /// render. The export path uses this to choose between the live
    /// in-memory scene and a clean re-render.
    pub fn repositioned(&self) -> bool {
        self.repositioned
    }

    pub fn dragging(&self) -> bool {
        self.session.is_some()
    }

    /// `Idle → Dragging`. `view` is the scene's local-to-screen transform;
    /// its inverse is frozen for the session. Returns false — and changes
    /// nothing — when a session is already active, the target is not a
    /// registered node, or the transform cannot be inverted.
    pub fn pointer_down(&mut self, target: &str, screen: Point, view: &Affine) -> bool {
        if self.session.is_some() || !self.store.contains(target) {
            return false;
        }
        let Some(screen_to_local) = view.inverse() else {
            return false;
        };

        let start = map_point(&screen_to_local, screen);
        self.session = Some(DragSession {
            node_id: target.to_string(),
            screen_to_local,
            start,
        });
        true
    }

    /// `Dragging → Dragging`. Ignored without an active session.
    pub fn pointer_move(&mut self, screen: Point) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let local = map_point(&session.screen_to_local, screen);
        let live = Offset::new(local.x - session.start.x, local.y - session.start.y);
        if self.store.apply_live_offset(&session.node_id, live) {
            self.refresh_node(&session.node_id);
        }
    }

    /// `Dragging → Idle`. Commits the session's offset, folds the deformed
    /// edge geometry into the stored baselines, and grows the view box to
    /// cover the moved node.
    pub fn pointer_up(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.commit_node(&session.node_id);
    }

    /// Pointer left the tracking surface mid-drag: treated as an implicit
    /// commit rather than leaving the session stuck.
    pub fn pointer_cancel(&mut self) {
        self.pointer_up();
    }

    /// Snapshot of committed offsets, keyed by node identifier.
    pub fn committed_offsets(&self) -> BTreeMap<String, Offset> {
        self.store.committed_offsets()
    }

    /// Encodes the committed offsets into `source`, replacing any prior
    /// annotation line.
    pub fn annotate(&self, source: &str) -> String {
        codec::merge_annotation(source, &self.committed_offsets())
    }

    /// Restores committed offsets recorded in `source` onto the freshly
    /// tracked scene. Each annotation key is matched against node
    /// identifiers as a delimited fragment; entries that match no node are
    /// skipped. Returns the number of offsets applied.
    ///
    /// Must run once per render, before any user interaction.
    pub fn reapply(&mut self, source: &str) -> usize {
        if self.session.is_some() {
            return 0;
        }
        let Some(mapping) = codec::decode(source) else {
            return 0;
        };

        let mut applied = 0;
        for (fragment, pixel) in mapping {
            let offset = Offset::new(pixel.x as f32, pixel.y as f32);
            if offset.is_zero() {
                continue;
            }
            let Some(id) = self
                .scene
                .nodes
                .iter()
                .find(|node| topology::id_contains_fragment(&node.id, &fragment))
                .map(|node| node.id.clone())
            else {
                continue;
            };
            if self.store.apply_live_offset(&id, offset) {
                self.refresh_node(&id);
                self.commit_node(&id);
                applied += 1;
            }
        }
        applied
    }

    /// The window an export of the current layout must use. Recomputed from
    /// committed placements; already-expanded view boxes only grow further.
    pub fn export_frame(&self) -> Frame {
        expand_frame(self.scene.view_box, self.store.entries(), FRAME_PADDING)
    }

    /// Re-derives the displayed geometry of `id` and every attached edge
    /// from the stored baselines and current offsets.
    fn refresh_node(&mut self, id: &str) {
        if let (Some(entry), Some(&index)) = (self.store.get(id), self.node_index.get(id)) {
            self.scene.nodes[index].transform = entry.displayed();
        }

        for edge in &self.edges {
            let Some((source, target)) = edge.touches(id) else {
                continue;
            };
            let source_live = self.store.get(source).map_or(Offset::ZERO, |e| e.live());
            let target_live = self.store.get(target).map_or(Offset::ZERO, |e| e.live());

            let path = &mut self.scene.paths[edge.path_index];
            path.points = deform_path(&edge.points, source_live, target_live);
            if let (Some(label), Some(baseline)) = (path.label.as_mut(), edge.label_baseline) {
                label.transform =
                    offset_transform(&baseline, Offset::midpoint(source_live, target_live));
            }
        }
    }

    fn commit_node(&mut self, id: &str) {
        let live = self.store.get(id).map_or(Offset::ZERO, |e| e.live());
        if !live.is_zero() {
            self.repositioned = true;
        }

        for edge in &mut self.edges {
            let Some((source, target)) = edge.touches(id) else {
                continue;
            };
            let source_live = self.store.get(source).map_or(Offset::ZERO, |e| e.live());
            let target_live = self.store.get(target).map_or(Offset::ZERO, |e| e.live());

            edge.points = deform_path(&edge.points, source_live, target_live);
            if let Some(baseline) = edge.label_baseline.as_mut() {
                *baseline =
                    offset_transform(baseline, Offset::midpoint(source_live, target_live));
            }
        }

        self.store.commit(id);
        self.refresh_node(id);
        self.scene.view_box = expand_frame(self.scene.view_box, self.store.entries(), FRAME_PADDING);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SceneLabel, SceneNode, ScenePath};

    fn node(id: &str, x: f32, y: f32) -> SceneNode {
        SceneNode {
            id: id.to_string(),
            center: Point::new(x, y),
            width: 40.0,
            height: 20.0,
            transform: Affine::identity(),
        }
    }

    fn linked_scene() -> Scene {
        Scene {
            nodes: vec![node("flowchart-A-0", 0.0, 0.0), node("flowchart-B-1", 100.0, 0.0)],
            paths: vec![ScenePath {
                id: "L_A_B_0".to_string(),
                points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
                label: Some(SceneLabel {
                    transform: Affine::identity(),
                }),
            }],
            view_box: Frame::new(0.0, 0.0, 200.0, 200.0),
        }
    }

    #[test]
    fn empty_scene_is_not_tracked() {
        let scene = Scene {
            nodes: Vec::new(),
            paths: Vec::new(),
            view_box: Frame::new(0.0, 0.0, 10.0, 10.0),
        };
        assert!(Engine::track(scene).is_none());
    }

    #[test]
    fn pointer_move_without_a_session_is_ignored() {
        let mut engine = Engine::track(linked_scene()).unwrap();
        engine.pointer_move(Point::new(50.0, 50.0));
        assert_eq!(
            engine.scene().nodes[0].transform.to_array(),
            Affine::identity().to_array()
        );
        assert!(!engine.repositioned());
    }

    #[test]
    fn second_pointer_down_is_refused_while_dragging() {
        let mut engine = Engine::track(linked_scene()).unwrap();
        let view = Affine::identity();
        assert!(engine.pointer_down("flowchart-A-0", Point::new(0.0, 0.0), &view));
        assert!(!engine.pointer_down("flowchart-B-1", Point::new(100.0, 0.0), &view));
        assert!(engine.dragging());
    }

    #[test]
    fn pointer_down_on_unknown_target_is_refused() {
        let mut engine = Engine::track(linked_scene()).unwrap();
        assert!(!engine.pointer_down("ghost", Point::new(0.0, 0.0), &Affine::identity()));
        assert!(!engine.dragging());
    }

    #[test]
    fn degenerate_view_transform_is_refused() {
        let mut engine = Engine::track(linked_scene()).unwrap();
        let collapsed = Affine::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(!engine.pointer_down("flowchart-A-0", Point::new(0.0, 0.0), &collapsed));
    }

    #[test]
    fn pointer_cancel_commits_the_session() {
        let mut engine = Engine::track(linked_scene()).unwrap();
        engine.pointer_down("flowchart-A-0", Point::new(0.0, 0.0), &Affine::identity());
        engine.pointer_move(Point::new(10.0, 0.0));
        engine.pointer_cancel();

        assert!(!engine.dragging());
        assert!(engine.repositioned());
        assert_eq!(
            engine.committed_offsets()["flowchart-A-0"],
            Offset::new(10.0, 0.0)
        );
    }

    #[test]
    fn scaled_view_transform_maps_screen_deltas_into_local_space() {
        let mut engine = Engine::track(linked_scene()).unwrap();
        // Scene displayed at 2x zoom: a 100px screen delta is 50 local units.
        let view = Affine::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        engine.pointer_down("flowchart-A-0", Point::new(0.0, 0.0), &view);
        engine.pointer_move(Point::new(100.0, 40.0));
        engine.pointer_up();

        assert_eq!(
            engine.committed_offsets()["flowchart-A-0"],
            Offset::new(50.0, 20.0)
        );
    }
}
