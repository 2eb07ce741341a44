use crate::{Point, SceneNode, ScenePath};

/// Resolved (possibly null) endpoints of one rendered edge path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeEndpoints {
    pub source: Option<String>,
    pub target: Option<String>,
}

impl EdgeEndpoints {
    /// Edges with an unresolved endpoint stay tracked but are excluded from
    /// deformation.
    pub fn is_resolved(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }
}

/// Determines which node an edge path starts and ends at.
///
/// The renderer-assigned path identifier is consulted first: identifiers of
/// the `source_target` shape are matched against nodes whose identifiers
/// contain the fragment as a delimited substring. Either end that stays
/// unresolved falls back to the node whose center is nearest to the
/// corresponding endpoint of the drawn point sequence, ties going to the
/// first node in scene order.
pub fn resolve_endpoints(nodes: &[SceneNode], path: &ScenePath) -> EdgeEndpoints {
    let (mut source, mut target) = endpoints_from_identifier(nodes, &path.id);

    if source.is_none() {
        source = nearest_node(nodes, path.points.first().copied());
    }
    if target.is_none() {
        target = nearest_node(nodes, path.points.last().copied());
    }

    EdgeEndpoints { source, target }
}

/// True when `id` contains `fragment` delimited by identifier separators,
/// e.g. `flowchart-A-1` contains `A` but not `flow`.
pub fn id_contains_fragment(id: &str, fragment: &str) -> bool {
    let run: Vec<&str> = tokenize(fragment);
    !run.is_empty() && contains_token_run(id, &run)
}

fn endpoints_from_identifier(
    nodes: &[SceneNode],
    id: &str,
) -> (Option<String>, Option<String>) {
    let mut tokens = tokenize(id);

    // Renderers prefix edge ids with a marker token and suffix them with a
    // running index, e.g. `L_A_B_0`.
    if matches!(tokens.first(), Some(first) if first.eq_ignore_ascii_case("l") || first.eq_ignore_ascii_case("edge"))
    {
        tokens.remove(0);
    }
    if tokens.len() > 2
        && matches!(tokens.last(), Some(last) if last.chars().all(|c| c.is_ascii_digit()))
    {
        tokens.pop();
    }

    if tokens.len() < 2 {
        return (None, None);
    }

    let mut partial: Option<(Option<String>, Option<String>)> = None;
    for split in 1..tokens.len() {
        let source = find_by_token_run(nodes, &tokens[..split]);
        let target = find_by_token_run(nodes, &tokens[split..]);
        match (&source, &target) {
            (Some(_), Some(_)) => return (source, target),
            (None, None) => {}
            _ => {
                if partial.is_none() {
                    partial = Some((source, target));
                }
            }
        }
    }

    partial.unwrap_or((None, None))
}

fn find_by_token_run(nodes: &[SceneNode], run: &[&str]) -> Option<String> {
    nodes
        .iter()
        .find(|node| contains_token_run(&node.id, run))
        .map(|node| node.id.clone())
}

fn contains_token_run(id: &str, run: &[&str]) -> bool {
    let tokens = tokenize(id);
    if run.is_empty() || run.len() > tokens.len() {
        return false;
    }
    tokens.windows(run.len()).any(|window| window == run)
}

fn tokenize(id: &str) -> Vec<&str> {
    id.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}

fn nearest_node(nodes: &[SceneNode], endpoint: Option<Point>) -> Option<String> {
    let endpoint = endpoint?;
    let mut best: Option<(&SceneNode, f32)> = None;

    for node in nodes {
        let distance = node.center.distance_to(endpoint);
        // Strict comparison keeps the first-seen node on ties.
        if best.map_or(true, |(_, closest)| distance < closest) {
            best = Some((node, distance));
        }
    }

    best.map(|(node, _)| node.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Affine, Frame, Scene};

    fn node(id: &str, x: f32, y: f32) -> SceneNode {
        SceneNode {
            id: id.to_string(),
            center: Point::new(x, y),
            width: 40.0,
            height: 20.0,
            transform: Affine::identity(),
        }
    }

    fn path(id: &str, points: Vec<Point>) -> ScenePath {
        ScenePath {
            id: id.to_string(),
            points,
            label: None,
        }
    }

    fn scene(nodes: Vec<SceneNode>, paths: Vec<ScenePath>) -> Scene {
        Scene {
            nodes,
            paths,
            view_box: Frame::new(0.0, 0.0, 200.0, 200.0),
        }
    }

    #[test]
    fn resolves_source_target_identifier_pattern() {
        let scene = scene(
            vec![node("flowchart-A-0", 0.0, 0.0), node("flowchart-B-1", 100.0, 0.0)],
            vec![path("L_A_B_0", vec![Point::new(40.0, 0.0), Point::new(60.0, 0.0)])],
        );

        let endpoints = resolve_endpoints(&scene.nodes, &scene.paths[0]);
        assert_eq!(endpoints.source.as_deref(), Some("flowchart-A-0"));
        assert_eq!(endpoints.target.as_deref(), Some("flowchart-B-1"));
    }

    #[test]
    fn identifier_match_requires_delimited_fragments() {
        // "AB" must not match a node whose identifier merely contains the
        // letters somewhere inside a longer token.
        assert!(id_contains_fragment("flowchart-AB-3", "AB"));
        assert!(!id_contains_fragment("flowchart-ABC-3", "AB"));
        assert!(!id_contains_fragment("flowchart-A-0", "flow"));
    }

    #[test]
    fn proximity_fallback_is_deterministic() {
        let scene = scene(
            vec![node("n0", 0.0, 0.0), node("n1", 100.0, 0.0)],
            vec![path("decorative", vec![Point::new(2.0, 0.0), Point::new(98.0, 0.0)])],
        );

        let endpoints = resolve_endpoints(&scene.nodes, &scene.paths[0]);
        assert_eq!(endpoints.source.as_deref(), Some("n0"));
        assert_eq!(endpoints.target.as_deref(), Some("n1"));
    }

    #[test]
    fn proximity_ties_go_to_first_node_in_scene_order() {
        let scene = scene(
            vec![node("first", 0.0, 10.0), node("second", 0.0, -10.0)],
            vec![path("p", vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)])],
        );

        let endpoints = resolve_endpoints(&scene.nodes, &scene.paths[0]);
        assert_eq!(endpoints.source.as_deref(), Some("first"));
    }

    #[test]
    fn pointless_path_with_opaque_identifier_stays_unresolved() {
        let scene = scene(vec![node("flowchart-A-0", 0.0, 0.0)], vec![path("x", vec![])]);

        let endpoints = resolve_endpoints(&scene.nodes, &scene.paths[0]);
        assert_eq!(endpoints, EdgeEndpoints::default());
        assert!(!endpoints.is_resolved());
    }

    #[test]
    fn partial_identifier_match_falls_back_for_the_other_end() {
        // The identifier names A but the other fragment matches nothing, so
        // the target comes from endpoint proximity.
        let scene = scene(
            vec![node("flowchart-A-0", 0.0, 0.0), node("flowchart-B-1", 100.0, 0.0)],
            vec![path(
                "L_A_unknown_0",
                vec![Point::new(10.0, 0.0), Point::new(95.0, 0.0)],
            )],
        );

        let endpoints = resolve_endpoints(&scene.nodes, &scene.paths[0]);
        assert_eq!(endpoints.source.as_deref(), Some("flowchart-A-0"));
        assert_eq!(endpoints.target.as_deref(), Some("flowchart-B-1"));
    }
}
