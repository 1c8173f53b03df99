use crate::store::{Graph, Position};

pub fn snap_to_grid(point: Position, grid: f64) -> Position {
    Position::new((point.x / grid).round() * grid, (point.y / grid).round() * grid)
}

/// Distance from `p` to the segment `a`-`b`. A degenerate segment is a point.
pub fn distance_to_segment(p: Position, a: Position, b: Position) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Position::new(a.x + t * dx, a.y + t * dy))
}

/// One flag per connection (in connection order): whether it passes within
/// `max_distance` of `point`. Connections with a missing endpoint have no
/// segment and are never hit.
pub fn connections_near(graph: &Graph, point: Position, max_distance: f64) -> Vec<bool> {
    graph
        .connections()
        .iter()
        .map(|c| match (graph.node(c.from), graph.node(c.to)) {
            (Some(a), Some(b)) => distance_to_segment(point, a.position, b.position) <= max_distance,
            _ => false,
        })
        .collect()
}
