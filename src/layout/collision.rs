use eframe::egui::{Vec2, vec2};

use super::{LayoutConfig, LayoutNode};

/// Pushes overlapping nodes apart until every pair keeps the configured gap
/// or the iteration budget runs out.
///
/// Anchors (the hub) never move; the other side of an anchored pair takes the
/// whole correction. Moved nodes stay inside the padded canvas.
pub fn resolve_collisions(mut nodes: Vec<LayoutNode>, config: &LayoutConfig) -> Vec<LayoutNode> {
    if nodes.len() < 2 {
        return nodes;
    }

    for _ in 0..config.collision_iterations {
        let mut adjusted = false;

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (head, tail) = nodes.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];

                let min_distance = a.radius() + b.radius() + config.collision_gap;
                let mut delta = b.position - a.position;
                let mut distance = delta.length();
                if distance >= min_distance {
                    continue;
                }
                adjusted = true;

                if distance < 1e-4 {
                    delta = pseudo_direction(i, j);
                    distance = 1.0;
                }

                let overlap = min_distance - distance;
                let direction = delta / distance;
                match (a.is_anchor(), b.is_anchor()) {
                    (true, false) => b.position += direction * overlap,
                    (false, true) => a.position -= direction * overlap,
                    _ => {
                        let shift = direction * (overlap / 2.0);
                        a.position -= shift;
                        b.position += shift;
                    }
                }

                if !a.is_anchor() {
                    a.position = clamp_center(a.position, a.size, config);
                }
                if !b.is_anchor() {
                    b.position = clamp_center(b.position, b.size, config);
                }
            }
        }

        if !adjusted {
            break;
        }
    }

    nodes
}

fn pseudo_direction(i: usize, j: usize) -> Vec2 {
    let degrees = ((i + 1) * 53 + (j + 1) * 97) % 360;
    Vec2::angled((degrees as f32).to_radians())
}

fn clamp_center(position: Vec2, size: f32, config: &LayoutConfig) -> Vec2 {
    let limit = (config.half_canvas() - config.padding - size / 2.0).max(0.0);
    vec2(
        position.x.clamp(-limit, limit),
        position.y.clamp(-limit, limit),
    )
}
