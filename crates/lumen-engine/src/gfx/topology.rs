use std::fmt;

/// Primitive assembly rule applied to an index sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Topology {
    pub const ALL: [Topology; 7] = [
        Topology::Points,
        Topology::Lines,
        Topology::LineLoop,
        Topology::LineStrip,
        Topology::Triangles,
        Topology::TriangleStrip,
        Topology::TriangleFan,
    ];

    /// Topology drawn in place of `self` on backends without loop/fan primitives.
    pub fn fallback(self) -> Topology {
        match self {
            Topology::LineLoop => Topology::LineStrip,
            Topology::TriangleFan => Topology::Triangles,
            other => other,
        }
    }

    /// Appends to `out` the index sequence that draws `indices` with
    /// [`fallback`](Self::fallback) topology, and returns that topology.
    ///
    /// - a loop becomes a strip closed with its first index
    /// - a fan `v0, v1, .., vn` becomes triangles `(v0, vi, vi+1)`
    pub fn lower(self, indices: &[u16], out: &mut Vec<u16>) -> Topology {
        match self {
            Topology::LineLoop => {
                out.extend_from_slice(indices);
                if indices.len() >= 2 {
                    out.push(indices[0]);
                }
            }
            Topology::TriangleFan => {
                if let Some((&hub, rest)) = indices.split_first() {
                    for pair in rest.windows(2) {
                        out.extend_from_slice(&[hub, pair[0], pair[1]]);
                    }
                }
            }
            _ => out.extend_from_slice(indices),
        }
        self.fallback()
    }

    /// Whether index sequences are interpreted as connected strips.
    pub fn is_strip(self) -> bool {
        matches!(self, Topology::LineStrip | Topology::TriangleStrip)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topology::Points => "points",
            Topology::Lines => "lines",
            Topology::LineLoop => "line loop",
            Topology::LineStrip => "line strip",
            Topology::Triangles => "triangles",
            Topology::TriangleStrip => "triangle strip",
            Topology::TriangleFan => "triangle fan",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(t: Topology, indices: &[u16]) -> (Topology, Vec<u16>) {
        let mut out = Vec::new();
        let t = t.lower(indices, &mut out);
        (t, out)
    }

    // ── lower ─────────────────────────────────────────────────────────────

    #[test]
    fn loop_is_closed_with_first_index() {
        let (t, out) = lowered(Topology::LineLoop, &[2, 3, 4, 1, 0]);
        assert_eq!(t, Topology::LineStrip);
        assert_eq!(out, vec![2, 3, 4, 1, 0, 2]);
    }

    #[test]
    fn fan_expands_to_triangles_around_hub() {
        let (t, out) = lowered(Topology::TriangleFan, &[0, 1, 2, 3, 4]);
        assert_eq!(t, Topology::Triangles);
        assert_eq!(out, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
    }

    #[test]
    fn short_fan_produces_nothing() {
        let (_, out) = lowered(Topology::TriangleFan, &[0, 1]);
        assert!(out.is_empty());
    }

    #[test]
    fn native_topologies_pass_through() {
        for t in [Topology::Points, Topology::Lines, Topology::TriangleStrip] {
            let (lt, out) = lowered(t, &[1, 2, 3]);
            assert_eq!(lt, t);
            assert_eq!(out, vec![1, 2, 3]);
        }
    }

    #[test]
    fn lower_appends_without_clearing() {
        let mut out = vec![9];
        Topology::Points.lower(&[1], &mut out);
        assert_eq!(out, vec![9, 1]);
    }
}
