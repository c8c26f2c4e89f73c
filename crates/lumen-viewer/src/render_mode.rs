//! Render modes: a closed set of (topology, index sequence) pairs over the
//! trapezoid geometry.

use std::fmt;
use std::str::FromStr;

use lumen_engine::gfx::Topology;
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("unknown render mode `{0}`")]
pub struct UnknownRenderMode(pub String);

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum RenderMode {
    #[default]
    Triangles,
    Lines,
    Points,
    LineLoop,
    LineStrip,
    TriangleStrip,
    TriangleFan,
}

/// What a render mode draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RenderModeEntry {
    pub topology: Topology,
    pub indices: &'static [u16],
}

// Indexed by `RenderMode as usize`.
static TABLE: [(&str, RenderModeEntry); 7] = [
    ("Triangles", RenderModeEntry { topology: Topology::Triangles, indices: &[0, 1, 2, 2, 3, 4] }),
    ("Lines", RenderModeEntry { topology: Topology::Lines, indices: &[1, 3, 0, 4, 1, 2, 2, 3] }),
    ("Points", RenderModeEntry { topology: Topology::Points, indices: &[1, 2, 3] }),
    ("Line Loop", RenderModeEntry { topology: Topology::LineLoop, indices: &[2, 3, 4, 1, 0] }),
    ("Line Strip", RenderModeEntry { topology: Topology::LineStrip, indices: &[2, 3, 4, 1, 0] }),
    ("Triangle Strip", RenderModeEntry { topology: Topology::TriangleStrip, indices: &[0, 1, 2, 3, 4] }),
    ("Triangle Fan", RenderModeEntry { topology: Topology::TriangleFan, indices: &[0, 1, 2, 3, 4] }),
];

impl RenderMode {
    /// Every mode, in selector order.
    pub const ALL: [RenderMode; 7] = [
        RenderMode::Triangles,
        RenderMode::Lines,
        RenderMode::Points,
        RenderMode::LineLoop,
        RenderMode::LineStrip,
        RenderMode::TriangleStrip,
        RenderMode::TriangleFan,
    ];

    pub fn name(self) -> &'static str {
        TABLE[self as usize].0
    }

    pub fn entry(self) -> &'static RenderModeEntry {
        &TABLE[self as usize].1
    }

    /// Mode names in selector order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        TABLE.iter().map(|(name, _)| *name)
    }

    /// Next mode in selector order, wrapping around.
    pub fn next(self) -> RenderMode {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    /// Mode at 1-based `position` in selector order.
    pub fn from_position(position: usize) -> Option<RenderMode> {
        position.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the display name ("Line Loop") exactly, or ignoring case with `-`
/// or `_` in place of the space ("line-loop").
impl FromStr for RenderMode {
    type Err = UnknownRenderMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s || normalize(m.name()) == wanted)
            .ok_or_else(|| UnknownRenderMode(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Index range of one mode inside the packed index buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawRange {
    pub topology: Topology,
    pub first: u32,
    pub count: u32,
}

/// Every mode's indices packed into one buffer, with per-mode draw ranges.
///
/// Modes whose topology the context cannot draw natively are lowered (see
/// [`Topology::lower`]) while packing, so every range is drawable as is.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RenderModeRegistry {
    ranges: [DrawRange; 7],
}

impl RenderModeRegistry {
    /// Packs all modes; returns the registry and the index data to upload.
    pub fn pack(supports: impl Fn(Topology) -> bool) -> (Self, Vec<u16>) {
        let mut indices = Vec::new();
        let ranges = RenderMode::ALL.map(|mode| {
            let entry = mode.entry();
            let first = indices.len() as u32;
            let topology = if supports(entry.topology) {
                indices.extend_from_slice(entry.indices);
                entry.topology
            } else {
                let lowered = entry.topology.lower(entry.indices, &mut indices);
                log::debug!("{mode}: drawing as {lowered}");
                lowered
            };
            DrawRange {
                topology,
                first,
                count: indices.len() as u32 - first,
            }
        });
        (Self { ranges }, indices)
    }

    pub fn get(&self, mode: RenderMode) -> DrawRange {
        self.ranges[mode as usize]
    }

    /// Largest vertex index any mode reads.
    pub fn max_index() -> Option<u16> {
        TABLE.iter().flat_map(|(_, e)| e.indices.iter().copied()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── lookup ────────────────────────────────────────────────────────────

    #[test]
    fn names_are_in_selector_order() {
        let names: Vec<_> = RenderMode::names().collect();
        assert_eq!(
            names,
            [
                "Triangles",
                "Lines",
                "Points",
                "Line Loop",
                "Line Strip",
                "Triangle Strip",
                "Triangle Fan"
            ]
        );
    }

    #[test]
    fn parses_display_and_cli_names() {
        assert_eq!("Points".parse::<RenderMode>(), Ok(RenderMode::Points));
        assert_eq!("Triangle Fan".parse::<RenderMode>(), Ok(RenderMode::TriangleFan));
        assert_eq!("line-loop".parse::<RenderMode>(), Ok(RenderMode::LineLoop));
        assert_eq!("TRIANGLE_STRIP".parse::<RenderMode>(), Ok(RenderMode::TriangleStrip));
        assert_eq!(
            "not-a-mode".parse::<RenderMode>(),
            Err(UnknownRenderMode("not-a-mode".into()))
        );
    }

    #[test]
    fn every_mode_is_reachable_by_cycling() {
        let mut mode = RenderMode::default();
        for expected in RenderMode::ALL.iter().skip(1) {
            mode = mode.next();
            assert_eq!(mode, *expected);
        }
        assert_eq!(mode.next(), RenderMode::Triangles);
        assert_eq!(RenderMode::from_position(3), Some(RenderMode::Points));
        assert_eq!(RenderMode::from_position(0), None);
        assert_eq!(RenderMode::from_position(8), None);
    }

    #[test]
    fn table_stays_within_five_vertices() {
        assert_eq!(RenderModeRegistry::max_index(), Some(4));
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn native_packing_keeps_topologies() {
        let (registry, indices) = RenderModeRegistry::pack(|_| true);
        let points = registry.get(RenderMode::Points);
        assert_eq!(points.topology, Topology::Points);
        assert_eq!(&indices[points.first as usize..][..points.count as usize], &[1, 2, 3]);

        let total: usize = RenderMode::ALL.iter().map(|m| m.entry().indices.len()).sum();
        assert_eq!(indices.len(), total);
    }

    #[test]
    fn loops_and_fans_are_lowered_when_unsupported() {
        let (registry, indices) =
            RenderModeRegistry::pack(|t| !matches!(t, Topology::LineLoop | Topology::TriangleFan));

        let lp = registry.get(RenderMode::LineLoop);
        assert_eq!(lp.topology, Topology::LineStrip);
        assert_eq!(&indices[lp.first as usize..][..lp.count as usize], &[2, 3, 4, 1, 0, 2]);

        let fan = registry.get(RenderMode::TriangleFan);
        assert_eq!(fan.topology, Topology::Triangles);
        assert_eq!(
            &indices[fan.first as usize..][..fan.count as usize],
            &[0, 1, 2, 0, 2, 3, 0, 3, 4]
        );
    }
}
