//! Diagnostic statistics over a built BVH.

use std::fmt;

use crate::bvh::{Bvh, BvhNode, NodeId};

/// Shape statistics gathered by a full traversal of a [`Bvh`].
///
/// Path lengths count nodes, so a tree that is a single leaf has a longest
/// path of 1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub total_node_depth: u64,
    pub total_leaf_depth: u64,
    pub shortest_path: u32,
    pub longest_path: u32,
    pub total_leaf_triangles: usize,
    pub total_leaf_area: f64,
    pub total_leaf_volume: f64,
    pub root_volume: f64,
    pub memory_bytes: usize,
}

impl BvhStats {
    pub fn compute(bvh: &Bvh) -> Self {
        let mut stats = Self {
            shortest_path: u32::MAX,
            memory_bytes: std::mem::size_of_val(bvh.nodes()),
            ..Default::default()
        };

        if let Some(root) = bvh.root() {
            stats.root_volume = root.bounding_box().volume() as f64;
            stats.visit(bvh, 0, 0);
        }
        if stats.leaves == 0 {
            stats.shortest_path = 0;
        }
        stats
    }

    fn visit(&mut self, bvh: &Bvh, id: NodeId, depth: u32) {
        self.nodes += 1;
        self.total_node_depth += depth as u64;

        match *bvh.node(id) {
            BvhNode::Leaf { count, bbox, .. } => {
                self.leaves += 1;
                self.total_leaf_depth += depth as u64;
                self.shortest_path = self.shortest_path.min(depth + 1);
                self.longest_path = self.longest_path.max(depth + 1);
                self.total_leaf_triangles += count as usize / 3;
                if !bbox.is_empty() {
                    self.total_leaf_area += bbox.area() as f64;
                    self.total_leaf_volume += bbox.volume() as f64;
                }
            }
            BvhNode::Branch { left, right, .. } => {
                self.visit(bvh, left, depth + 1);
                self.visit(bvh, right, depth + 1);
            }
        }
    }

    pub fn average_depth(&self) -> f64 {
        ratio(self.total_node_depth as f64, self.nodes)
    }

    pub fn average_leaf_depth(&self) -> f64 {
        ratio(self.total_leaf_depth as f64, self.leaves)
    }

    pub fn average_triangles_per_leaf(&self) -> f64 {
        ratio(self.total_leaf_triangles as f64, self.leaves)
    }

    pub fn average_leaf_area(&self) -> f64 {
        ratio(self.total_leaf_area, self.leaves)
    }

    /// Node count relative to a perfect binary tree of the longest path's depth.
    pub fn saturation(&self) -> f64 {
        let perfect = 2f64.powi(self.longest_path as i32) - 1.0;
        if perfect > 0.0 {
            self.nodes as f64 / perfect
        } else {
            0.0
        }
    }

    /// Summed leaf volume as a percentage of the root volume. Overlapping leaves
    /// can push this above 100.
    pub fn leaf_volume_percent(&self) -> f64 {
        if self.root_volume > 0.0 {
            100.0 * self.total_leaf_volume / self.root_volume
        } else {
            0.0
        }
    }
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

impl fmt::Display for BvhStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "nodes {} ({} leaves), {:.1} KB",
            self.nodes,
            self.leaves,
            self.memory_bytes as f64 / 1024.0
        )?;
        writeln!(
            f,
            "depth: avg {:.2}, leaf avg {:.2}, shortest path {}, longest path {}, saturation {:.2}%",
            self.average_depth(),
            self.average_leaf_depth(),
            self.shortest_path,
            self.longest_path,
            100.0 * self.saturation()
        )?;
        write!(
            f,
            "leaves: {:.2} triangles avg, area {:.4} avg, volume {:.2}% of root",
            self.average_triangles_per_leaf(),
            self.average_leaf_area(),
            self.leaf_volume_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Vec3;

    fn strip(triangles: usize) -> (Vec<Vec3>, Vec<u32>) {
        // Separate unit triangles spaced along +X
        let mut positions = Vec::new();
        for i in 0..triangles {
            let x = i as f32 * 2.0;
            positions.push(Vec3::new(x, 0.0, 0.0));
            positions.push(Vec3::new(x + 1.0, 0.0, 1.0));
            positions.push(Vec3::new(x, 1.0, 1.0));
        }
        let indices = (0..positions.len() as u32).collect();
        (positions, indices)
    }

    #[test]
    fn test_single_leaf_stats() {
        let (positions, mut indices) = strip(4);
        let bvh = Bvh::build(&positions, &mut indices);
        let stats = BvhStats::compute(&bvh);

        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.shortest_path, 1);
        assert_eq!(stats.longest_path, 1);
        assert_eq!(stats.total_leaf_triangles, 4);
        assert!((stats.saturation() - 1.0).abs() < 1e-9);
        assert!((stats.leaf_volume_percent() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_split_tree_stats_are_consistent() {
        let (positions, mut indices) = strip(200);
        let bvh = Bvh::build(&positions, &mut indices);
        let stats = BvhStats::compute(&bvh);

        assert_eq!(stats.nodes, bvh.nodes().len());
        // Binary tree: every branch has exactly two children
        assert_eq!(stats.leaves, (stats.nodes + 1) / 2);
        assert_eq!(stats.total_leaf_triangles, 200);
        assert!(stats.shortest_path >= 2);
        assert!(stats.longest_path >= stats.shortest_path);
        assert!(stats.saturation() > 0.0 && stats.saturation() <= 1.0);
        assert!(stats.memory_bytes >= stats.nodes * std::mem::size_of::<BvhNode>());
    }

    #[test]
    fn test_display_report() {
        let (positions, mut indices) = strip(50);
        let bvh = Bvh::build(&positions, &mut indices);
        let report = BvhStats::compute(&bvh).to_string();

        assert!(report.contains("leaves"));
        assert!(report.contains("saturation"));
    }
}
