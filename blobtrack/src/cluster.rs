//! Merging of fragmented foreground blobs into one detection per object

use crate::geometry::Detection;

/// Disjoint-set forest over detection indices
#[derive(Debug, Clone)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Returns true if the two elements were in different sets
    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Collapses raw detections that belong to the same physical object.
///
/// Two detections are linked when the closest pair of their bounding-box
/// corners is nearer than `merge_threshold * frame_diagonal`; every connected
/// group becomes one canonical detection.
#[derive(Debug, Clone)]
pub struct BlobClusterer {
    pub merge_threshold: f64,
}

impl BlobClusterer {
    pub fn new(merge_threshold: f64) -> Self {
        Self { merge_threshold }
    }

    /// Merge until no two output detections are within the merge distance.
    ///
    /// Output order follows the lowest raw index of each group.
    pub fn cluster(&self, detections: &[Detection], frame_diagonal: f64) -> Vec<Detection> {
        if detections.len() < 2 {
            return detections.to_vec();
        }

        let max_distance = self.merge_threshold * frame_diagonal;
        let mut current = detections.to_vec();
        let mut passes = 0;
        loop {
            passes += 1;
            let (merged, changed) = Self::merge_pass(&current, max_distance);
            current = merged;
            if !changed || current.len() < 2 {
                break;
            }
        }

        log::trace!(
            "Clustered {} raw detections into {} in {} pass(es)",
            detections.len(),
            current.len(),
            passes
        );
        current
    }

    fn merge_pass(detections: &[Detection], max_distance: f64) -> (Vec<Detection>, bool) {
        let n = detections.len();
        let mut sets = DisjointSet::new(n);
        let mut changed = false;

        for i in 0..n {
            for j in (i + 1)..n {
                let d = detections[i]
                    .bounding_box
                    .corner_distance(&detections[j].bounding_box);
                if d < max_distance {
                    changed |= sets.union(i, j);
                }
            }
        }

        if !changed {
            return (detections.to_vec(), false);
        }

        // Slot of each root in the output, assigned in order of first appearance
        let mut slot_for_root: Vec<Option<usize>> = vec![None; n];
        let mut merged: Vec<Detection> = Vec::new();
        for (i, detection) in detections.iter().enumerate() {
            let root = sets.find(i);
            match slot_for_root[root] {
                Some(slot) => merged[slot] = merged[slot].merge(detection),
                None => {
                    slot_for_root[root] = Some(merged.len());
                    merged.push(*detection);
                }
            }
        }

        (merged, true)
    }
}
