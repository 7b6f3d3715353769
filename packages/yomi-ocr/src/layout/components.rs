//! Connected components over boxes via an interval sweep.
//!
//! Items are visited in order of their start on the sweep axis. Only items still
//! "active" (whose end, extended by the largest reach, has not fallen behind the
//! current start) are tested against the current item, which keeps large frames
//! far from a full pairwise scan.

/// Interval on the sweep axis plus how far past its end it may still connect.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SweepItem {
    pub start: f32,
    pub end: f32,
    pub reach: f32,
}

struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }

    /// Members grouped by root; groups ordered by their smallest member.
    fn groups(mut self) -> Vec<Vec<usize>> {
        let len = self.parent.len();
        let mut slot_of_root = vec![usize::MAX; len];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for item in 0..len {
            let root = self.find(item);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot_of_root[root]].push(item);
        }
        groups
    }
}

/// Partitions `items` into components under the symmetric relation `connects`.
///
/// `connects` must only hold for pairs whose sweep-axis gap is below the larger
/// of the two reaches. Every returned group is sorted ascending.
pub(crate) fn connected_components<F>(items: &[SweepItem], mut connects: F) -> Vec<Vec<usize>>
where
    F: FnMut(usize, usize) -> bool,
{
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[a].start.total_cmp(&items[b].start).then(a.cmp(&b)));
    let max_reach = items
        .iter()
        .map(|item| item.reach)
        .filter(|reach| reach.is_finite())
        .fold(0.0_f32, f32::max);

    let mut sets = DisjointSet::new(items.len());
    let mut active: Vec<usize> = Vec::new();
    for &current in &order {
        let start = items[current].start;
        active.retain(|&other| items[other].end + max_reach >= start);
        for &other in &active {
            if sets.find(other) != sets.find(current) && connects(other, current) {
                sets.union(other, current);
            }
        }
        active.push(current);
    }
    sets.groups()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(start: f32, end: f32) -> SweepItem {
        SweepItem {
            start,
            end,
            reach: 0.0,
        }
    }

    #[test]
    fn test_empty_input_has_no_components() {
        assert!(connected_components(&[], |_, _| true).is_empty());
    }

    #[test]
    fn test_overlapping_chain_forms_one_component() {
        let items = [item(0.0, 10.0), item(8.0, 20.0), item(18.0, 30.0), item(50.0, 60.0)];
        let groups = connected_components(&items, |a, b| {
            let (x, y) = (items[a], items[b]);
            x.start.max(y.start) < x.end.min(y.end)
        });
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_reach_keeps_items_active_across_gaps() {
        let items = [
            SweepItem { start: 0.0, end: 10.0, reach: 15.0 },
            SweepItem { start: 20.0, end: 30.0, reach: 15.0 },
        ];
        let groups = connected_components(&items, |_, _| true);
        assert_eq!(groups, vec![vec![0, 1]]);

        let far = [
            SweepItem { start: 0.0, end: 10.0, reach: 5.0 },
            SweepItem { start: 20.0, end: 30.0, reach: 5.0 },
        ];
        let groups = connected_components(&far, |_, _| true);
        assert_eq!(groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_components_do_not_depend_on_input_order() {
        let items = [item(40.0, 50.0), item(0.0, 10.0), item(45.0, 55.0), item(5.0, 12.0)];
        let groups = connected_components(&items, |a, b| {
            let (x, y) = (items[a], items[b]);
            x.start.max(y.start) < x.end.min(y.end)
        });
        assert_eq!(groups, vec![vec![0, 2], vec![1, 3]]);
    }
}
