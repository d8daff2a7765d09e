//! Graph coloring for parallel constraint projection.
//!
//! Greedy coloring with per-node bitmasks. Springs that share a node get
//! different colors, so every color is a batch whose springs can be
//! projected concurrently without write conflicts. Batches run in color
//! order.

/// Springs grouped into conflict-free batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpringBatches {
    /// Spring indices reordered so each batch is contiguous.
    order: Vec<usize>,
    /// Start of each batch in `order`, plus a final end offset.
    offsets: Vec<usize>,
}

impl SpringBatches {
    /// Colors springs given as `(a, b)` node pairs.
    ///
    /// Springs are visited in order and take the lowest color not used by
    /// any spring already touching `a` or `b`. A spring that finds all 64
    /// colors taken is placed in a batch of its own.
    pub fn color(pairs: &[(u32, u32)], node_count: usize) -> Self {
        if pairs.is_empty() {
            return Self {
                order: Vec::new(),
                offsets: vec![0],
            };
        }

        // Colors already used around each node
        let mut node_masks: Vec<u64> = vec![0; node_count];
        let mut batches: Vec<Vec<usize>> = Vec::new();
        let mut overflow = Vec::new();

        for (si, &(a, b)) in pairs.iter().enumerate() {
            let (a, b) = (a as usize, b as usize);
            let used = node_masks[a] | node_masks[b];
            let color = (!used).trailing_zeros() as usize;
            if color >= 64 {
                overflow.push(si);
                continue;
            }
            node_masks[a] |= 1u64 << color;
            node_masks[b] |= 1u64 << color;
            if batches.len() <= color {
                batches.resize_with(color + 1, Vec::new);
            }
            batches[color].push(si);
        }
        batches.extend(overflow.into_iter().map(|si| vec![si]));

        let mut order = Vec::with_capacity(pairs.len());
        let mut offsets = vec![0usize];
        for batch in &batches {
            order.extend_from_slice(batch);
            offsets.push(order.len());
        }

        Self { order, offsets }
    }

    /// Number of batches.
    pub fn batch_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of springs across all batches.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Batches of spring indices, in projection order.
    pub fn batches(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets.windows(2).map(|w| &self.order[w[0]..w[1]])
    }
}
