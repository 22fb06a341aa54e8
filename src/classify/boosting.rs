use crate::classify::tfidf::SparseVector;
use crate::classify::BinaryClassifier;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// L2 penalty on leaf weights.
    pub lambda: f64,
    pub min_child_weight: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 4,
            lambda: 1.0,
            min_child_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features.get(*feature).copied().unwrap_or(0.0);
                    index = if x < *threshold { *left } else { *right };
                }
            }
        }
    }

    fn predict_sparse(&self, row: &SparseVector) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row
                        .indices
                        .binary_search(feature)
                        .map(|pos| row.values[pos])
                        .unwrap_or(0.0);
                    index = if x < *threshold { *left } else { *right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [SparseVector],
    gradients: &'a [f64],
    hessians: &'a [f64],
    params: &'a BoostingParams,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        -g / (h + self.params.lambda) * self.params.learning_rate
    }

    fn build(mut self, samples: Vec<usize>) -> Tree {
        self.grow(samples, 0);
        Tree { nodes: self.nodes }
    }

    /// Appends the subtree for `samples` and returns its root index.
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let g: f64 = samples.iter().map(|&i| self.gradients[i]).sum();
        let h: f64 = samples.iter().map(|&i| self.hessians[i]).sum();
        let leaf = Node::Leaf(self.leaf_value(g, h));
        let index = self.nodes.len();
        self.nodes.push(leaf);

        if depth >= self.params.max_depth || samples.len() < 2 {
            return index;
        }

        let Some(split) = self.best_split(&samples, g, h) else {
            return index;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) =
            samples.into_iter().partition(|&i| {
                let x = self.rows[i]
                    .indices
                    .binary_search(&split.feature)
                    .map(|pos| self.rows[i].values[pos])
                    .unwrap_or(0.0);
                x < split.threshold
            });

        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn best_split(&self, samples: &[usize], g_total: f64, h_total: f64) -> Option<SplitCandidate> {
        // (feature, value, sample) for every non-zero entry in the node
        let mut entries: Vec<(usize, f64, usize)> = samples
            .iter()
            .flat_map(|&s| self.rows[s].iter().map(move |(f, v)| (f, v, s)))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let parent_score = self.score(g_total, h_total);
        let min_child = self.params.min_child_weight;
        let mut best: Option<SplitCandidate> = None;

        let mut start = 0;
        while start < entries.len() {
            let feature = entries[start].0;
            let end = entries[start..]
                .iter()
                .position(|e| e.0 != feature)
                .map(|offset| start + offset)
                .unwrap_or(entries.len());
            let group = &entries[start..end];

            let g_nonzero: f64 = group.iter().map(|e| self.gradients[e.2]).sum();
            let h_nonzero: f64 = group.iter().map(|e| self.hessians[e.2]).sum();
            // samples without this feature sit at zero, below every stored value
            let mut g_left = g_total - g_nonzero;
            let mut h_left = h_total - h_nonzero;
            let zero_count = samples.len() - group.len();
            let mut lower = 0.0;

            let mut k = 0;
            while k < group.len() {
                let value = group[k].1;
                let left_occupied = k > 0 || zero_count > 0;
                if left_occupied && value > lower {
                    let g_right = g_total - g_left;
                    let h_right = h_total - h_left;
                    if h_left >= min_child && h_right >= min_child {
                        let gain = 0.5
                            * (self.score(g_left, h_left) + self.score(g_right, h_right)
                                - parent_score);
                        if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                            best = Some(SplitCandidate {
                                feature,
                                threshold: (lower + value) / 2.0,
                                gain,
                            });
                        }
                    }
                }
                // move every entry with this value to the left side
                while k < group.len() && group[k].1 == value {
                    g_left += self.gradients[group[k].2];
                    h_left += self.hessians[group[k].2];
                    k += 1;
                }
                lower = value;
            }

            start = end;
        }

        best
    }
}

/// Gradient-boosted regression trees on the logistic loss, second-order
/// split gains, base margin zero.
#[derive(Debug, Clone)]
pub struct BoostedTrees {
    trees: Vec<Tree>,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl BoostedTrees {
    pub fn fit(rows: &[SparseVector], labels: &[bool], params: &BoostingParams) -> Result<Self> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(EtlError::TrainingError {
                message: format!(
                    "boosted trees need matching non-empty rows and labels (got {} and {})",
                    rows.len(),
                    labels.len()
                ),
            });
        }

        let mut margins = vec![0.0; rows.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let mut gradients = Vec::with_capacity(rows.len());
            let mut hessians = Vec::with_capacity(rows.len());
            for (margin, &y) in margins.iter().zip(labels) {
                let p = sigmoid(*margin);
                gradients.push(p - if y { 1.0 } else { 0.0 });
                hessians.push((p * (1.0 - p)).max(1e-16));
            }

            let builder = TreeBuilder {
                rows,
                gradients: &gradients,
                hessians: &hessians,
                params,
                nodes: Vec::new(),
            };
            let tree = builder.build((0..rows.len()).collect());

            for (margin, row) in margins.iter_mut().zip(rows) {
                *margin += tree.predict_sparse(row);
            }
            if round % 50 == 0 {
                tracing::debug!("Boosting round {}: {} nodes", round, tree.nodes.len());
            }
            trees.push(tree);
        }

        Ok(Self { trees })
    }

    pub fn margin(&self, features: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.predict(features)).sum()
    }

    pub fn probability(&self, features: &[f64]) -> f64 {
        sigmoid(self.margin(features))
    }

    #[cfg(test)]
    fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl BinaryClassifier for BoostedTrees {
    fn predict(&self, features: &[f64]) -> bool {
        self.margin(features) > 0.0
    }
}
