use super::{check_training_set, ModelError, Regressor};

/// Stopping and leaf-value parameters shared by the tree-based models.
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// L2 regularization added to the leaf denominator:
    /// `leaf = sum(y) / (count + leaf_regularization)`. Zero gives the
    /// plain mean; the Newton boosting variant uses 1.0.
    pub leaf_regularization: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            leaf_regularization: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART regression tree with variance-reduction splits.
///
/// Splits are chosen deterministically: for each feature the samples are
/// sorted and every midpoint between distinct adjacent values is scored by
/// the summed squared deviation of the two children.
#[derive(Debug, Clone, Default)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        params: &TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut working = indices.to_vec();
        tree.build(x, y, &mut working, 0, params);
        tree
    }

    fn build(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &mut [usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let at_depth_limit = params.max_depth.is_some_and(|limit| depth >= limit);
        if at_depth_limit || indices.len() < params.min_samples_split {
            return self.push_leaf(y, indices, params);
        }

        match best_split(x, y, indices, params.min_samples_leaf) {
            Some((feature, threshold)) => {
                let split_at = partition(x, indices, feature, threshold);
                // A degenerate partition means every candidate tied; stop here.
                if split_at == 0 || split_at == indices.len() {
                    return self.push_leaf(y, indices, params);
                }
                let node_index = self.nodes.len();
                self.nodes.push(Node::Leaf { value: 0.0 }); // placeholder
                let (left_indices, right_indices) = indices.split_at_mut(split_at);
                let left = self.build(x, y, left_indices, depth + 1, params);
                let right = self.build(x, y, right_indices, depth + 1, params);
                self.nodes[node_index] = Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
                node_index
            }
            None => self.push_leaf(y, indices, params),
        }
    }

    fn push_leaf(&mut self, y: &[f64], indices: &[usize], params: &TreeParams) -> usize {
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let value = sum / (indices.len() as f64 + params.leaf_regularization);
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Best (feature, threshold) by minimizing the children's summed squared
/// deviation, or `None` when no split improves on the parent.
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let n_features = x[indices[0]].len();

    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_score = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    let mut order: Vec<usize> = Vec::with_capacity(n);

    for feature in 0..n_features {
        order.clear();
        order.extend_from_slice(indices);
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for (count, window) in order.windows(2).enumerate() {
            let (current, next) = (window[0], window[1]);
            left_sum += y[current];
            left_sq += y[current] * y[current];
            let left_n = count + 1;
            let right_n = n - left_n;

            if x[current][feature] == x[next][feature] {
                continue;
            }
            if left_n < min_samples_leaf || right_n < min_samples_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let score = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if score < parent_score - 1e-12
                && best.map_or(true, |(_, _, best_score)| score < best_score)
            {
                let threshold = (x[current][feature] + x[next][feature]) / 2.0;
                best = Some((feature, threshold, score));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// Partition `indices` so rows with `x[i][feature] <= threshold` come
/// first; returns the boundary position.
fn partition(x: &[Vec<f64>], indices: &mut [usize], feature: usize, threshold: f64) -> usize {
    let mut boundary = 0;
    for i in 0..indices.len() {
        if x[indices[i]][feature] <= threshold {
            indices.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}

/// Single decision tree regressor (bounded depth, deterministic splits).
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    params: TreeParams,
    tree: Option<RegressionTree>,
}

impl DecisionTreeRegressor {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            params: TreeParams {
                max_depth,
                ..TreeParams::default()
            },
            tree: None,
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_training_set(x, y)?;
        let indices: Vec<usize> = (0..x.len()).collect();
        self.tree = Some(RegressionTree::fit(x, y, &indices, &self.params));
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        match &self.tree {
            Some(tree) => x.iter().map(|row| tree.predict_one(row)).collect(),
            None => vec![0.0; x.len()],
        }
    }

    fn unfitted(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            params: self.params.clone(),
            tree: None,
        })
    }
}
