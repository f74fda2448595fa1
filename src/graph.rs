//! Similarity graphs and the clusterings derived from them.
//!
//! Graphs are built over integer node ids `0..n` so that node `i` has
//! `NodeIndex` `i`. Every routine returns groups with members in ascending id
//! order, and groups sorted so that results are reproducible.
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};

/// Scores of unordered pairs of nodes `0..n_nodes`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PairwiseScores {
    n_nodes: usize,
    scores: BTreeMap<(usize, usize), f64>,
}

impl PairwiseScores {
    pub fn new(n_nodes: usize) -> Self {
        Self {
            n_nodes,
            scores: BTreeMap::new(),
        }
    }

    /// Set the score of the pair `{i, j}`. Grows the node set if needed.
    pub fn insert(&mut self, i: usize, j: usize, score: f64) {
        self.n_nodes = self.n_nodes.max(i + 1).max(j + 1);
        self.scores.insert((i.min(j), i.max(j)), score);
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.scores.get(&(i.min(j), i.max(j))).copied()
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// `(i, j, score)` with `i < j`, in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.scores.iter().map(|(&(i, j), &s)| (i, j, s))
    }
}

/// Connect every pair whose score is at least `threshold`. Node weights are
/// the node ids. Nodes without any scored pair are kept as isolated nodes.
pub fn similarities_to_graph(
    scores: &PairwiseScores,
    threshold: f64,
) -> UnGraph<usize, f64> {
    let mut graph =
        UnGraph::with_capacity(scores.n_nodes(), scores.len());
    for id in 0..scores.n_nodes() {
        graph.add_node(id);
    }
    for (i, j, score) in scores.iter() {
        if i != j && score >= threshold {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), score);
        }
    }
    graph
}

/// Replace node ids with `labels[id]`. Returns `None` if a node id has no
/// label.
pub fn label_nodes<L: Clone>(
    graph: &UnGraph<usize, f64>,
    labels: &[L],
) -> Option<UnGraph<L, f64>> {
    if graph.node_weights().any(|&id| id >= labels.len()) {
        return None;
    }
    Some(graph.map(|_, &id| labels[id].clone(), |_, &w| w))
}

fn adjacency<N, E>(graph: &UnGraph<N, E>) -> Vec<BTreeSet<usize>> {
    let mut adj = vec![BTreeSet::new(); graph.node_count()];
    for edge in graph.raw_edges() {
        let (a, b) = (edge.source().index(), edge.target().index());
        if a != b {
            adj[a].insert(b);
            adj[b].insert(a);
        }
    }
    adj
}

fn resolve<N: Clone>(
    graph: &UnGraph<N, f64>,
    groups: Vec<Vec<usize>>,
) -> Vec<Vec<N>> {
    groups
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|ix| graph[NodeIndex::new(ix)].clone())
                .collect()
        })
        .collect()
}

fn bron_kerbosch(
    adj: &[BTreeSet<usize>],
    r: &mut Vec<usize>,
    mut p: BTreeSet<usize>,
    mut x: BTreeSet<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if p.is_empty() && x.is_empty() {
        let mut clique = r.clone();
        clique.sort_unstable();
        out.push(clique);
        return;
    }

    // pivot on the node covering the most candidates
    let Some(pivot) = p
        .union(&x)
        .copied()
        .max_by_key(|&u| {
            (adj[u].intersection(&p).count(), std::cmp::Reverse(u))
        })
    else {
        return;
    };

    let candidates: Vec<usize> = p.difference(&adj[pivot]).copied().collect();
    for v in candidates {
        r.push(v);
        bron_kerbosch(
            adj,
            r,
            p.intersection(&adj[v]).copied().collect(),
            x.intersection(&adj[v]).copied().collect(),
            out,
        );
        r.pop();
        p.remove(&v);
        x.insert(v);
    }
}

/// All maximal cliques, isolated nodes included as singletons. Cliques are
/// sorted by their smallest member, then lexicographically.
///
/// Worst case exponential in the number of nodes.
pub fn max_cliques<N: Clone>(graph: &UnGraph<N, f64>) -> Vec<Vec<N>> {
    let adj = adjacency(graph);
    let mut cliques = Vec::new();
    bron_kerbosch(
        &adj,
        &mut Vec::new(),
        (0..graph.node_count()).collect(),
        BTreeSet::new(),
        &mut cliques,
    );
    cliques.sort();
    resolve(graph, cliques)
}

/// Connected components, ordered by their smallest member
pub fn connected_components<N: Clone>(graph: &UnGraph<N, f64>) -> Vec<Vec<N>> {
    let n = graph.node_count();
    let mut sets = UnionFind::<usize>::new(n);
    for edge in graph.raw_edges() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut roots: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for ix in 0..n {
        let root = sets.find(ix);
        match roots.iter().position(|&r| r == root) {
            Some(pos) => components[pos].push(ix),
            None => {
                roots.push(root);
                components.push(vec![ix]);
            }
        }
    }
    resolve(graph, components)
}

/// Partition the nodes into sets with no internal edges by greedy colouring.
///
/// Nodes are visited by decreasing degree, ties by id, and join the first set
/// holding none of their neighbours. Not guaranteed to use the fewest sets.
pub fn independent_sets<N: Clone>(graph: &UnGraph<N, f64>) -> Vec<Vec<N>> {
    let adj = adjacency(graph);
    let mut order: Vec<usize> = (0..adj.len()).collect();
    order.sort_by(|&a, &b| adj[b].len().cmp(&adj[a].len()).then(a.cmp(&b)));

    let mut sets: Vec<Vec<usize>> = Vec::new();
    for ix in order {
        match sets
            .iter_mut()
            .find(|set| set.iter().all(|other| !adj[ix].contains(other)))
        {
            Some(set) => set.push(ix),
            None => sets.push(vec![ix]),
        }
    }
    sets.iter_mut().for_each(|set| set.sort_unstable());
    resolve(graph, sets)
}
