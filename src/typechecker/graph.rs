use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

#[derive(Debug, Default)]
struct Edges<NodeType> {
    edges: Vec<NodeType>,
    // not kept in sync with `edges` while a sort is running
    in_degree: usize,
}

/// A directed graph with Kahn topological sorting, used for the struct
/// dependency check.
#[derive(Debug)]
pub struct Graph<NodeType> {
    graph: HashMap<NodeType, Edges<NodeType>>,
}

impl<NodeType: Eq + Hash + Clone> Graph<NodeType> {
    pub fn new() -> Self {
        Graph {
            graph: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeType) -> bool {
        if self.graph.contains_key(&node) {
            return false;
        }
        self.graph.insert(
            node,
            Edges {
                edges: vec![],
                in_degree: 0,
            },
        );
        true
    }

    pub fn add_edge(&mut self, from: NodeType, to: NodeType) -> bool {
        if !self.graph.contains_key(&from) || !self.graph.contains_key(&to) {
            return false;
        }
        let from_edges = self.graph.get_mut(&from).expect("node exists");
        if from_edges.edges.contains(&to) {
            return false;
        }
        from_edges.edges.push(to.clone());
        self.graph.get_mut(&to).expect("node exists").in_degree += 1;
        true
    }

    /// True iff the graph is acyclic.
    pub fn topological_sort(&mut self) -> bool {
        let mut queue: VecDeque<NodeType> = self
            .graph
            .iter()
            .filter(|(_, e)| e.in_degree == 0)
            .map(|(n, _)| n.clone())
            .collect();
        let mut out_count = 0usize;
        while let Some(node) = queue.pop_front() {
            let targets = self.graph[&node].edges.clone();
            for to in targets {
                let entry = self.graph.get_mut(&to).expect("node exists");
                entry.in_degree -= 1;
                if entry.in_degree == 0 {
                    queue.push_back(to);
                }
            }
            out_count += 1;
        }
        out_count == self.graph.len()
    }
}

impl<NodeType: Eq + Hash + Clone> Default for Graph<NodeType> {
    fn default() -> Self {
        Graph::new()
    }
}
