//! Strongly connected components of the parent graph and inherited key/values
//!
//! Components come out of Tarjan's algorithm in postorder: every component
//! is emitted after all components it points at through parent edges. The
//! inheritance pass relies on this, since a component's ancestors are always
//! finished before the component itself.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{Handle, MetadataCache};
use crate::record::RecordIdentity;
use crate::resolve::ParentGraph;
use crate::value::UserData;

/// Ancestor identity to that ancestor's full user data
pub type InheritedMap = BTreeMap<RecordIdentity, UserData>;

/// Output of [`calculate_scc`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SccResult {
    /// Component index of every handle, indexed by handle
    pub component_of: Vec<usize>,
    /// Components in emission order; members sorted by handle
    pub components: Vec<Vec<Handle>>,
}

impl SccResult {
    pub fn component(&self, handle: Handle) -> usize {
        self.component_of[handle.index()]
    }

    pub fn members(&self, handle: Handle) -> &[Handle] {
        &self.components[self.component(handle)]
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Work items for the explicit Tarjan stack
#[derive(Debug, Clone, Copy)]
enum Action {
    /// First visit of a node
    Visit(Handle),
    /// Examine edge number `next` of `node`
    Edge { node: Handle, next: usize },
    /// Fold a finished child's lowlink into its parent
    PostChild { node: Handle, child: Handle },
    /// All edges of `node` examined; pop a component if it is a root
    Finish(Handle),
}

#[derive(Clone, Copy)]
struct NodeState {
    index: usize,
    lowlink: usize,
    on_stack: bool,
}

/// Tarjan's strongly connected components over every node of `graph`.
///
/// Iterative, so deep chains cannot overflow the call stack. Self-loops
/// are ordinary edges and leave the node in its own component.
pub fn calculate_scc(graph: &ParentGraph) -> SccResult {
    let n = graph.len();
    let mut state: Vec<Option<NodeState>> = vec![None; n];
    let mut component_of = vec![0usize; n];
    let mut components: Vec<Vec<Handle>> = Vec::new();
    let mut tarjan_stack: Vec<Handle> = Vec::new();
    let mut actions: Vec<Action> = Vec::new();
    let mut counter = 0usize;

    for start in 0..n {
        if state[start].is_some() {
            continue;
        }
        actions.push(Action::Visit(Handle::from_index(start)));

        while let Some(action) = actions.pop() {
            match action {
                Action::Visit(v) => {
                    state[v.index()] = Some(NodeState {
                        index: counter,
                        lowlink: counter,
                        on_stack: true,
                    });
                    counter += 1;
                    tarjan_stack.push(v);
                    actions.push(Action::Edge { node: v, next: 0 });
                }
                Action::Edge { node, next } => {
                    let Some(&w) = graph.parents(node).get(next) else {
                        actions.push(Action::Finish(node));
                        continue;
                    };
                    actions.push(Action::Edge {
                        node,
                        next: next + 1,
                    });
                    match state[w.index()] {
                        None => {
                            actions.push(Action::PostChild { node, child: w });
                            actions.push(Action::Visit(w));
                        }
                        Some(ws) if ws.on_stack => {
                            lower(&mut state, node, ws.index);
                        }
                        Some(_) => {}
                    }
                }
                Action::PostChild { node, child } => {
                    if let Some(cs) = state[child.index()] {
                        lower(&mut state, node, cs.lowlink);
                    }
                }
                Action::Finish(v) => {
                    let Some(vs) = state[v.index()] else {
                        continue;
                    };
                    if vs.lowlink != vs.index {
                        continue;
                    }
                    let id = components.len();
                    let mut members = Vec::new();
                    while let Some(w) = tarjan_stack.pop() {
                        if let Some(ws) = state[w.index()].as_mut() {
                            ws.on_stack = false;
                        }
                        component_of[w.index()] = id;
                        members.push(w);
                        if w == v {
                            break;
                        }
                    }
                    members.sort_unstable();
                    components.push(members);
                }
            }
        }
    }

    tracing::debug!("Found {} component(s) over {} record(s)", components.len(), n);
    SccResult {
        component_of,
        components,
    }
}

fn lower(state: &mut [Option<NodeState>], node: Handle, candidate: usize) {
    if let Some(ns) = state[node.index()].as_mut() {
        ns.lowlink = ns.lowlink.min(candidate);
    }
}

/// Components plus the inherited map of each component
#[derive(Debug, Clone, Default)]
pub struct InheritedKeyvals {
    pub scc: SccResult,
    /// Inherited map per component, indexed like `scc.components`
    pub inherited: Vec<InheritedMap>,
}

impl InheritedKeyvals {
    /// Inherited map shared by every member of `handle`'s component
    pub fn for_handle(&self, handle: Handle) -> &InheritedMap {
        &self.inherited[self.scc.component(handle)]
    }
}

/// Inherited map of every component of `scc`.
///
/// Components are processed in emission order, so every ancestor component
/// is complete before it is read. Each parent contributes its own user data
/// keyed by its identity; a parent in another component also contributes
/// everything that component inherited. Ancestors are stored whole and
/// never merged field by field.
pub fn inherit_keyvals(
    cache: &MetadataCache,
    graph: &ParentGraph,
    scc: &SccResult,
) -> Vec<InheritedMap> {
    let mut inherited: Vec<InheritedMap> = Vec::with_capacity(scc.len());

    for (id, members) in scc.components.iter().enumerate() {
        let mut map = InheritedMap::new();
        for &member in members {
            for &parent in graph.parents(member) {
                let record = cache.get(parent);
                map.insert(record.identity(), record.user_data.clone());

                let parent_component = scc.component(parent);
                if parent_component != id {
                    let ancestors = &inherited[parent_component];
                    map.extend(ancestors.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }
        inherited.push(map);
    }

    inherited
}

/// Resolve the parent graph of the whole cache, compute its components and
/// the inherited map of each.
///
/// Unresolvable parents are skipped here; validation is what reports them.
pub fn calculate_scc_parent_keyvals(cache: &mut MetadataCache) -> InheritedKeyvals {
    let (graph, unresolved) = ParentGraph::build(cache);
    if !unresolved.is_empty() {
        tracing::debug!(
            "Ignoring {} unresolved parent reference(s) during inheritance",
            unresolved.len()
        );
    }
    let scc = calculate_scc(&graph);
    let inherited = inherit_keyvals(cache, &graph, &scc);
    InheritedKeyvals { scc, inherited }
}
