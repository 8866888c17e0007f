use connectome_core::EdgeId;
use std::collections::HashMap;

/// Hands out edge ids for links that carry no identifier of their own.
///
/// The id depends on the endpoints, the link type and how many identical triples were
/// seen before it in the same payload, so reordering unrelated links leaves it unchanged.
#[derive(Default)]
pub struct LinkIdAllocator {
    seen: HashMap<(String, String, String), u32>,
}

impl LinkIdAllocator {
    pub fn next(&mut self, from: &str, to: &str, kind: &str) -> EdgeId {
        let n = self
            .seen
            .entry((from.to_string(), to.to_string(), kind.to_string()))
            .or_insert(0);
        let id = EdgeId(format!("search:{from}->{to}:{kind}#{n}"));
        *n += 1;
        id
    }
}
