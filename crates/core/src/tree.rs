//! Space page hierarchy as a flat list
//!
//! The space content endpoint returns pages in no useful order. Each page
//! carries its ancestors (root first) and its position among siblings, which
//! is enough to rebuild the hierarchy without one request per level.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::confluence::{ContentResponse, SimplifiedDict};

/// One page of the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub title: String,
    /// `None` for root pages
    pub parent_id: Option<String>,
    pub position: Option<i64>,
    /// 0 for root pages
    pub depth: usize,
}

/// Flattened hierarchy of a space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpacePageTree {
    pub space_key: String,
    pub total_pages: usize,
    pub pages: Vec<TreeNode>,
}

impl SimplifiedDict for SpacePageTree {}

fn position_of(page: &ContentResponse) -> Option<i64> {
    page.extensions
        .as_ref()
        .and_then(|ext| ext.position.as_ref())
        .and_then(|position| match position {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        })
}

/// Pure transformation: Build the flat hierarchy of a space
///
/// Pages are emitted depth first, siblings ordered by position (pages
/// without a position last) and then by title. A page whose parent was not
/// fetched keeps its `parent_id` and is listed among the roots. Every
/// deduplicated input page appears exactly once in the output.
pub fn build_page_tree(space_key: &str, pages: Vec<ContentResponse>) -> SpacePageTree {
    let mut seen = HashSet::new();
    let nodes: Vec<TreeNode> = pages
        .into_iter()
        .filter(|page| seen.insert(page.id.clone()))
        .map(|page| TreeNode {
            position: position_of(&page),
            depth: page.ancestors.len(),
            parent_id: page.ancestors.last().map(|a| a.id.clone()),
            id: page.id,
            title: page.title,
        })
        .collect();

    let known: HashSet<String> = nodes.iter().map(|node| node.id.clone()).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<String, Vec<TreeNode>> = HashMap::new();
    for node in nodes {
        match node.parent_id.clone() {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(node)
            }
            _ => roots.push(node),
        }
    }

    let mut ordered = Vec::with_capacity(known.len());
    walk(roots, &mut children, &mut ordered);

    // Ancestor chains that loop back on themselves never reach a root.
    while let Some(parent) = children.keys().min().cloned() {
        if let Some(nodes) = children.remove(&parent) {
            walk(nodes, &mut children, &mut ordered);
        }
    }

    SpacePageTree {
        space_key: space_key.to_string(),
        total_pages: ordered.len(),
        pages: ordered,
    }
}

/// Depth-first emission of `nodes` and their descendants.
fn walk(
    mut nodes: Vec<TreeNode>,
    children: &mut HashMap<String, Vec<TreeNode>>,
    ordered: &mut Vec<TreeNode>,
) {
    sort_siblings(&mut nodes);
    let mut stack: Vec<TreeNode> = nodes.into_iter().rev().collect();

    while let Some(node) = stack.pop() {
        if let Some(mut kids) = children.remove(&node.id) {
            sort_siblings(&mut kids);
            stack.extend(kids.into_iter().rev());
        }
        ordered.push(node);
    }
}

fn sort_siblings(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| {
        let a_pos = a.position.unwrap_or(i64::MAX);
        let b_pos = b.position.unwrap_or(i64::MAX);
        a_pos.cmp(&b_pos).then_with(|| a.title.cmp(&b.title))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(id: &str, title: &str, ancestors: &[&str], position: serde_json::Value) -> ContentResponse {
        let ancestors: Vec<_> = ancestors.iter().map(|a| json!({"id": a})).collect();
        serde_json::from_value(json!({
            "id": id,
            "type": "page",
            "title": title,
            "ancestors": ancestors,
            "extensions": {"position": position}
        }))
        .unwrap()
    }

    #[test]
    fn test_build_page_tree_depth_first() {
        // Arrange
        let pages = vec![
            page("3", "Child B", &["1"], json!(2)),
            page("1", "Home", &[], json!(0)),
            page("4", "Grandchild", &["1", "2"], json!("none")),
            page("2", "Child A", &["1"], json!(1)),
        ];

        // Act
        let tree = build_page_tree("DEV", pages);

        // Assert
        assert_eq!(tree.space_key, "DEV");
        assert_eq!(tree.total_pages, 4);
        let order: Vec<_> = tree.pages.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "4", "3"]);

        let grandchild = &tree.pages[2];
        assert_eq!(grandchild.parent_id, Some("2".to_string()));
        assert_eq!(grandchild.depth, 2);
        assert_eq!(grandchild.position, None);

        assert_eq!(tree.pages[0].parent_id, None);
        assert_eq!(tree.pages[0].depth, 0);
    }

    #[test]
    fn test_build_page_tree_orphans_listed_as_roots() {
        let pages = vec![
            page("10", "Orphan", &["99"], json!(0)),
            page("1", "Home", &[], json!(0)),
        ];

        let tree = build_page_tree("DEV", pages);

        let order: Vec<_> = tree.pages.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["1", "10"]);
        assert_eq!(tree.pages[1].parent_id, Some("99".to_string()));
    }

    #[test]
    fn test_build_page_tree_keeps_pages_with_cyclic_ancestors() {
        // Arrange
        let pages = vec![
            page("1", "Loop A", &["2"], json!(0)),
            page("2", "Loop B", &["1"], json!(0)),
            page("3", "Home", &[], json!(0)),
        ];

        // Act
        let tree = build_page_tree("DEV", pages);

        // Assert
        assert_eq!(tree.total_pages, 3);
        let mut ids: Vec<_> = tree.pages.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids[0], "3");
        ids.sort_unstable();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_build_page_tree_skips_duplicates() {
        let pages = vec![page("1", "Home", &[], json!(0)), page("1", "Home", &[], json!(0))];

        let tree = build_page_tree("DEV", pages);

        assert_eq!(tree.total_pages, 1);
    }

    #[test]
    fn test_space_tree_simplified_dict() {
        let tree = build_page_tree("DEV", vec![page("1", "Home", &[], json!(0))]);

        let dict = tree.to_simplified_dict();

        assert_eq!(dict["total_pages"], 1);
        assert_eq!(dict["pages"][0]["parent_id"], serde_json::Value::Null);
        assert_eq!(dict["pages"][0]["depth"], 0);
    }
}
