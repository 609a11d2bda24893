//! Hierarchy resolution over the creation forest
//!
//! Downward queries load the parent index into an in-memory adjacency arena
//! once, then walk it with an explicit stack. One storage scan per query
//! instead of one round-trip per tree level, and stack growth is bounded by
//! heap allocation rather than call depth.
//!
//! Upward queries (`is_descendant`, `parent_of`) follow `created_by` edges
//! directly; the chain is bounded by tree depth and the forest is acyclic by
//! construction (a parent always pre-exists its children and edges are never
//! rewritten).

use crate::{
    storage::Storage,
    types::{User, UserId},
    Result,
};
use std::collections::HashMap;
use std::sync::Arc;

/// One node of a materialized downline tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// The user at this node
    pub user: User,
    /// Sub-trees, sorted by username ascending
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, counting self
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Tree-shaped queries over the identity store
#[derive(Clone)]
pub struct Hierarchy {
    storage: Arc<Storage>,
}

impl Hierarchy {
    /// Create a resolver over the given store
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Load the full parent->children adjacency arena
    fn adjacency(&self) -> Result<HashMap<UserId, Vec<UserId>>> {
        let mut arena: HashMap<UserId, Vec<UserId>> = HashMap::new();
        for (parent, child) in self.storage.parent_edges()? {
            arena.entry(parent).or_default().push(child);
        }
        Ok(arena)
    }

    /// Ids of all descendants of `root`, pre-order, excluding `root`
    fn descendant_ids(arena: &HashMap<UserId, Vec<UserId>>, root: UserId) -> Vec<UserId> {
        let mut out = Vec::new();
        let mut stack: Vec<UserId> = match arena.get(&root) {
            Some(children) => children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(children) = arena.get(&id) {
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    /// All descendants of a user (not just immediate children), flat.
    /// Deterministic for deterministic input; no further order guarantee.
    pub fn downline(&self, user_id: UserId, include_self: bool) -> Result<Vec<User>> {
        let root = self.storage.get_user(user_id)?;
        let arena = self.adjacency()?;

        let ids = Self::descendant_ids(&arena, user_id);
        let mut users = Vec::with_capacity(ids.len() + 1);
        if include_self {
            users.push(root);
        }
        for id in ids {
            // Edges under a deleted intermediate node are unreachable from
            // here; a missing record mid-walk is tolerated, not an error
            if let Some(user) = self.storage.find_user(id)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// The downline as a nested tree, children sorted by username at every
    /// level. None if the user does not exist.
    pub fn downline_tree(&self, user_id: UserId) -> Result<Option<TreeNode>> {
        let root = match self.storage.find_user(user_id)? {
            Some(user) => user,
            None => return Ok(None),
        };
        let arena = self.adjacency()?;

        let mut order = vec![user_id];
        order.extend(Self::descendant_ids(&arena, user_id));

        let mut records: HashMap<UserId, User> = HashMap::with_capacity(order.len());
        records.insert(user_id, root);
        for id in order.iter().skip(1) {
            if let Some(user) = self.storage.find_user(*id)? {
                records.insert(*id, user);
            }
        }

        // Pre-order puts every parent before its children, so assembling in
        // reverse sees each child node built before its parent needs it
        let mut built: HashMap<UserId, TreeNode> = HashMap::with_capacity(order.len());
        for id in order.iter().rev() {
            let user = match records.remove(id) {
                Some(user) => user,
                None => continue,
            };
            let mut children: Vec<TreeNode> = arena
                .get(id)
                .map(|ids| ids.iter().filter_map(|c| built.remove(c)).collect())
                .unwrap_or_default();
            children.sort_by(|a, b| a.user.username.cmp(&b.user.username));
            built.insert(*id, TreeNode { user, children });
        }

        Ok(built.remove(&user_id))
    }

    /// True iff `candidate_id`'s parent chain reaches `ancestor_id`. A user
    /// is never its own descendant.
    pub fn is_descendant(&self, ancestor_id: UserId, candidate_id: UserId) -> Result<bool> {
        if ancestor_id == candidate_id {
            return Ok(false);
        }
        let mut current = candidate_id;
        loop {
            let user = match self.storage.find_user(current)? {
                Some(user) => user,
                None => return Ok(false),
            };
            match user.created_by {
                // A dangling edge to a deleted ancestor does not count
                Some(parent) if parent == ancestor_id => {
                    return Ok(self.storage.find_user(parent)?.is_some());
                }
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    /// Immediate children, sorted by username ascending
    pub fn next_level(&self, user_id: UserId) -> Result<Vec<User>> {
        self.storage.get_user(user_id)?;
        let mut children = Vec::new();
        for id in self.storage.children_ids(user_id)? {
            if let Some(user) = self.storage.find_user(id)? {
                children.push(user);
            }
        }
        children.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(children)
    }

    /// The immediate ancestor, or None for roots and dangling parent edges
    pub fn parent_of(&self, user_id: UserId) -> Result<Option<User>> {
        let user = self.storage.get_user(user_id)?;
        match user.created_by {
            Some(parent) => self.storage.find_user(parent),
            None => Ok(None),
        }
    }
}
