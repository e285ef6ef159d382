//! Iterative walks over parent edges of the role graph.
//!
//! Both walks keep an explicit work-stack and a visited set, so a malformed
//! graph (for example a cycle written around the mutation guard) still
//! terminates. Depth is capped on top of that.

use std::collections::{BTreeSet, HashMap, HashSet};

use rolegraph_core::{AppError, AppResult};
use rolegraph_domain::{RoleId, TenantContext};

use crate::RoleGraphReader;

/// Longest inheritance chain a walk follows before giving up.
///
/// The mutation guard refuses edges that would create a longer chain, so
/// resolution only hits this cap on a graph written around the guard.
pub const MAX_INHERITANCE_DEPTH: usize = 64;

/// Which edges [`longest_chain`] follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainDirection {
    /// Follow parent edges towards the roots.
    Ancestors,
    /// Follow child edges towards the leaves.
    Descendants,
}

/// Returns whether inserting the edge "`child` inherits from `parent_candidate`"
/// would close a cycle.
///
/// That is the case when both ids are equal or when `child` is already an
/// ancestor of `parent_candidate`. Walks past [`MAX_INHERITANCE_DEPTH`]
/// count as cycles; the guard rejects chains that long separately.
pub async fn would_cycle<R>(
    reader: &R,
    parent_candidate: RoleId,
    child: RoleId,
) -> AppResult<bool>
where
    R: RoleGraphReader + ?Sized,
{
    if parent_candidate == child {
        return Ok(true);
    }

    let mut visited = HashSet::from([parent_candidate]);
    let mut stack = vec![(parent_candidate, 0_usize)];

    while let Some((role_id, depth)) = stack.pop() {
        if depth > MAX_INHERITANCE_DEPTH {
            tracing::warn!(
                parent_candidate = %parent_candidate,
                child = %child,
                "inheritance walk exceeded depth cap, treating edge as cyclic"
            );
            return Ok(true);
        }

        for ancestor in reader.list_parents(role_id).await? {
            if ancestor == child {
                return Ok(true);
            }
            if visited.insert(ancestor) {
                stack.push((ancestor, depth + 1));
            }
        }
    }

    Ok(false)
}

/// Returns the number of edges on the longest chain starting at `start` in
/// `direction`.
///
/// Results above [`MAX_INHERITANCE_DEPTH`] are reported as
/// `MAX_INHERITANCE_DEPTH + 1`. A cycle reached from `start` is reported the
/// same way.
pub async fn longest_chain<R>(
    reader: &R,
    start: RoleId,
    direction: ChainDirection,
) -> AppResult<usize>
where
    R: RoleGraphReader + ?Sized,
{
    let beyond_cap = MAX_INHERITANCE_DEPTH + 1;
    let mut lengths: HashMap<RoleId, usize> = HashMap::new();
    let mut neighbours: HashMap<RoleId, Vec<RoleId>> = HashMap::new();
    let mut path = vec![start];

    while let Some(&role_id) = path.last() {
        if path.len() > beyond_cap {
            return Ok(beyond_cap);
        }

        if !neighbours.contains_key(&role_id) {
            let next = match direction {
                ChainDirection::Ancestors => reader.list_parents(role_id).await?,
                ChainDirection::Descendants => reader.list_children(role_id).await?,
            };
            neighbours.insert(role_id, next);
        }
        let next = neighbours.get(&role_id).map(Vec::as_slice).unwrap_or_default();

        if let Some(pending) = next.iter().find(|next_id| !lengths.contains_key(*next_id)) {
            if path.contains(pending) {
                return Ok(beyond_cap);
            }
            path.push(*pending);
            continue;
        }

        let length = next
            .iter()
            .filter_map(|next_id| lengths.get(next_id))
            .map(|length| length + 1)
            .max()
            .unwrap_or_default()
            .min(beyond_cap);
        lengths.insert(role_id, length);
        path.pop();
    }

    Ok(lengths.get(&start).copied().unwrap_or_default())
}

/// Collects the names of every permission reachable from `root`, keeping only
/// permissions visible under `context`.
///
/// Roles already in `visited` contribute nothing and are not expanded again,
/// so a role reached along several paths is read once per `visited` set.
pub async fn collect_role_permissions<R>(
    reader: &R,
    root: RoleId,
    context: TenantContext,
    visited: &mut HashSet<RoleId>,
) -> AppResult<BTreeSet<String>>
where
    R: RoleGraphReader + ?Sized,
{
    let mut permissions = BTreeSet::new();
    let mut stack = vec![(root, 0_usize)];

    while let Some((role_id, depth)) = stack.pop() {
        if !visited.insert(role_id) {
            continue;
        }

        if depth > MAX_INHERITANCE_DEPTH {
            return Err(AppError::Internal(format!(
                "inheritance chain above role '{root}' exceeds {MAX_INHERITANCE_DEPTH} levels"
            )));
        }

        for permission in reader.list_direct_permissions(role_id).await? {
            if permission.scope().is_visible_in(context) {
                permissions.insert(permission.name().as_str().to_owned());
            }
        }

        for parent_id in reader.list_parents(role_id).await? {
            if !visited.contains(&parent_id) {
                stack.push((parent_id, depth + 1));
            }
        }
    }

    Ok(permissions)
}
