//! Import planner: expands an `ImportRequest` into a flat, depth-bounded,
//! deterministic pre-order sequence of remote items.
//!
//! Traversal uses an explicit work stack instead of call recursion, so
//! memory stays bounded on pathological provider trees. Roots are visited
//! in request order, siblings in the order the lister returns them.

use std::collections::HashSet;

use super::report::ImportOutcome;
use super::types::{ImportRequest, RemoteError, RemoteItem, RemoteProvider};

/// Where a planned item goes in the local tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanParent {
    /// The request's target folder (or top level when absent).
    Target,
    /// Inside the local folder created for this remote folder id.
    Remote(String),
}

/// One entry of the flattened plan.
#[derive(Debug, Clone)]
pub struct PlannedItem {
    pub item: RemoteItem,
    /// Distance from the requested root; roots are depth 1.
    pub depth: u32,
    pub parent: PlanParent,
}

/// Planner output: the ordered item sequence plus outcomes for items that
/// could not be planned (metadata lookup or listing failures, duplicates).
#[derive(Debug, Default)]
pub struct Plan {
    pub items: Vec<PlannedItem>,
    pub skipped: Vec<ImportOutcome>,
}

struct Frame {
    item: RemoteItem,
    depth: u32,
    parent: PlanParent,
}

/// Expand the request into a plan.
///
/// Only `RemoteError::Auth` propagates; every other lister failure is scoped
/// to the item or branch it occurred on and lands in `plan.skipped`.
pub async fn build_plan(
    provider: &dyn RemoteProvider,
    request: &ImportRequest,
) -> Result<Plan, RemoteError> {
    let mut plan = Plan::default();
    let mut seen: HashSet<String> = HashSet::new();

    for root_id in &request.file_ids {
        let root = match provider.get_metadata(root_id).await {
            Ok(item) => item,
            Err(RemoteError::Auth(msg)) => return Err(RemoteError::Auth(msg)),
            Err(err) => {
                // One failed root never aborts the whole request.
                plan.skipped.push(ImportOutcome::Skipped {
                    remote_id: root_id.clone(),
                    display_name: root_id.clone(),
                    reason: err.skip_reason(),
                });
                continue;
            }
        };

        expand_branch(provider, request, root, &mut plan, &mut seen).await?;
    }

    Ok(plan)
}

/// Depth-first expansion of one requested root.
async fn expand_branch(
    provider: &dyn RemoteProvider,
    request: &ImportRequest,
    root: RemoteItem,
    plan: &mut Plan,
    seen: &mut HashSet<String>,
) -> Result<(), RemoteError> {
    let mut stack = vec![Frame {
        item: root,
        depth: 1,
        parent: PlanParent::Target,
    }];

    while let Some(frame) = stack.pop() {
        if request.skip_duplicates && !seen.insert(frame.item.id.clone()) {
            plan.skipped.push(ImportOutcome::Skipped {
                remote_id: frame.item.id.clone(),
                display_name: frame.item.name.clone(),
                reason: "duplicate".to_string(),
            });
            continue;
        }

        let descend = frame.item.is_folder()
            && request.include_folders
            && frame.depth < request.max_depth;

        // Folders at exactly max_depth are planned but their contents are
        // not visited; files are planned regardless of the recursion flag.
        plan.items.push(PlannedItem {
            item: frame.item.clone(),
            depth: frame.depth,
            parent: frame.parent.clone(),
        });

        if !descend {
            continue;
        }

        let listing = list_all_children(provider, &frame.item.id).await?;

        if let Some(err) = listing.error {
            // The unfetched remainder of this branch cannot be enumerated;
            // record the failure against the folder being listed. Pages
            // fetched before the failure stay planned, siblings are
            // unaffected.
            plan.skipped.push(ImportOutcome::Skipped {
                remote_id: frame.item.id.clone(),
                display_name: frame.item.name.clone(),
                reason: err.skip_reason(),
            });
        }

        // Reverse push so the stack pops siblings in lister order.
        for child in listing.items.into_iter().rev() {
            stack.push(Frame {
                item: child,
                depth: frame.depth + 1,
                parent: PlanParent::Remote(frame.item.id.clone()),
            });
        }
    }

    Ok(())
}

/// Children accumulated across listing pages. `error` is set when a later
/// page failed; `items` still holds everything fetched before the failure.
struct ChildListing {
    items: Vec<RemoteItem>,
    error: Option<RemoteError>,
}

/// Page through the lister until the cursor is exhausted. Only
/// `RemoteError::Auth` propagates; any other page failure ends the listing
/// early, keeping the pages already fetched.
async fn list_all_children(
    provider: &dyn RemoteProvider,
    folder_id: &str,
) -> Result<ChildListing, RemoteError> {
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        match provider.list_children(Some(folder_id), cursor.as_deref()).await {
            Ok(page) => {
                items.extend(page.items);
                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
            Err(RemoteError::Auth(msg)) => return Err(RemoteError::Auth(msg)),
            Err(err) => {
                return Ok(ChildListing {
                    items,
                    error: Some(err),
                })
            }
        }
    }

    Ok(ChildListing { items, error: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::testutil::{file, folder, FakeProvider};
    use crate::drive::types::ImportRequest;

    fn request(file_ids: Vec<&str>) -> ImportRequest {
        ImportRequest {
            file_ids: file_ids.into_iter().map(String::from).collect(),
            parent_folder_id: None,
            include_folders: true,
            max_depth: 5,
            skip_duplicates: false,
        }
    }

    fn planned_ids(plan: &Plan) -> Vec<&str> {
        plan.items.iter().map(|p| p.item.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_preorder_expansion() {
        // root/
        //   a/
        //     a1.txt
        //   b.txt
        let provider = FakeProvider::new()
            .with_item(folder("root", "root"))
            .with_item(folder("a", "a"))
            .with_item(file("a1", "a1.txt", 10))
            .with_item(file("b", "b.txt", 20))
            .with_children("root", vec!["a", "b"])
            .with_children("a", vec!["a1"]);

        let plan = build_plan(&provider, &request(vec!["root"])).await.unwrap();

        assert_eq!(planned_ids(&plan), vec!["root", "a", "a1", "b"]);
        assert!(plan.skipped.is_empty());

        let depths: Vec<u32> = plan.items.iter().map(|p| p.depth).collect();
        assert_eq!(depths, vec![1, 2, 3, 2]);
    }

    #[tokio::test]
    async fn test_depth_limit_plans_folder_but_not_children() {
        // depth 1: top, depth 2: mid, depth 3 (not visited): leaf.txt
        let provider = FakeProvider::new()
            .with_item(folder("top", "top"))
            .with_item(folder("mid", "mid"))
            .with_item(file("leaf", "leaf.txt", 1))
            .with_children("top", vec!["mid"])
            .with_children("mid", vec!["leaf"]);

        let mut req = request(vec!["top"]);
        req.max_depth = 2;

        let plan = build_plan(&provider, &req).await.unwrap();

        assert_eq!(planned_ids(&plan), vec!["top", "mid"]);
        assert!(plan.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_non_recursive_folder_plans_only_the_node() {
        let provider = FakeProvider::new()
            .with_item(folder("top", "top"))
            .with_item(file("leaf", "leaf.txt", 1))
            .with_children("top", vec!["leaf"]);

        let mut req = request(vec!["top"]);
        req.include_folders = false;

        let plan = build_plan(&provider, &req).await.unwrap();

        assert_eq!(planned_ids(&plan), vec!["top"]);
    }

    #[tokio::test]
    async fn test_missing_root_skipped_without_aborting_siblings() {
        let provider = FakeProvider::new()
            .with_item(file("ok1", "ok1.txt", 1))
            .with_item(file("ok2", "ok2.txt", 1));

        let plan = build_plan(&provider, &request(vec!["ok1", "missing", "ok2"]))
            .await
            .unwrap();

        assert_eq!(planned_ids(&plan), vec!["ok1", "ok2"]);
        assert_eq!(plan.skipped.len(), 1);
        match &plan.skipped[0] {
            ImportOutcome::Skipped { remote_id, reason, .. } => {
                assert_eq!(remote_id, "missing");
                assert_eq!(reason, "not found");
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pagination_exhausts_all_cursors() {
        let provider = FakeProvider::new()
            .with_item(folder("root", "root"))
            .with_item(file("p1", "p1.txt", 1))
            .with_item(file("p2", "p2.txt", 1))
            .with_item(file("p3", "p3.txt", 1))
            .with_children("root", vec!["p1", "p2", "p3"])
            .with_page_size(1);

        let plan = build_plan(&provider, &request(vec!["root"])).await.unwrap();

        assert_eq!(planned_ids(&plan), vec!["root", "p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_children_fetched_before_page_failure_stay_planned() {
        // Page 1 returns p1 and a cursor; page 2 fails. p1 must survive in
        // the plan, with one skip recorded for the unfetched remainder.
        let provider = FakeProvider::new()
            .with_item(folder("root", "root"))
            .with_item(file("p1", "p1.txt", 1))
            .with_item(file("p2", "p2.txt", 1))
            .with_children("root", vec!["p1", "p2"])
            .with_page_size(1)
            .with_listing_error_at("root", 1, RemoteError::RateLimited);

        let plan = build_plan(&provider, &request(vec!["root"])).await.unwrap();

        assert_eq!(planned_ids(&plan), vec!["root", "p1"]);
        assert_eq!(plan.skipped.len(), 1);
        match &plan.skipped[0] {
            ImportOutcome::Skipped { remote_id, reason, .. } => {
                assert_eq!(remote_id, "root");
                assert_eq!(reason, "remote provider rate limited the request");
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listing_failure_scoped_to_branch() {
        let provider = FakeProvider::new()
            .with_item(folder("bad", "bad"))
            .with_item(file("good", "good.txt", 1))
            .with_listing_error("bad", RemoteError::RateLimited);

        let plan = build_plan(&provider, &request(vec!["bad", "good"]))
            .await
            .unwrap();

        // The folder itself is still planned; its contents become one skip.
        assert_eq!(planned_ids(&plan), vec!["bad", "good"]);
        assert_eq!(plan.skipped.len(), 1);
    }

    #[tokio::test]
    async fn test_auth_error_aborts_planning() {
        let provider = FakeProvider::new().with_auth_error();

        let result = build_plan(&provider, &request(vec!["anything"])).await;
        assert!(matches!(result, Err(RemoteError::Auth(_))));
    }

    #[tokio::test]
    async fn test_duplicate_roots_planned_twice_by_default() {
        let provider = FakeProvider::new().with_item(file("f", "f.txt", 1));

        let plan = build_plan(&provider, &request(vec!["f", "f"])).await.unwrap();
        assert_eq!(planned_ids(&plan), vec!["f", "f"]);
    }

    #[tokio::test]
    async fn test_skip_duplicates_option() {
        let provider = FakeProvider::new().with_item(file("f", "f.txt", 1));

        let mut req = request(vec!["f", "f"]);
        req.skip_duplicates = true;

        let plan = build_plan(&provider, &req).await.unwrap();
        assert_eq!(planned_ids(&plan), vec!["f"]);
        assert_eq!(plan.skipped.len(), 1);
        match &plan.skipped[0] {
            ImportOutcome::Skipped { reason, .. } => assert_eq!(reason, "duplicate"),
            other => panic!("expected skip, got {other:?}"),
        }
    }
}
