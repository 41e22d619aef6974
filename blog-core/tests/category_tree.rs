mod common;

use common::{ADMIN, category, setup};
use shared::models::{
    CategoryCreate, CategorySearch, CategoryUpdate, MAX_CATEGORY_LEVEL, RecordStatus,
};
use shared::{Envelope, ErrorCode, PageRequest};

#[tokio::test]
async fn test_depth_limit_scenario() {
    let state = setup().await;

    let tech = category(&state, "Tech", None).await;
    assert_eq!(tech.level, 0);
    assert_eq!(tech.parent_id, None);

    let js = category(&state, "JS", Some(&tech)).await;
    assert_eq!(js.level, 1);
    assert_eq!(js.parent_id, Some(tech.id));

    let react = category(&state, "React", Some(&js)).await;
    let hooks = category(&state, "Hooks", Some(&react)).await;
    assert_eq!(hooks.level, MAX_CATEGORY_LEVEL);

    let err = state
        .categories
        .create(
            ADMIN,
            CategoryCreate {
                name: "useEffect".into(),
                parent_id: Some(hooks.id),
                sort_order: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BadRequest);
}

#[tokio::test]
async fn test_duplicate_name_scenario() {
    let state = setup().await;
    category(&state, "Tech", None).await;

    let err = state
        .categories
        .create(
            ADMIN,
            CategoryCreate {
                name: "Tech".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    let envelope = Envelope::from(Err::<(), _>(err));
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_validation() {
    let state = setup().await;

    let blank = state
        .categories
        .create(
            ADMIN,
            CategoryCreate {
                name: "   ".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(blank.code, ErrorCode::BadRequest);

    let orphan = state
        .categories
        .create(
            ADMIN,
            CategoryCreate {
                name: "Orphan".into(),
                parent_id: Some(404),
                sort_order: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(orphan.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_name_reusable_after_delete() {
    let state = setup().await;
    let first = category(&state, "Tech", None).await;
    state.categories.delete(ADMIN, first.id).await.unwrap();

    let second = category(&state, "Tech", None).await;
    assert_ne!(first.id, second.id);
    assert_eq!(state.categories.get_by_name("Tech").await.unwrap().id, second.id);
}

#[tokio::test]
async fn test_update_rename_excludes_self() {
    let state = setup().await;
    let tech = category(&state, "Tech", None).await;
    category(&state, "Life", None).await;

    let same = state
        .categories
        .update(
            ADMIN,
            tech.id,
            CategoryUpdate {
                name: Some("Tech".into()),
                sort_order: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same.sort_order, 3);

    let err = state
        .categories
        .update(
            ADMIN,
            tech.id,
            CategoryUpdate {
                name: Some("Life".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    let missing = state
        .categories
        .update(ADMIN, 404, CategoryUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(missing.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_reparent_rejects_self_and_cycles() {
    let state = setup().await;
    let a = category(&state, "A", None).await;
    let b = category(&state, "B", Some(&a)).await;
    let c = category(&state, "C", Some(&b)).await;

    let self_parent = state
        .categories
        .update(
            ADMIN,
            a.id,
            CategoryUpdate {
                parent_id: Some(Some(a.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(self_parent.code, ErrorCode::BadRequest);

    // A under its grandchild C would close a loop two hops away
    let cycle = state
        .categories
        .update(
            ADMIN,
            a.id,
            CategoryUpdate {
                parent_id: Some(Some(c.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(cycle.code, ErrorCode::BadRequest);

    // nothing moved
    assert_eq!(state.categories.get(a.id).await.unwrap().parent_id, None);
}

#[tokio::test]
async fn test_reparent_shifts_subtree_levels() {
    let state = setup().await;
    let a = category(&state, "A", None).await;
    let b = category(&state, "B", Some(&a)).await;
    let c = category(&state, "C", Some(&b)).await;
    let x = category(&state, "X", None).await;

    // B (with child C) moves under X: levels stay 1 and 2
    let moved = state
        .categories
        .update(
            ADMIN,
            b.id,
            CategoryUpdate {
                parent_id: Some(Some(x.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(x.id));
    assert_eq!(moved.level, 1);

    // B to the root lifts C to level 1
    let root = state
        .categories
        .update(
            ADMIN,
            b.id,
            CategoryUpdate {
                parent_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(root.level, 0);
    assert_eq!(state.categories.get(c.id).await.unwrap().level, 1);
}

#[tokio::test]
async fn test_reparent_rejects_subtree_past_max_depth() {
    let state = setup().await;
    let a = category(&state, "A", None).await;
    let a1 = category(&state, "A1", Some(&a)).await;
    let a2 = category(&state, "A2", Some(&a1)).await;
    let b = category(&state, "B", None).await;
    category(&state, "B1", Some(&b)).await;

    // B has height 1; under A2 it would land at 3 and its child at 4
    let err = state
        .categories
        .update(
            ADMIN,
            b.id,
            CategoryUpdate {
                parent_id: Some(Some(a2.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BadRequest);

    // under A1 it fits exactly
    let ok = state
        .categories
        .update(
            ADMIN,
            b.id,
            CategoryUpdate {
                parent_id: Some(Some(a1.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ok.level, 2);
}

#[tokio::test]
async fn test_depth_and_acyclicity_hold_after_many_moves() {
    let state = setup().await;
    let mut ids = Vec::new();
    for name in ["n0", "n1", "n2", "n3", "n4", "n5"] {
        ids.push(category(&state, name, None).await.id);
    }
    // deterministic pseudo-random sequence of re-parent attempts
    let mut seed: u64 = 7;
    for _ in 0..60 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let child = ids[(seed >> 33) as usize % ids.len()];
        let parent = ids[(seed >> 17) as usize % ids.len()];
        let target = if (seed >> 5) % 4 == 0 { None } else { Some(parent) };
        let _ = state
            .categories
            .update(
                ADMIN,
                child,
                CategoryUpdate {
                    parent_id: Some(target),
                    ..Default::default()
                },
            )
            .await;
    }

    let all = state
        .categories
        .list(&CategorySearch::default())
        .await
        .unwrap();
    let by_id: std::collections::HashMap<i64, _> = all
        .items
        .iter()
        .map(|n| (n.item.id, n.item.clone()))
        .collect();
    for node in &all.items {
        let mut hops = 0;
        let mut cursor = node.item.parent_id;
        while let Some(parent_id) = cursor {
            hops += 1;
            assert!(hops <= MAX_CATEGORY_LEVEL, "cycle or over-deep chain at {}", node.item.id);
            cursor = by_id[&parent_id].parent_id;
        }
        assert_eq!(node.item.level, hops);
    }
}

#[tokio::test]
async fn test_delete_rules() {
    let state = setup().await;
    let tech = category(&state, "Tech", None).await;
    let js = category(&state, "JS", Some(&tech)).await;

    let err = state.categories.delete(ADMIN, tech.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BadRequest);

    let deleted = state.categories.delete(ADMIN, js.id).await.unwrap();
    assert_eq!(deleted.status, RecordStatus::Deleted);
    assert_eq!(deleted.audit.deleter_id, Some(ADMIN));

    let again = state.categories.delete(ADMIN, js.id).await.unwrap_err();
    assert_eq!(again.code, ErrorCode::NotFound);
    assert_eq!(
        state.categories.get(js.id).await.unwrap_err().code,
        ErrorCode::NotFound
    );

    // leaf now, so it can go
    state.categories.delete(ADMIN, tech.id).await.unwrap();
}

#[tokio::test]
async fn test_multiple_delete_accounting() {
    let state = setup().await;
    let a = category(&state, "A", None).await;
    let b = category(&state, "B", None).await;
    let missing = 9_999;

    let result = state
        .categories
        .multiple_delete(ADMIN, &[a.id, b.id, missing])
        .await
        .unwrap();
    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 1);
    assert_eq!(result.failed_id_list, vec![missing]);
    assert_eq!(result.affected_id_list, vec![a.id, b.id]);
}

#[tokio::test]
async fn test_multiple_delete_keeps_parents_of_surviving_children() {
    let state = setup().await;
    let tech = category(&state, "Tech", None).await;
    let js = category(&state, "JS", Some(&tech)).await;
    let react = category(&state, "React", Some(&js)).await;
    let life = category(&state, "Life", None).await;
    let food = category(&state, "Food", Some(&life)).await;

    // whole Life subtree goes; Tech keeps React alive through JS
    let result = state
        .categories
        .multiple_delete(ADMIN, &[tech.id, js.id, life.id, food.id])
        .await
        .unwrap();
    assert_eq!(result.affected_id_list, vec![life.id, food.id]);
    assert_eq!(result.failed_id_list, vec![tech.id, js.id]);
    assert!(state.categories.get(react.id).await.is_ok());

    let bad = state.categories.multiple_delete(ADMIN, &[]).await.unwrap_err();
    assert_eq!(bad.code, ErrorCode::BadRequest);
}

#[tokio::test]
async fn test_list_window_and_filters() {
    let state = setup().await;
    let tech = category(&state, "Tech", None).await;
    for name in ["Rust", "Go", "Zig"] {
        category(&state, name, Some(&tech)).await;
    }
    let old = category(&state, "Old Tech", None).await;
    state.categories.delete(ADMIN, old.id).await.unwrap();

    let children = state
        .categories
        .list(&CategorySearch {
            parent_id: Some(tech.id),
            page: PageRequest::page(2, 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(children.total_cnt, 3);
    assert_eq!(children.items.len(), 1);
    assert_eq!(children.items[0].row_no, 3);
    assert_eq!(children.offset, 2);

    let past_end = state
        .categories
        .list(&CategorySearch {
            parent_id: Some(tech.id),
            page: PageRequest::page(5, 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(past_end.is_empty());
    assert_eq!(past_end.total_cnt, 3);
    assert_eq!(past_end.offset, 8);

    let tech_names = state
        .categories
        .list(&CategorySearch {
            name: Some("Tech".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(tech_names.total_cnt, 1);

    let with_deleted = state
        .categories
        .list(&CategorySearch {
            name: Some("Tech".into()),
            include_deleted: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(with_deleted.total_cnt, 2);

    let nothing = state
        .categories
        .list(&CategorySearch {
            level: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(nothing.total_cnt, 0);
    assert!(nothing.items.is_empty());
}

#[tokio::test]
async fn test_tree_nests_active_categories() {
    let state = setup().await;
    let tech = category(&state, "Tech", None).await;
    let js = category(&state, "JS", Some(&tech)).await;
    category(&state, "React", Some(&js)).await;
    let life = category(&state, "Life", None).await;
    let gone = category(&state, "Gone", Some(&life)).await;
    state.categories.delete(ADMIN, gone.id).await.unwrap();

    let tree = state.categories.tree().await.unwrap();
    assert_eq!(tree.len(), 2);
    let tech_node = tree.iter().find(|n| n.category.id == tech.id).unwrap();
    assert_eq!(tech_node.children.len(), 1);
    assert_eq!(tech_node.children[0].children[0].category.name, "React");
    let life_node = tree.iter().find(|n| n.category.id == life.id).unwrap();
    assert!(life_node.children.is_empty());
}
