//! Product mutation scenarios against in-memory collaborators.

use shopwright_admin::error::{MutationError, MutationStage};
use shopwright_admin::models::ProductForm;
use shopwright_core::Role;
use shopwright_integration_tests::{Harness, caller, png, product_form};

// =============================================================================
// Slug Allocation
// =============================================================================

#[tokio::test]
async fn test_create_products_with_colliding_names() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    let products = h.state.products();

    let mut slugs = Vec::new();
    for _ in 0..3 {
        let id = products
            .create_product(Some(&admin), product_form("Classic White T-Shirt", shirts))
            .await
            .unwrap();
        slugs.push(h.catalog.product(id).unwrap().slug.into_inner());
    }

    assert_eq!(
        slugs,
        [
            "classic-white-t-shirt",
            "classic-white-t-shirt-1",
            "classic-white-t-shirt-2",
        ]
    );
}

#[tokio::test]
async fn test_create_reuses_gap_left_by_delete() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    h.catalog.seed_product("Polo", "polo", shirts);
    let middle = h.catalog.seed_product("Polo", "polo-1", shirts);
    h.catalog.seed_product("Polo", "polo-2", shirts);

    let products = h.state.products();
    products.delete_product(Some(&admin), middle).await.unwrap();
    let id = products
        .create_product(Some(&admin), product_form("Polo", shirts))
        .await
        .unwrap();

    assert_eq!(h.catalog.product(id).unwrap().slug.as_str(), "polo-1");
}

#[tokio::test]
async fn test_name_without_letters_is_a_slug_conflict() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);

    let err = h
        .state
        .products()
        .create_product(Some(&admin), product_form("!!!", shirts))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::SlugConflict { .. }));
    assert_eq!(h.catalog.writes(), 0);
    assert_eq!(h.storage.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_winner_surfaces_as_conflict() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    h.catalog.race_slug("linen-shirt");

    let err = h
        .state
        .products()
        .create_product(Some(&admin), product_form("Linen Shirt", shirts))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MutationError::SlugConflict {
            name: "Linen Shirt".to_string()
        }
    );
    // The image was already uploaded and is left behind.
    assert_eq!(h.storage.objects().len(), 1);
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_demo_admin_create_touches_nothing() {
    let h = Harness::new();
    let demo = caller(Role::DemoAdmin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    let reads_before = h.catalog.reads();

    let err = h
        .state
        .products()
        .create_product(Some(&demo), product_form("Classic White T-Shirt", shirts))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Unauthorized { .. }));
    assert_eq!(err.stage(), MutationStage::Authorizing);
    assert_eq!(h.catalog.reads(), reads_before);
    assert_eq!(h.catalog.writes(), 0);
    assert_eq!(h.storage.calls(), 0);
}

#[tokio::test]
async fn test_anonymous_cannot_mutate_products() {
    let h = Harness::new();
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    let polo = h.catalog.seed_product("Polo", "polo", shirts);
    let products = h.state.products();

    let create = products.create_product(None, product_form("Polo", shirts)).await;
    let update = products.update_product(None, polo, product_form("Polo", shirts)).await;
    let delete = products.delete_product(None, polo).await;

    for result in [create.map(|_| ()), update, delete] {
        assert!(matches!(result, Err(MutationError::Unauthorized { .. })));
    }
    assert_eq!(h.catalog.writes(), 0);
    assert!(h.catalog.product(polo).is_some());
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_with_unchanged_name_keeps_slug() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    let products = h.state.products();

    products
        .create_product(Some(&admin), product_form("Hat", shirts))
        .await
        .unwrap();
    let second = products
        .create_product(Some(&admin), product_form("Hat", shirts))
        .await
        .unwrap();
    let current = h.catalog.product(second).unwrap();
    assert_eq!(current.slug.as_str(), "hat-1");

    let form = ProductForm {
        name: "  HAT ".to_string(),
        price: "30".to_string(),
        retained_images: current.images.clone(),
        images: Vec::new(),
        ..product_form("ignored", shirts)
    };
    products.update_product(Some(&admin), second, form).await.unwrap();

    let updated = h.catalog.product(second).unwrap();
    assert_eq!(updated.slug.as_str(), "hat-1");
    assert_eq!(updated.name, "  HAT ".trim());
    assert_eq!(updated.price.to_string(), "30.00");
    assert_eq!(updated.images, current.images);
}

#[tokio::test]
async fn test_rename_allocates_new_slug_and_replaces_images() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    h.catalog.seed_product("Cap", "cap", shirts);
    let products = h.state.products();

    let id = products
        .create_product(Some(&admin), product_form("Hat", shirts))
        .await
        .unwrap();
    let original = h.catalog.product(id).unwrap();

    let form = ProductForm {
        images: vec![png("side.jpg")],
        retained_images: Vec::new(),
        ..product_form("Cap", shirts)
    };
    products.update_product(Some(&admin), id, form).await.unwrap();

    let updated = h.catalog.product(id).unwrap();
    assert_eq!(updated.slug.as_str(), "cap-1");
    assert_eq!(updated.images.len(), 1);
    assert!(updated.images[0].contains("/products/cap-1-1-"));
    assert_eq!(updated.primary_image.as_deref(), Some(updated.images[0].as_str()));

    let removed = h.storage.removed();
    assert_eq!(removed.len(), 1);
    assert!(original.images[0].ends_with(&removed[0].1));
}

#[tokio::test]
async fn test_update_requires_an_image() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    let id = h
        .state
        .products()
        .create_product(Some(&admin), product_form("Hat", shirts))
        .await
        .unwrap();
    let writes = h.catalog.writes();

    let form = ProductForm {
        images: Vec::new(),
        retained_images: vec!["https://elsewhere.test/not-ours.png".to_string()],
        ..product_form("Hat", shirts)
    };
    let err = h
        .state
        .products()
        .update_product(Some(&admin), id, form)
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Validation { field: "images", .. }));
    assert_eq!(h.catalog.writes(), writes);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_storage_failure_stops_before_persisting() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    h.storage.fail_uploads();

    let err = h
        .state
        .products()
        .create_product(Some(&admin), product_form("Hat", shirts))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), MutationStage::StoringImages);
    assert!(err.is_server_error());
    assert_eq!(h.catalog.writes(), 0);
}

#[tokio::test]
async fn test_unknown_category_is_a_persistence_failure() {
    let h = Harness::new();
    let admin = caller(Role::Admin);

    let err = h
        .state
        .products()
        .create_product(
            Some(&admin),
            product_form("Hat", shopwright_core::CategoryId::generate()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.stage(), MutationStage::Persisting);
    assert!(matches!(err, MutationError::Persistence { .. }));
}

#[tokio::test]
async fn test_invalid_price_is_rejected_before_any_call() {
    let h = Harness::new();
    let admin = caller(Role::Admin);
    let shirts = h.catalog.seed_category("Shirts", "shirts", true);
    let reads = h.catalog.reads();

    let form = ProductForm {
        price: "0.50".to_string(),
        ..product_form("Hat", shirts)
    };
    let err = h
        .state
        .products()
        .create_product(Some(&admin), form)
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Validation { field: "price", .. }));
    assert_eq!(h.catalog.reads(), reads);
    assert_eq!(h.storage.calls(), 0);
}
