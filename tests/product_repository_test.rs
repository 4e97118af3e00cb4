mod common;

use assert_matches::assert_matches;
use catalog_api::{
    entities::Product,
    errors::RepositoryError,
    repositories::{ListFilter, ProductPatch, ProductRepository, ProductSort},
};
use chrono::Utc;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn product(name: &str, description: Option<&str>, price: Decimal, stock: i32) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: description.map(str::to_string),
        price,
        stock,
        category_id: None,
        image_url: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let mut input = product("Widget", Some("A useful widget"), dec!(9.99), 5);
    input.category_id = Some(Uuid::new_v4());
    input.image_url = Some("https://img.example.com/w.png".into());
    repo.create(&input).await.unwrap();

    let fetched = repo.get_by_id(input.id).await.unwrap();
    assert_eq!(fetched.name, "Widget");
    assert_eq!(fetched.description.as_deref(), Some("A useful widget"));
    assert_eq!(fetched.price.round_dp(2), dec!(9.99));
    assert_eq!(fetched.stock, 5);
    assert_eq!(fetched.category_id, input.category_id);
    assert_eq!(fetched.image_url, input.image_url);
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let app = TestApp::new().await;
    let repo = app.repository();

    assert_matches!(
        repo.get_by_id(Uuid::new_v4()).await,
        Err(RepositoryError::NotFound)
    );
    assert_matches!(
        repo.touch(Uuid::new_v4()).await,
        Err(RepositoryError::NotFound)
    );
    assert_matches!(
        repo.update(Uuid::new_v4(), &ProductPatch::default()).await,
        Err(RepositoryError::NotFound)
    );
}

#[tokio::test]
async fn invalid_rows_never_reach_the_table() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let err = repo
        .create(&product("Freebie", None, Decimal::ZERO, 1))
        .await
        .unwrap_err();
    assert!(!err.is_not_found());

    let err = repo
        .create(&product("Backorder", None, dec!(1), -1))
        .await
        .unwrap_err();
    assert!(!err.is_not_found());

    assert!(repo.list(&ListFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_applies_only_present_predicates() {
    let app = TestApp::new().await;
    let repo = app.repository();
    let category = Uuid::new_v4();

    let mut cheap = product("Cheap Widget", None, dec!(2.50), 3);
    cheap.category_id = Some(category);
    let mut mid = product("Mid Gadget", Some("Has a WIDGET inside"), dec!(15), 0);
    mid.category_id = Some(category);
    let pricey = product("Pricey Thing", None, dec!(99), 1);
    for p in [&cheap, &mid, &pricey] {
        repo.create(p).await.unwrap();
    }

    let all = repo.list(&ListFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let in_category = repo
        .list(&ListFilter {
            category_id: Some(category),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_category.len(), 2);

    let priced = repo
        .list(&ListFilter {
            min_price: Some(dec!(2.50)),
            max_price: Some(dec!(15)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(priced.len(), 2);
    assert!(priced.iter().all(|p| p.id != pricey.id));

    let searched = repo
        .list(&ListFilter {
            search: Some("widget".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let mut ids: Vec<_> = searched.iter().map(|p| p.id).collect();
    ids.sort();
    let mut expected = vec![cheap.id, mid.id];
    expected.sort();
    assert_eq!(ids, expected);

    let searched_within_price = repo
        .list(&ListFilter {
            search: Some("WIDGET".into()),
            max_price: Some(dec!(5)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched_within_price.len(), 1);
    assert_eq!(searched_within_price[0].id, cheap.id);
}

#[tokio::test]
async fn list_orders_and_paginates() {
    let app = TestApp::new().await;
    let repo = app.repository();

    for (name, price) in [
        ("Delta", dec!(4)),
        ("Alpha", dec!(8)),
        ("Charlie", dec!(1)),
        ("Bravo", dec!(6)),
    ] {
        repo.create(&product(name, None, price, 1)).await.unwrap();
    }

    let by_price = repo
        .list(&ListFilter {
            order_by: ProductSort::PriceAsc,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(by_price.windows(2).all(|w| w[0].price <= w[1].price));

    let by_price_desc = repo
        .list(&ListFilter {
            order_by: ProductSort::PriceDesc,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(by_price_desc.windows(2).all(|w| w[0].price >= w[1].price));

    let names: Vec<_> = repo
        .list(&ListFilter {
            order_by: ProductSort::NameAsc,
            limit: 2,
            offset: 1,
            ..Default::default()
        })
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Bravo", "Charlie"]);

    let names: Vec<_> = repo
        .list(&ListFilter {
            order_by: ProductSort::NameDesc,
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Delta"]);

    let newest_first = repo.list(&ListFilter::default()).await.unwrap();
    assert!(newest_first
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn update_persists_present_fields() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let mut input = product("Widget", Some("A useful widget"), dec!(9.99), 5);
    input.image_url = Some("https://img.example.com/w.png".into());
    let original = repo.create(&input).await.unwrap();

    let category = Uuid::new_v4();
    let updated = repo
        .update(
            original.id,
            &ProductPatch {
                name: Some("Widget Pro".into()),
                price: Some(dec!(19.99)),
                category_id: Some(category),
                image_url: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Widget Pro");

    let fetched = repo.get_by_id(original.id).await.unwrap();
    assert_eq!(fetched.name, "Widget Pro");
    assert_eq!(fetched.price.round_dp(2), dec!(19.99));
    assert_eq!(fetched.category_id, Some(category));
    assert_eq!(fetched.image_url, None);
    assert_eq!(fetched.description.as_deref(), Some("A useful widget"));
    assert_eq!(fetched.stock, 5);
    assert!(fetched.updated_at >= original.updated_at);
}

#[tokio::test]
async fn update_leaves_stock_to_the_atomic_path() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let original = repo
        .create(&product("Widget", None, dec!(9.99), 5))
        .await
        .unwrap();

    // A reservation lands between an admin's read and their price change.
    assert!(repo.update_stock(original.id, -2).await.unwrap());
    repo.update(
        original.id,
        &ProductPatch {
            price: Some(dec!(12.50)),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let fetched = repo.get_by_id(original.id).await.unwrap();
    assert_eq!(fetched.stock, 3);
    assert_eq!(fetched.price.round_dp(2), dec!(12.50));

    let err = repo
        .update(
            original.id,
            &ProductPatch {
                stock: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(repo.get_by_id(original.id).await.unwrap().stock, 3);
}

#[tokio::test]
async fn touch_only_stamps_updated_at() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let original = repo
        .create(&product("Widget", None, dec!(9.99), 5))
        .await
        .unwrap();
    repo.touch(original.id).await.unwrap();

    let fetched = repo.get_by_id(original.id).await.unwrap();
    assert_eq!(fetched.name, original.name);
    assert_eq!(fetched.stock, original.stock);
    assert!(fetched.updated_at >= original.updated_at);
}

#[tokio::test]
async fn update_stock_refuses_to_go_negative() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let p = repo
        .create(&product("Widget", None, dec!(9.99), 3))
        .await
        .unwrap();

    assert!(repo.update_stock(p.id, -2).await.unwrap());
    assert!(!repo.update_stock(p.id, -2).await.unwrap());
    assert_eq!(repo.get_by_id(p.id).await.unwrap().stock, 1);

    assert!(repo.update_stock(p.id, -1).await.unwrap());
    assert_eq!(repo.get_by_id(p.id).await.unwrap().stock, 0);

    assert!(repo.update_stock(p.id, 4).await.unwrap());
    assert_eq!(repo.get_by_id(p.id).await.unwrap().stock, 4);

    assert!(!repo.update_stock(Uuid::new_v4(), 1).await.unwrap());
}

#[tokio::test]
async fn update_stock_refuses_to_overflow() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let p = repo
        .create(&product("Widget", None, dec!(9.99), 5))
        .await
        .unwrap();

    assert!(!repo.update_stock(p.id, i32::MAX).await.unwrap());
    assert!(!repo.update_stock(p.id, i32::MAX - 4).await.unwrap());
    assert_eq!(repo.get_by_id(p.id).await.unwrap().stock, 5);

    assert!(repo.update_stock(p.id, i32::MAX - 5).await.unwrap());
    assert_eq!(repo.get_by_id(p.id).await.unwrap().stock, i32::MAX);
    assert_eq!(repo.list(&ListFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = TestApp::new().await;
    let repo = app.repository();

    let p = repo
        .create(&product("Widget", None, dec!(9.99), 3))
        .await
        .unwrap();

    repo.delete(p.id).await.unwrap();
    repo.delete(p.id).await.unwrap();
    assert_matches!(repo.get_by_id(p.id).await, Err(RepositoryError::NotFound));
}
