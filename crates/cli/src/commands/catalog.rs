//! Product and category maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! sw-cli products list
//! sw-cli products delete 6f1c1f0e-4a7c-4b8e-9d7a-1b2c3d4e5f60
//! sw-cli categories list
//! sw-cli categories publish-drafts
//! sw-cli categories hide-empty
//! sw-cli categories delete-empty
//! sw-cli categories delete 6f1c1f0e-4a7c-4b8e-9d7a-1b2c3d4e5f60
//! ```
//!
//! Listing needs dashboard access; every other command needs an admin.

use shopwright_core::{CategoryId, ProductId};

use super::{CommandError, Context, parse_id};

#[allow(clippy::print_stdout)]
pub async fn list_products(ctx: &Context) -> Result<(), CommandError> {
    let products = ctx.state.catalog().list_products(ctx.caller()).await?;

    for product in products.iter() {
        let status = if product.is_active { "active" } else { "draft" };
        println!(
            "{}  {:<40}  {:>10}  stock {:>5}  {status}",
            product.id,
            product.slug.as_str(),
            product.price.to_string(),
            product.stock
        );
    }
    tracing::info!(count = products.len(), "Listed products");
    Ok(())
}

pub async fn delete_product(ctx: &Context, id: &str) -> Result<(), CommandError> {
    let id: ProductId = parse_id(id)?;
    ctx.state.products().delete_product(ctx.caller(), id).await?;
    tracing::info!(%id, "Product deleted");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn list_categories(ctx: &Context) -> Result<(), CommandError> {
    let categories = ctx.state.catalog().list_categories(ctx.caller()).await?;

    for category in categories.iter() {
        let status = if category.is_active { "active" } else { "hidden" };
        println!(
            "{}  {:<40}  {:>4} products  {status}",
            category.id,
            category.slug.as_str(),
            category.product_count
        );
    }
    tracing::info!(count = categories.len(), "Listed categories");
    Ok(())
}

pub async fn publish_drafts(ctx: &Context) -> Result<(), CommandError> {
    let count = ctx
        .state
        .categories()
        .publish_draft_categories(ctx.caller())
        .await?;
    tracing::info!(count, "Published draft categories");
    Ok(())
}

pub async fn hide_empty(ctx: &Context) -> Result<(), CommandError> {
    let count = ctx
        .state
        .categories()
        .hide_empty_categories(ctx.caller())
        .await?;
    tracing::info!(count, "Hid empty categories");
    Ok(())
}

pub async fn delete_empty(ctx: &Context) -> Result<(), CommandError> {
    let count = ctx
        .state
        .categories()
        .delete_empty_categories(ctx.caller())
        .await?;
    tracing::info!(count, "Deleted empty categories");
    Ok(())
}

pub async fn delete_category(ctx: &Context, id: &str) -> Result<(), CommandError> {
    let id: CategoryId = parse_id(id)?;
    ctx.state
        .categories()
        .delete_category(ctx.caller(), id)
        .await?;
    tracing::info!(%id, "Category deleted");
    Ok(())
}
