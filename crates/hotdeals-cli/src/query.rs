//! Read-only commands over the stored deals.

use serde_json::{json, Value};

/// Print one page of stored deals as pretty JSON.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn print_deals(
    pool: &sqlx::PgPool,
    filters: &hotdeals_db::DealFilters<'_>,
) -> anyhow::Result<()> {
    let page = hotdeals_db::get_deals(pool, filters).await?;
    println!("{}", serde_json::to_string_pretty(&deals_page_json(&page))?);
    Ok(())
}

/// Print merchant names, one per line.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn print_merchants(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let names = hotdeals_db::list_merchant_names(pool).await?;
    if names.is_empty() {
        println!("no merchants stored yet");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

pub(crate) fn deals_page_json(page: &hotdeals_db::DealsPage) -> Value {
    let products: Vec<Value> = page
        .products
        .iter()
        .map(|row| {
            json!({
                "id": row.id,
                "title": row.title,
                "price": row.price,
                "original_price": row.original_price,
                "discount": row.discount,
                "image_url": row.image_url,
                "product_url": row.product_url,
                "merchant": row.merchant,
                "merchant_image": row.merchant_image,
                "rating": row.rating,
                "reviews_count": row.reviews_count,
                "scraped_at": row.scraped_at.to_rfc3339(),
                "updated_at": row.updated_at.to_rfc3339(),
                "duplicate_count": row.duplicate_count,
            })
        })
        .collect();

    json!({
        "total_products": page.total_products,
        "page": page.page,
        "page_size": page.page_size,
        "products": products,
    })
}
