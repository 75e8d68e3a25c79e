use order_service::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    models::{NewLineItem, NewOrder, OrderStatus},
    repository::{OrderRepository, OrmStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let store = OrmStore::new(orm);

    let orders = vec![
        (1, OrderStatus::Placed, vec![(101, 2), (102, 1)]),
        (1, OrderStatus::Shipped, vec![(103, 4)]),
        (2, OrderStatus::Returned, vec![(101, 1)]),
        (3, OrderStatus::Canceled, vec![]),
    ];

    for (customer_id, status, lines) in orders {
        let lines = lines
            .into_iter()
            .map(|(product_id, quantity)| NewLineItem {
                product_id,
                quantity,
            })
            .collect();
        let (order, items) = store
            .create_with_items(NewOrder { customer_id, status }, lines)
            .await?;
        println!(
            "Seeded order {} for customer {customer_id} ({status}, {} items)",
            order.id,
            items.len()
        );
    }

    println!("Seed completed");
    Ok(())
}
