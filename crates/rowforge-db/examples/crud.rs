//! Example: CRUD against in-memory SQLite
//!
//! This example walks an entity through the full save/update/delete
//! cycle and shows a transactional bulk save.
//!
//! Run with: cargo run --example crud -p rowforge-db

use rowforge_db::{connect_sqlite, NamingConvention, Result};
use rowforge_derive::Entity;

#[derive(Debug, Clone, Entity, sqlx::FromRow)]
#[entity(table = "customers")]
struct Customer {
    #[field(primary_key)]
    id: i64,
    first_name: String,
    email: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut conn = connect_sqlite("sqlite::memory:", NamingConvention::SnakeCase).await?;

    conn.execute_raw(
        "CREATE TABLE customers (\
         id INTEGER PRIMARY KEY AUTOINCREMENT, \
         first_name TEXT NOT NULL, \
         email TEXT NOT NULL UNIQUE)",
        &mut [],
    )
    .await?;

    // Insert: the primary key is absent, so the row is inserted and
    // the generated key written back.
    let mut customer = Customer {
        id: 0,
        first_name: String::from("Ada"),
        email: String::from("ada@example.com"),
    };
    conn.save(&mut customer).await?;
    println!("inserted customer #{}", customer.id);

    // Update: the key is now present, so the same call updates.
    customer.email = String::from("lovelace@example.com");
    conn.save(&mut customer).await?;

    let loaded: Customer = conn.fetch_by_pk("customers", customer.id).await?;
    println!("loaded {} <{}>", loaded.first_name, loaded.email);

    // Bulk save: one transaction, full rollback on any failure.
    let mut batch = vec![
        Customer {
            id: 0,
            first_name: String::from("Grace"),
            email: String::from("grace@example.com"),
        },
        Customer {
            id: 0,
            first_name: String::from("Edsger"),
            email: String::from("edsger@example.com"),
        },
    ];
    conn.save_all(&mut batch).await?;
    println!("bulk-saved {} customers", batch.len());

    conn.delete(&customer).await?;
    conn.close().await?;
    Ok(())
}
