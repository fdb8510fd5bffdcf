use catalog_core::domain::product::NewProduct;
use catalog_db::{migrations, open_pool, ProductRepository, SqlProductRepository};
use rust_decimal::Decimal;

use crate::commands::{database_command, CommandResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match database_command("seed") {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlProductRepository::new(pool.clone());
        let outcome: Result<SeedOutcome, (&'static str, String, u8)> = seed_catalog(&repository)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8));

        pool.close().await;
        outcome
    });

    match result {
        Ok(SeedOutcome::Seeded(names)) => CommandResult::success(
            "seed",
            format!("seeded {} demo products: {}", names.len(), names.join(", ")),
        ),
        Ok(SeedOutcome::Skipped(existing)) => CommandResult::success(
            "seed",
            format!("catalog already holds {existing} products; seed skipped"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SeedOutcome {
    Seeded(Vec<String>),
    Skipped(usize),
}

fn demo_products() -> Vec<NewProduct> {
    vec![
        NewProduct {
            name: "Notebook".to_string(),
            quantity: 5,
            price: Decimal::new(350_000, 2),
            notes: Some("14-inch, 16 GB RAM".to_string()),
        },
        NewProduct {
            name: "Mouse".to_string(),
            quantity: 40,
            price: Decimal::new(5_990, 2),
            notes: None,
        },
        NewProduct {
            name: "Keyboard".to_string(),
            quantity: 25,
            price: Decimal::new(14_990, 2),
            notes: Some("ABNT2 layout".to_string()),
        },
    ]
}

/// Inserts the demo products only when the catalog is empty.
async fn seed_catalog(
    repository: &dyn ProductRepository,
) -> Result<SeedOutcome, catalog_db::RepositoryError> {
    let existing = repository.list().await?.len();
    if existing > 0 {
        return Ok(SeedOutcome::Skipped(existing));
    }

    let mut names = Vec::new();
    for product in demo_products() {
        names.push(repository.add(product).await?.name);
    }
    Ok(SeedOutcome::Seeded(names))
}
