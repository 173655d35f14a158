//! Order Repository

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::time::Duration;
use tracing::{debug, info};

use crate::query::{push_predicates, HistoryQuerySpec};
use crate::StorageError;

/// Most recent matches returned per search.
const MAX_RESULTS: i64 = 10;

/// Base projection for every history search. Joins resolve the original
/// purchase date when the finalized order maps back to a procurement order.
const BASE_QUERY: &str = "\
SELECT DISTINCT
    f.id,
    f.vendor_name,
    f.order_number,
    f.length,
    f.width,
    f.height,
    f.volume,
    f.product_name,
    f.model,
    f.specification,
    f.outlet_direction,
    f.material,
    f.casing_material,
    f.frame_material,
    f.static_pressure_mmaq,
    f.horsepower_hp,
    f.airflow_ncmm,
    f.impeller_diameter_mm,
    f.operating_temperature_c,
    f.drive_method,
    f.fire_spark_level,
    f.single_double_suction,
    f.fan_grade,
    f.unit_price,
    f.purchase_quantity,
    f.created_at,
    p.purchase_date
FROM final_processed_orders f
LEFT JOIN procurement_final_mapping m ON f.id = m.final_processed_id
LEFT JOIN procurement_orders p ON m.procurement_id = p.id
WHERE f.unit_price IS NOT NULL AND f.unit_price > 0";

const SCHEMA_STATEMENTS: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS final_processed_orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        vendor_name TEXT,
        order_number TEXT,
        length REAL,
        width REAL,
        height REAL,
        volume REAL,
        product_name TEXT,
        model TEXT,
        specification TEXT,
        outlet_direction TEXT,
        material TEXT,
        casing_material TEXT,
        frame_material TEXT,
        static_pressure_mmaq REAL,
        horsepower_hp REAL,
        airflow_ncmm REAL,
        impeller_diameter_mm REAL,
        operating_temperature_c REAL,
        drive_method TEXT,
        fire_spark_level TEXT,
        single_double_suction TEXT,
        fan_grade TEXT,
        unit_price REAL,
        purchase_quantity REAL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS procurement_orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_number TEXT,
        purchase_date TEXT
    )",
    "CREATE TABLE IF NOT EXISTS procurement_final_mapping (
        procurement_id INTEGER NOT NULL,
        final_processed_id INTEGER NOT NULL
    )",
];

/// A read-only historical purchase row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryRecord {
    pub id: i64,
    pub vendor_name: Option<String>,
    pub order_number: Option<String>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub volume: Option<f64>,
    pub product_name: Option<String>,
    pub model: Option<String>,
    pub specification: Option<String>,
    pub outlet_direction: Option<String>,
    pub material: Option<String>,
    pub casing_material: Option<String>,
    pub frame_material: Option<String>,
    pub static_pressure_mmaq: Option<f64>,
    pub horsepower_hp: Option<f64>,
    pub airflow_ncmm: Option<f64>,
    pub impeller_diameter_mm: Option<f64>,
    pub operating_temperature_c: Option<f64>,
    pub drive_method: Option<String>,
    pub fire_spark_level: Option<String>,
    pub single_double_suction: Option<String>,
    pub fan_grade: Option<String>,
    pub unit_price: f64,
    pub purchase_quantity: Option<f64>,
    pub created_at: Option<NaiveDateTime>,
    pub purchase_date: Option<NaiveDate>,
}

/// Repository over the procurement order store.
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Connect to the order store.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        info!("connecting order store: {database_url}");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Tests use this with an in-memory database.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the order tables when they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Liveness probe for the health endpoint.
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Tolerant search over past orders, most recent first.
    ///
    /// Returns at most 10 positively-priced records, ordered by purchase
    /// date with creation time as the fallback. A store failure surfaces as
    /// an error, never as a silently truncated result.
    pub async fn search(&self, spec: &HistoryQuerySpec) -> Result<Vec<HistoryRecord>, StorageError> {
        let predicates = spec.predicates();
        debug!(predicates = predicates.len(), "executing history search");

        let mut builder = QueryBuilder::<Sqlite>::new(BASE_QUERY);
        push_predicates(&mut builder, &predicates);
        builder.push(" ORDER BY COALESCE(p.purchase_date, f.created_at) DESC LIMIT ");
        builder.push_bind(MAX_RESULTS);

        let records = builder
            .build_query_as::<HistoryRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Insertable slice of an order row. Everything not under test stays NULL.
    #[derive(Debug, Clone, Default)]
    struct Fixture {
        length: Option<f64>,
        horsepower: Option<f64>,
        material: Option<&'static str>,
        casing_material: Option<&'static str>,
        model: Option<&'static str>,
        specification: Option<&'static str>,
        unit_price: Option<f64>,
        created_at: String,
    }

    impl Fixture {
        fn priced(unit_price: f64, created_at: &str) -> Self {
            Self {
                unit_price: Some(unit_price),
                created_at: created_at.to_string(),
                ..Self::default()
            }
        }
    }

    async fn repo() -> OrderRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = OrderRepository::from_pool(pool);
        repo.ensure_schema().await.unwrap();
        repo
    }

    async fn insert(repo: &OrderRepository, fixture: Fixture) -> i64 {
        let result = sqlx::query(
            "INSERT INTO final_processed_orders
                (length, horsepower_hp, material, casing_material, model,
                 specification, unit_price, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fixture.length)
        .bind(fixture.horsepower)
        .bind(fixture.material)
        .bind(fixture.casing_material)
        .bind(fixture.model)
        .bind(fixture.specification)
        .bind(fixture.unit_price)
        .bind(fixture.created_at)
        .execute(&repo.pool)
        .await
        .unwrap();
        result.last_insert_rowid()
    }

    async fn link_purchase(repo: &OrderRepository, final_id: i64, purchase_date: &str) {
        let order = sqlx::query("INSERT INTO procurement_orders (purchase_date) VALUES (?)")
            .bind(purchase_date)
            .execute(&repo.pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO procurement_final_mapping (procurement_id, final_processed_id)
             VALUES (?, ?)",
        )
        .bind(order.last_insert_rowid())
        .bind(final_id)
        .execute(&repo.pool)
        .await
        .unwrap();
    }

    fn spec(setter: impl FnOnce(&mut HistoryQuerySpec)) -> HistoryQuerySpec {
        let mut spec = HistoryQuerySpec::default();
        setter(&mut spec);
        spec
    }

    #[tokio::test]
    async fn test_length_band_filters_to_twenty_percent() {
        let repo = repo().await;
        for length in [700.0, 800.0, 1000.0, 1200.0, 1300.0] {
            insert(
                &repo,
                Fixture {
                    length: Some(length),
                    ..Fixture::priced(500.0, "2024-01-01 10:00:00")
                },
            )
            .await;
        }

        let records = repo
            .search(&spec(|s| s.length = Some("1000".into())))
            .await
            .unwrap();

        let mut lengths: Vec<f64> = records.iter().filter_map(|r| r.length).collect();
        lengths.sort_by(f64::total_cmp);
        assert_eq!(lengths, vec![800.0, 1000.0, 1200.0]);
    }

    #[tokio::test]
    async fn test_horsepower_band_filters_to_thirty_percent() {
        let repo = repo().await;
        for hp in [6.9, 7.0, 10.0, 13.0, 13.1] {
            insert(
                &repo,
                Fixture {
                    horsepower: Some(hp),
                    ..Fixture::priced(500.0, "2024-01-01 10:00:00")
                },
            )
            .await;
        }

        let records = repo
            .search(&spec(|s| s.horsepower = Some("10".into())))
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        for record in &records {
            let hp = record.horsepower_hp.unwrap();
            assert!((7.0..=13.0).contains(&hp));
        }
    }

    #[tokio::test]
    async fn test_material_matches_either_column() {
        let repo = repo().await;
        insert(
            &repo,
            Fixture {
                material: Some("SUS304"),
                casing_material: Some("iron"),
                ..Fixture::priced(500.0, "2024-01-01 10:00:00")
            },
        )
        .await;
        insert(
            &repo,
            Fixture {
                material: Some("steel"),
                casing_material: Some("SUS304 plate"),
                ..Fixture::priced(500.0, "2024-01-02 10:00:00")
            },
        )
        .await;
        insert(
            &repo,
            Fixture {
                material: Some("steel"),
                casing_material: Some("iron"),
                ..Fixture::priced(500.0, "2024-01-03 10:00:00")
            },
        )
        .await;

        let records = repo
            .search(&spec(|s| s.material = Some("SUS304".into())))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_model_matches_specification_column() {
        let repo = repo().await;
        insert(
            &repo,
            Fixture {
                model: Some("FX-200"),
                ..Fixture::priced(500.0, "2024-01-01 10:00:00")
            },
        )
        .await;
        insert(
            &repo,
            Fixture {
                specification: Some("FX-200/B"),
                ..Fixture::priced(500.0, "2024-01-02 10:00:00")
            },
        )
        .await;
        insert(
            &repo,
            Fixture {
                model: Some("ZK-9"),
                ..Fixture::priced(500.0, "2024-01-03 10:00:00")
            },
        )
        .await;

        let records = repo
            .search(&spec(|s| s.model = Some("FX-200".into())))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_predicates_combine_with_and() {
        let repo = repo().await;
        // length matches, horsepower out of band
        insert(
            &repo,
            Fixture {
                length: Some(1000.0),
                horsepower: Some(50.0),
                ..Fixture::priced(500.0, "2024-01-01 10:00:00")
            },
        )
        .await;
        // both match
        insert(
            &repo,
            Fixture {
                length: Some(1100.0),
                horsepower: Some(11.0),
                ..Fixture::priced(500.0, "2024-01-02 10:00:00")
            },
        )
        .await;

        let records = repo
            .search(&spec(|s| {
                s.length = Some("1000".into());
                s.horsepower = Some("10".into());
            }))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].length, Some(1100.0));
    }

    #[tokio::test]
    async fn test_empty_spec_returns_ten_most_recent_priced() {
        let repo = repo().await;
        for day in 1..=12 {
            insert(
                &repo,
                Fixture {
                    unit_price: Some(100.0 * day as f64),
                    created_at: format!("2024-03-{day:02} 08:00:00"),
                    ..Fixture::default()
                },
            )
            .await;
        }
        // never eligible
        insert(&repo, Fixture::priced(0.0, "2024-03-20 08:00:00")).await;
        insert(
            &repo,
            Fixture {
                unit_price: None,
                created_at: "2024-03-21 08:00:00".to_string(),
                ..Fixture::default()
            },
        )
        .await;

        let records = repo.search(&HistoryQuerySpec::default()).await.unwrap();

        assert_eq!(records.len(), 10);
        for record in &records {
            assert!(record.unit_price > 0.0);
        }
        // most recent eligible first, descending
        let days: Vec<u32> = records
            .iter()
            .map(|r| chrono::Datelike::day(&r.created_at.unwrap()))
            .collect();
        assert_eq!(days, (3..=12).rev().collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_purchase_date_outranks_creation_time() {
        let repo = repo().await;
        // created long ago but purchased recently
        let old = insert(&repo, Fixture::priced(500.0, "2023-01-01 10:00:00")).await;
        link_purchase(&repo, old, "2024-06-01").await;
        // created recently, no purchase date resolvable
        insert(&repo, Fixture::priced(500.0, "2024-05-01 10:00:00")).await;

        let records = repo.search(&HistoryQuerySpec::default()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, old);
        assert_eq!(records[0].purchase_date, "2024-06-01".parse().ok());
        assert_eq!(records[1].purchase_date, None);
    }

    #[tokio::test]
    async fn test_unparseable_number_falls_back_to_remaining_predicates() {
        let repo = repo().await;
        insert(
            &repo,
            Fixture {
                material: Some("SUS304"),
                length: Some(5000.0),
                ..Fixture::priced(500.0, "2024-01-01 10:00:00")
            },
        )
        .await;

        let records = repo
            .search(&spec(|s| {
                s.length = Some("not-a-number".into());
                s.material = Some("SUS304".into());
            }))
            .await
            .unwrap();

        // the garbled length constraint is dropped, material still applies
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error_not_empty_results() {
        let repo = repo().await;
        sqlx::query("DROP TABLE final_processed_orders")
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = repo.search(&HistoryQuerySpec::default()).await;
        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}
