use sqlx::Row;

use milan_climate_etl::config::Config;
use milan_climate_etl::db::{self, ClimateRepository};
use milan_climate_etl::fetcher::{RawRecord, RawSeasonTable};
use milan_climate_etl::reshaper;
use milan_climate_etl::services::{EtlError, EtlService};

fn season_table(metric: &str, values: [f64; 7]) -> RawSeasonTable {
    RawSeasonTable {
        headers: (0..8).map(|i| format!("source_col_{i}")).collect(),
        rows: vec![RawRecord {
            metric: metric.to_string(),
            values: values.iter().copied().map(Some).collect(),
        }],
    }
}

#[tokio::test]
async fn test_failed_fetch_aborts_before_any_store_write() {
    let dir = tempfile::tempdir().unwrap();
    let database_path = dir.path().join("milan_climate.sqlite");

    // Nothing listens on the discard port, so extract fails immediately.
    let config = Config {
        summer_url: "http://127.0.0.1:9/summer.csv".to_string(),
        winter_url: "http://127.0.0.1:9/winter.csv".to_string(),
        database_path: database_path.clone(),
    };

    let service = EtlService::new(&config);
    let result = service.run().await;

    assert!(matches!(result, Err(EtlError::Fetch(_))));
    assert!(
        !database_path.exists(),
        "Store file must not be created when extract fails"
    );
}

#[tokio::test]
async fn test_transform_then_load_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let database_path = dir.path().join("milan_climate.sqlite");

    let summer = season_table("Temperature", [25.0, 26.0, 24.0, 25.0, 23.0, 27.0, 28.0]);
    let winter = season_table("Temperature", [5.0, 6.0, 4.0, 5.0, 3.0, 7.0, 8.0]);

    let wide = reshaper::transform(&summer, &winter).unwrap();

    let pool = db::connect(&database_path).await.unwrap();
    let repository = ClimateRepository::new(pool.clone());
    let inserted = repository.replace_climate_data(&wide).await.unwrap();
    assert_eq!(inserted, 7);

    let row = sqlx::query("SELECT * FROM climate_data WHERE \"Station\" = ?")
        .bind("Milano Centro")
        .fetch_one(&pool)
        .await
        .unwrap();
    let summer_value: Option<f64> = row.try_get("Summer_Value Temperature").unwrap();
    let winter_value: Option<f64> = row.try_get("Winter_Value Temperature").unwrap();
    assert_eq!(summer_value, Some(25.0));
    assert_eq!(winter_value, Some(5.0));
}

#[tokio::test]
async fn test_rerun_replaces_prior_run_output() {
    let dir = tempfile::tempdir().unwrap();
    let database_path = dir.path().join("milan_climate.sqlite");
    let pool = db::connect(&database_path).await.unwrap();
    let repository = ClimateRepository::new(pool.clone());

    let first = reshaper::transform(
        &season_table("Temperature", [25.0; 7]),
        &season_table("Temperature", [5.0; 7]),
    )
    .unwrap();
    repository.replace_climate_data(&first).await.unwrap();

    let second = reshaper::transform(
        &season_table("Humidity", [60.0; 7]),
        &season_table("Humidity", [80.0; 7]),
    )
    .unwrap();
    repository.replace_climate_data(&second).await.unwrap();

    let columns: Vec<String> = sqlx::query("PRAGMA table_info(climate_data)")
        .fetch_all(&pool)
        .await
        .unwrap()
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();
    assert!(columns.contains(&"Summer_Value Humidity".to_string()));
    assert!(!columns.contains(&"Summer_Value Temperature".to_string()));

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM climate_data")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(count, 7);
}
