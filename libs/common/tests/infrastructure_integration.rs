//! Integration tests for the infrastructure components
//!
//! These tests need a PostgreSQL database (`DATABASE_URL`) and a Redis
//! instance (`REDIS_URL`); run them with `cargo test -- --ignored`.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    error::DatabaseError,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn migrated_pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    assert!(health_check(&pool).await?, "Database health check failed");
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn count(pool: &PgPool, table: &str, clinic_id: Uuid) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE clinic_id = $1", table))
        .bind(clinic_id)
        .fetch_one(pool)
        .await
        .expect("count query failed")
}

/// Deleting a clinic removes every row that references it
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_clinic_delete_cascades_through_schema() -> Result<(), Box<dyn std::error::Error>> {
    let pool = migrated_pool().await?;

    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id) VALUES ($1)")
        .bind(user_id)
        .execute(&pool)
        .await?;

    let clinic_id: Uuid =
        sqlx::query_scalar("INSERT INTO clinics (name) VALUES ('Cascade') RETURNING id")
            .fetch_one(&pool)
            .await?;

    sqlx::query("INSERT INTO user_clinic_memberships (user_id, clinic_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(clinic_id)
        .execute(&pool)
        .await?;

    let doctor_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO doctors (clinic_id, name, available_from_weekday, available_to_weekday,
                             available_from_time, available_to_time, license_id, specialty,
                             price_in_cents)
        VALUES ($1, 'Dr. Cascade', 1, 5, '08:00', '17:00', 'CRM-1', 'Cardiology', 15000)
        RETURNING id
        "#,
    )
    .bind(clinic_id)
    .fetch_one(&pool)
    .await?;

    let patient_email = format!("{}@cascade.test", Uuid::new_v4());
    let patient_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO patients (clinic_id, name, email, phone, sex)
        VALUES ($1, 'Patient', $2, '+55 11 99999-0000', 'other')
        RETURNING id
        "#,
    )
    .bind(clinic_id)
    .bind(&patient_email)
    .fetch_one(&pool)
    .await?;

    sqlx::query(
        "INSERT INTO appointments (date, clinic_id, patient_id, doctor_id) VALUES (NOW(), $1, $2, $3)",
    )
    .bind(clinic_id)
    .bind(patient_id)
    .bind(doctor_id)
    .execute(&pool)
    .await?;

    sqlx::query("DELETE FROM clinics WHERE id = $1")
        .bind(clinic_id)
        .execute(&pool)
        .await?;

    for table in [
        "user_clinic_memberships",
        "doctors",
        "patients",
        "appointments",
    ] {
        assert_eq!(count(&pool, table, clinic_id).await, 0, "{} survived", table);
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await?;

    Ok(())
}

/// Patient emails are unique across every clinic
#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_patient_email_unique_across_clinics() -> Result<(), Box<dyn std::error::Error>> {
    let pool = migrated_pool().await?;
    let email = format!("{}@unique.test", Uuid::new_v4());

    let mut clinic_ids = Vec::new();
    for name in ["North", "South"] {
        let id: Uuid = sqlx::query_scalar("INSERT INTO clinics (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&pool)
            .await?;
        clinic_ids.push(id);
    }

    let insert = "INSERT INTO patients (clinic_id, name, email, phone, sex) VALUES ($1, 'P', $2, '1', 'female')";
    sqlx::query(insert)
        .bind(clinic_ids[0])
        .bind(&email)
        .execute(&pool)
        .await?;

    let err = sqlx::query(insert)
        .bind(clinic_ids[1])
        .bind(&email)
        .execute(&pool)
        .await
        .expect_err("duplicate email accepted");

    assert!(matches!(
        DatabaseError::from_query(err),
        DatabaseError::UniqueViolation { .. }
    ));

    sqlx::query("DELETE FROM clinics WHERE id = ANY($1)")
        .bind(&clinic_ids)
        .execute(&pool)
        .await?;

    Ok(())
}

/// Redis is reachable and round-trips JSON values
#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_redis_json_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    assert!(redis_pool.health_check().await?, "Redis health check failed");

    let key = "integration_test_key";
    redis_pool.set_json(key, &["North", "South"], Some(10)).await?;

    let cached: Option<Vec<String>> = redis_pool.get_json(key).await?;
    assert_eq!(cached, Some(vec!["North".to_string(), "South".to_string()]));

    redis_pool.delete_many(&[key.to_string()]).await?;
    let cached: Option<Vec<String>> = redis_pool.get_json(key).await?;
    assert_eq!(cached, None);

    Ok(())
}
