//! Integration tests for the EcoFarm data access layer
//!
//! Tests cover:
//! - Farm registry ownership and ordering
//! - Monitoring store latest/history semantics
//! - All-or-nothing recommendation batches
//! - Support desk tables

use chrono::{Duration, TimeZone, Utc};
use ecofarm_common::db::{
    self, appointments, farms, monitoring, recommendations, tickets, FarmInput,
    NewExpertAppointment, NewHelpTicket, NewMonitoringReading, NewRecommendation,
    RecommendationStatus, RecommendationType, SoilType, TicketPriority, TicketStatus,
};
use ecofarm_common::Error;
use sqlx::SqlitePool;
use uuid::Uuid;

async fn setup_test_db() -> SqlitePool {
    db::init_memory_pool().await.expect("in-memory database")
}

fn farm_input(name: &str) -> FarmInput {
    FarmInput {
        farm_name: name.to_string(),
        location: "Nakuru".to_string(),
        area_size: Some(4.5),
        soil_type: Some(SoilType::Clay),
        crop_type: Some("wheat".to_string()),
    }
}

fn reading_at(minutes: i64, temperature: f64) -> NewMonitoringReading {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    NewMonitoringReading {
        recorded_at: Some(base + Duration::minutes(minutes)),
        temperature: Some(temperature),
        humidity: Some(60.0),
        soil_moisture: Some(45.0),
        soil_ph: Some(6.5),
        nitrogen: Some(30),
        phosphorus: Some(15),
        potassium: Some(20),
        weather_condition: Some("Clouds".to_string()),
    }
}

fn standard_batch() -> Vec<NewRecommendation> {
    vec![
        NewRecommendation::new(RecommendationType::Crop, "Plant sorghum", 0.85),
        NewRecommendation::new(RecommendationType::Fertilizer, "Apply NPK", 0.90),
        NewRecommendation::new(RecommendationType::Irrigation, "Use drip lines", 0.88),
    ]
}

// =============================================================================
// Farm registry
// =============================================================================

#[tokio::test]
async fn test_create_and_get_farm() {
    let pool = setup_test_db().await;
    let owner = Uuid::new_v4();

    let farm = farms::create_farm(&pool, owner, &farm_input("  Green Acres  "))
        .await
        .unwrap();
    assert_eq!(farm.farm_name, "Green Acres");
    assert_eq!(farm.user_id, owner);

    let loaded = farms::get_farm_for_user(&pool, farm.id, owner).await.unwrap();
    assert_eq!(loaded.id, farm.id);
    assert_eq!(loaded.soil_type, Some(SoilType::Clay));
    assert_eq!(loaded.area_size, Some(4.5));
}

#[tokio::test]
async fn test_farm_invisible_to_other_users() {
    let pool = setup_test_db().await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let farm = farms::create_farm(&pool, owner, &farm_input("Hilltop")).await.unwrap();

    let result = farms::get_farm_for_user(&pool, farm.id, stranger).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let result = farms::update_farm(&pool, farm.id, stranger, &farm_input("Stolen")).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    assert!(farms::list_farms_for_user(&pool, stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_farms_newest_first() {
    let pool = setup_test_db().await;
    let owner = Uuid::new_v4();

    farms::create_farm(&pool, owner, &farm_input("First")).await.unwrap();
    farms::create_farm(&pool, owner, &farm_input("Second")).await.unwrap();
    farms::create_farm(&pool, owner, &farm_input("Third")).await.unwrap();

    let names: Vec<String> = farms::list_farms_for_user(&pool, owner)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.farm_name)
        .collect();
    assert_eq!(names, vec!["Third", "Second", "First"]);
    assert_eq!(farms::count_farms_for_user(&pool, owner).await.unwrap(), 3);
}

#[tokio::test]
async fn test_update_farm() {
    let pool = setup_test_db().await;
    let owner = Uuid::new_v4();
    let farm = farms::create_farm(&pool, owner, &farm_input("Old Name")).await.unwrap();

    let mut input = farm_input("New Name");
    input.soil_type = Some(SoilType::Peaty);
    input.area_size = None;

    let updated = farms::update_farm(&pool, farm.id, owner, &input).await.unwrap();
    assert_eq!(updated.farm_name, "New Name");
    assert_eq!(updated.soil_type, Some(SoilType::Peaty));
    assert_eq!(updated.area_size, None);
    assert!(updated.updated_at >= farm.updated_at);
    assert_eq!(updated.created_at, farm.created_at);
}

#[tokio::test]
async fn test_create_farm_rejects_invalid_area() {
    let pool = setup_test_db().await;
    let mut input = farm_input("Bad");
    input.area_size = Some(-3.0);

    let result = farms::create_farm(&pool, Uuid::new_v4(), &input).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

// =============================================================================
// Monitoring store
// =============================================================================

#[tokio::test]
async fn test_latest_reading_round_trip() {
    let pool = setup_test_db().await;
    let farm = farms::create_farm(&pool, Uuid::new_v4(), &farm_input("Sensors"))
        .await
        .unwrap();

    assert!(monitoring::latest_reading(&pool, farm.id).await.unwrap().is_none());

    let first = monitoring::insert_reading(&pool, farm.id, &reading_at(0, 20.0))
        .await
        .unwrap();
    let latest = monitoring::latest_reading(&pool, farm.id).await.unwrap().unwrap();
    assert_eq!(latest, first);

    let second = monitoring::insert_reading(&pool, farm.id, &reading_at(30, 24.0))
        .await
        .unwrap();
    let latest = monitoring::latest_reading(&pool, farm.id).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.temperature, Some(24.0));
}

#[tokio::test]
async fn test_latest_reading_ignores_insertion_order() {
    let pool = setup_test_db().await;
    let farm = farms::create_farm(&pool, Uuid::new_v4(), &farm_input("Backfill"))
        .await
        .unwrap();

    let newer = monitoring::insert_reading(&pool, farm.id, &reading_at(60, 26.0))
        .await
        .unwrap();
    monitoring::insert_reading(&pool, farm.id, &reading_at(0, 18.0))
        .await
        .unwrap();

    let latest = monitoring::latest_reading(&pool, farm.id).await.unwrap().unwrap();
    assert_eq!(latest.id, newer.id);
}

#[tokio::test]
async fn test_reading_history_returns_most_recent_ascending() {
    let pool = setup_test_db().await;
    let farm = farms::create_farm(&pool, Uuid::new_v4(), &farm_input("History"))
        .await
        .unwrap();

    for i in 0..5 {
        monitoring::insert_reading(&pool, farm.id, &reading_at(i * 10, 15.0 + i as f64))
            .await
            .unwrap();
    }

    let history = monitoring::reading_history(&pool, farm.id, 3).await.unwrap();
    let temps: Vec<f64> = history.iter().filter_map(|r| r.temperature).collect();
    assert_eq!(temps, vec![17.0, 18.0, 19.0]);
}

#[tokio::test]
async fn test_reading_for_unknown_farm_rejected() {
    let pool = setup_test_db().await;

    let result = monitoring::insert_reading(&pool, Uuid::new_v4(), &reading_at(0, 20.0)).await;
    assert!(matches!(result, Err(Error::Database(_))));
}

// =============================================================================
// Recommendations
// =============================================================================

#[tokio::test]
async fn test_insert_batch_stamps_farm_author_and_status() {
    let pool = setup_test_db().await;
    let owner = Uuid::new_v4();
    let farm = farms::create_farm(&pool, owner, &farm_input("Advice")).await.unwrap();

    let stored = recommendations::insert_batch(&pool, farm.id, owner, &standard_batch())
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);

    let listed = recommendations::list_for_farm(&pool, farm.id).await.unwrap();
    assert_eq!(listed.len(), 3);
    for rec in &listed {
        assert_eq!(rec.farm_id, farm.id);
        assert_eq!(rec.created_by, Some(owner));
        assert_eq!(rec.status, RecommendationStatus::Pending);
    }
    let types: Vec<RecommendationType> = listed.iter().map(|r| r.recommendation_type).collect();
    assert_eq!(
        types,
        vec![
            RecommendationType::Crop,
            RecommendationType::Fertilizer,
            RecommendationType::Irrigation
        ]
    );

    assert_eq!(recommendations::count_for_user(&pool, owner).await.unwrap(), 3);
    assert_eq!(
        recommendations::count_for_user(&pool, Uuid::new_v4()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_failed_batch_leaves_no_rows() {
    let pool = setup_test_db().await;
    let owner = Uuid::new_v4();
    let farm = farms::create_farm(&pool, owner, &farm_input("Atomic")).await.unwrap();

    // Third insert of the batch aborts after two rows were written
    sqlx::query(
        "CREATE TRIGGER fail_irrigation BEFORE INSERT ON recommendations \
         WHEN NEW.recommendation_type = 'irrigation' \
         BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = recommendations::insert_batch(&pool, farm.id, owner, &standard_batch()).await;
    assert!(matches!(result, Err(Error::Database(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recommendations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "no partial batch may be visible");
}

#[tokio::test]
async fn test_batch_for_unknown_farm_rejected() {
    let pool = setup_test_db().await;

    let result =
        recommendations::insert_batch(&pool, Uuid::new_v4(), Uuid::new_v4(), &standard_batch())
            .await;
    assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn test_batch_size_limit() {
    let pool = setup_test_db().await;
    let owner = Uuid::new_v4();
    let farm = farms::create_farm(&pool, owner, &farm_input("Too Many")).await.unwrap();

    let mut batch = standard_batch();
    batch.push(NewRecommendation::new(RecommendationType::PestControl, "Scout weekly", 0.7));
    batch.push(NewRecommendation::new(RecommendationType::Crop, "Extra", 0.5));

    let result = recommendations::insert_batch(&pool, farm.id, owner, &batch).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

// =============================================================================
// Support desk
// =============================================================================

#[tokio::test]
async fn test_tickets_default_priority_and_status() {
    let pool = setup_test_db().await;
    let user = Uuid::new_v4();

    let input: NewHelpTicket =
        serde_json::from_str(r#"{"subject": "Sensor offline", "message": "No data since Monday"}"#)
            .unwrap();
    let ticket = tickets::create_ticket(&pool, user, &input).await.unwrap();
    assert_eq!(ticket.priority, TicketPriority::Medium);
    assert_eq!(ticket.status, TicketStatus::Open);

    let listed = tickets::list_tickets_for_user(&pool, user).await.unwrap();
    assert_eq!(listed, vec![ticket]);
}

#[tokio::test]
async fn test_ticket_requires_subject() {
    let pool = setup_test_db().await;
    let input = NewHelpTicket {
        subject: " ".to_string(),
        message: "body".to_string(),
        priority: TicketPriority::High,
    };
    let result = tickets::create_ticket(&pool, Uuid::new_v4(), &input).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_appointment_farm_must_belong_to_farmer() {
    let pool = setup_test_db().await;
    let farmer = Uuid::new_v4();
    let other = Uuid::new_v4();
    let farm = farms::create_farm(&pool, farmer, &farm_input("Consult")).await.unwrap();

    let input = NewExpertAppointment {
        farm_id: Some(farm.id),
        expert_id: Some("agronomist-7".to_string()),
        appointment_date: Utc.with_ymd_and_hms(2025, 7, 14, 9, 30, 0).unwrap(),
        notes: Some("Leaf rust on east plot".to_string()),
    };

    let booked = appointments::create_appointment(&pool, farmer, &input).await.unwrap();
    assert_eq!(booked.farm_id, Some(farm.id));

    let result = appointments::create_appointment(&pool, other, &input).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let listed = appointments::list_appointments_for_farmer(&pool, farmer).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].appointment_date, input.appointment_date);
}
