#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Actor, BookingCmd, Client, Engine, Entry, LineItem, Material, MovementKind, NewClientCmd,
    RecordMovementCmd,
};
use migration::MigratorTrait;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn yesterday() -> NaiveDate {
    today().checked_sub_days(Days::new(1)).unwrap()
}

pub fn admin() -> Actor {
    Actor::admin("boss")
}

pub fn clerk() -> Actor {
    Actor::user("clerk")
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .today(today())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn client(engine: &Engine, name: &str, code: &str) -> Client {
    engine.new_client(NewClientCmd::new(name, code)).await.unwrap()
}

pub async fn material(engine: &Engine, name: &str) -> Material {
    engine.new_material(name, "", 100).await.unwrap()
}

/// Book `material` for a client, fully paid so no receivable is opened.
pub async fn book(engine: &Engine, client: &str, material: &str, qty: f64) {
    engine
        .add_booking(
            BookingCmd::new(client, 1_000, admin())
                .item(LineItem::new(material, qty, 100))
                .paid(1_000),
        )
        .await
        .unwrap();
}

pub async fn receive(engine: &Engine, material: &str, qty: f64, date: NaiveDate) -> Entry {
    engine
        .record_movement(RecordMovementCmd::new(
            MovementKind::In,
            material,
            qty,
            date,
            admin(),
        ))
        .await
        .unwrap()
}

pub fn dispatch(client: &str, material: &str, qty: f64) -> RecordMovementCmd {
    RecordMovementCmd::new(MovementKind::Out, material, qty, today(), clerk()).client(client)
}
