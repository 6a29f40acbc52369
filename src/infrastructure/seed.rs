use crate::api::error::AppError;
use crate::entities::animals;
use crate::services::auth_service::AuthService;
use chrono::{Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tracing::info;

pub const ANIMAL_TYPES: &[&str] = &["Собака", "Кішка", "Птах", "Гризун", "Рептилія", "Інше"];
pub const HEALTH_STATUSES: &[&str] = &["Здоровий", "Потребує лікування", "На реабілітації", "Вакцинований"];
pub const GENDERS: &[&str] = &["Чоловіча", "Жіноча", "Невідома"];

const NAMES: &[&str] = &[
    "Барсик", "Мурка", "Рекс", "Сірко", "Лайка", "Пушок", "Бім", "Жужа", "Тузик", "Ласка",
    "Грім", "Зірка", "Мася", "Рижик", "Бусинка", "Чапа", "Дружок", "Ромашка",
];

const DESCRIPTIONS: &[&str] = &[
    "Дуже ласкавий і грайливий.",
    "Спокійний, любить гуляти.",
    "Трохи сором'язливий з незнайомцями.",
    "Чудово ладнає з дітьми.",
    "Потребує уважного та терплячого господаря.",
];

/// Creates the demo accounts. Accounts that already exist are left alone.
pub async fn seed_users(
    auth: &AuthService,
    usernames: &[&str],
    password: &str,
) -> Result<usize, AppError> {
    let mut created = 0;
    for username in usernames {
        match auth.register(username, password).await {
            Ok(_) => created += 1,
            Err(AppError::DuplicateUsername(_)) => {
                info!("👤 User '{}' already exists, skipping", username);
            }
            Err(e) => return Err(e),
        }
    }
    info!("👤 Seeded {} user(s)", created);
    Ok(created)
}

/// Inserts `count` random animal records without images.
pub async fn seed_demo_animals(db: &DatabaseConnection, count: usize) -> Result<usize, AppError> {
    info!("🌱 Seeding {} demo animals...", count);

    let now = Utc::now();
    let models: Vec<animals::ActiveModel> = {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|i| {
                let first = *DESCRIPTIONS.choose(&mut rng).unwrap_or(&DESCRIPTIONS[0]);
                let second = *DESCRIPTIONS.choose(&mut rng).unwrap_or(&DESCRIPTIONS[1]);
                animals::ActiveModel {
                    name: Set(NAMES.choose(&mut rng).unwrap_or(&NAMES[0]).to_string()),
                    animal_type: Set(ANIMAL_TYPES.choose(&mut rng).unwrap_or(&ANIMAL_TYPES[0]).to_string()),
                    age: Set(rng.gen_range(1..=15)),
                    gender: Set(GENDERS.choose(&mut rng).map(|g| g.to_string())),
                    health_status: Set(HEALTH_STATUSES.choose(&mut rng).map(|h| h.to_string())),
                    description: Set(format!("{} {}", first, second)),
                    image_filename: Set(None),
                    // Spread insert times so the listing order is meaningful
                    date_added: Set(now - Duration::minutes((count - i) as i64)),
                    ..Default::default()
                }
            })
            .collect()
    };

    // SQLite caps bound parameters per statement
    for chunk in models.chunks(100) {
        animals::Entity::insert_many(chunk.to_vec()).exec(db).await?;
    }

    info!("✅ Seeded {} demo animals", count);
    Ok(count)
}
