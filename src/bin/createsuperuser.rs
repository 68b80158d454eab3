use dotenvy::dotenv;
use fastflix::models::auth::ROLE_ADMIN;
use fastflix::services::password::hash_password;
use sqlx::{postgres::PgPoolOptions, Row};
use std::io::{self, Write};

const MAX_NAME_CHARS: usize = 30;
const MIN_PASSWORD_CHARS: usize = 6;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("FastFlix - Create Superuser");
    println!("==========================================");

    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set in .env file")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    print!("Username: ");
    io::stdout().flush()?;
    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = username.trim().to_string();

    if username.is_empty() || username.chars().count() > MAX_NAME_CHARS {
        eprintln!("Username must be 1 to {} characters", MAX_NAME_CHARS);
        return Ok(());
    }

    let existing_user = sqlx::query("SELECT id FROM users WHERE name = $1")
        .bind(&username)
        .fetch_optional(&pool)
        .await?;

    if existing_user.is_some() {
        eprintln!("User {} already exists", username);
        return Ok(());
    }

    print!("Password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password()?;

    if password.chars().count() < MIN_PASSWORD_CHARS {
        eprintln!("Password must be at least {} characters long", MIN_PASSWORD_CHARS);
        return Ok(());
    }

    print!("Password (again): ");
    io::stdout().flush()?;
    let password_confirm = rpassword::read_password()?;

    if password != password_confirm {
        eprintln!("Passwords don't match");
        return Ok(());
    }

    let password_hash = hash_password(&password)?;

    let result = sqlx::query(
        "INSERT INTO users (name, password_hash, role, is_active, created_at)
         VALUES ($1, $2, $3, true, NOW())
         RETURNING id, name",
    )
    .bind(&username)
    .bind(&password_hash)
    .bind(ROLE_ADMIN)
    .fetch_one(&pool)
    .await;

    match result {
        Ok(row) => {
            let id: i32 = row.get("id");
            let name: String = row.get("name");

            println!();
            println!("Superuser created successfully!");
            println!("   ID: {}", id);
            println!("   Username: {}", name);
            println!("   Role: {}", ROLE_ADMIN);
            println!();
            println!("Log in through /auth/login to use the /admin endpoints");
        }
        Err(e) => {
            eprintln!("Failed to create superuser: {}", e);
        }
    }

    pool.close().await;
    Ok(())
}
