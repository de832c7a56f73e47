use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use skillswap_auth::PasswordService;
use skillswap_common::{env_or, DatabaseConfig};
use skillswap_database::{create_pool, MigrationRunner};

#[derive(Parser)]
#[command(name = "db-cli")]
#[command(about = "SkillSwap database CLI tool")]
struct Cli {
    /// Database name override
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Check migration status
    Status,
    /// Create the first administrator, or promote an existing account
    Seed {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Administrator")]
        name: String,
    },
    /// Reset database (drop and recreate)
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = DatabaseConfig::from_env();
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Commands::Migrate => {
            let runner = MigrationRunner::new(create_pool(&config).await?);
            runner.run_all_migrations().await?;
            println!("✅ Migrations completed successfully");
        }
        Commands::Status => {
            let runner = MigrationRunner::new(create_pool(&config).await?);
            let status = runner.check_migration_status().await?;
            println!("📊 {}", status);

            if status.is_up_to_date {
                println!("✅ Database is up to date");
            } else {
                println!("⚠️  Database needs migration");
            }
        }
        Commands::Seed { email, password, name } => {
            let email = email.trim().to_lowercase();
            let name = name.trim();
            if !email.contains('@') {
                bail!("Not an email address: {}", email);
            }
            if name.is_empty() {
                bail!("Name must not be empty");
            }
            PasswordService::validate_password_strength(&password)?;

            let passwords = PasswordService::new(env_or("BCRYPT_COST", 12));
            let hash = passwords.hash_password(&password)?;

            let runner = MigrationRunner::new(create_pool(&config).await?);
            runner.run_all_migrations().await?;
            let id = runner.seed_admin(&email, &hash, name).await?;
            println!("✅ Administrator {} ready ({})", email, id);
        }
        Commands::Reset { force } => {
            if !force {
                println!("⚠️  This will delete ALL data in database {}!", config.database);
                println!("Type 'yes' to continue:");

                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;

                if input.trim() != "yes" {
                    println!("❌ Operation cancelled");
                    return Ok(());
                }
            }

            reset_database(&config).await?;

            let runner = MigrationRunner::new(create_pool(&config).await?);
            runner.run_all_migrations().await?;
            println!("✅ Database reset completed");
        }
    }

    Ok(())
}

async fn reset_database(config: &DatabaseConfig) -> anyhow::Result<()> {
    let maintenance = DatabaseConfig {
        database: "postgres".to_string(),
        ..config.clone()
    };
    let admin_pool = create_pool(&maintenance)
        .await
        .context("connecting to the maintenance database")?;

    sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(&config.database)
    .execute(&admin_pool)
    .await?;

    let name = config.database.replace('"', "\"\"");
    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{}\"", name))
        .execute(&admin_pool)
        .await?;
    sqlx::query(&format!("CREATE DATABASE \"{}\"", name))
        .execute(&admin_pool)
        .await?;

    tracing::info!(database = %config.database, "Database recreated");
    Ok(())
}
