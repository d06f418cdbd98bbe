use std::{error::Error, io::Write};

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Actor, BudgetNew, BudgetPeriod, Engine, Money, Role, categories, departments, users};
use migration::MigratorTrait;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "budgetflow_admin")]
#[command(about = "Admin utilities for Budgetflow (bootstrap departments, categories, users)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./budgetflow.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Department(Department),
    Category(Category),
    User(User),
    Budget(Budget),
}

#[derive(Args, Debug)]
struct Department {
    #[command(subcommand)]
    command: DepartmentCommand,
}

#[derive(Subcommand, Debug)]
enum DepartmentCommand {
    Create(DepartmentCreateArgs),
}

#[derive(Args, Debug)]
struct DepartmentCreateArgs {
    #[arg(long)]
    name: String,
    /// Short unique code, e.g. `ENG`.
    #[arg(long)]
    code: String,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    Deactivate(UserDeactivateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// ADMIN, MANAGER or USER.
    #[arg(long, default_value = "USER", value_parser = parse_role)]
    role: Role,
    /// Department code.
    #[arg(long)]
    department: Option<String>,
}

#[derive(Args, Debug)]
struct UserDeactivateArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Budget {
    #[command(subcommand)]
    command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    Create(BudgetCreateArgs),
}

#[derive(Args, Debug)]
struct BudgetCreateArgs {
    /// Email of the ADMIN or MANAGER creating the budget.
    #[arg(long = "as")]
    actor_email: String,
    #[arg(long)]
    name: String,
    /// Department code; taken from the actor for MANAGERs.
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    category: String,
    /// Allocation, e.g. `1000` or `1000.50`.
    #[arg(long)]
    amount: Money,
    /// MONTHLY, QUARTERLY or YEARLY.
    #[arg(long, default_value = "MONTHLY", value_parser = parse_period)]
    period: BudgetPeriod,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::try_from(raw.to_uppercase().as_str()).map_err(|err| err.to_string())
}

fn parse_period(raw: &str) -> Result<BudgetPeriod, String> {
    BudgetPeriod::try_from(raw.to_uppercase().as_str()).map_err(|err| err.to_string())
}

async fn department_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<departments::Model, Box<dyn Error + Send + Sync>> {
    departments::Entity::find()
        .filter(departments::Column::Code.eq(code.to_uppercase()))
        .one(db)
        .await?
        .ok_or_else(|| format!("department not found: {code}").into())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Department(Department {
            command: DepartmentCommand::Create(args),
        }) => {
            let id = Uuid::new_v4();
            let department = departments::ActiveModel {
                id: Set(id),
                name: Set(args.name.clone()),
                code: Set(args.code.to_uppercase()),
            };
            departments::Entity::insert(department).exec(&db).await?;
            println!("created department: {} ({id})", args.name);
        }
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => {
            let id = Uuid::new_v4();
            let category = categories::ActiveModel {
                id: Set(id),
                name: Set(args.name.clone()),
            };
            categories::Entity::insert(category).exec(&db).await?;
            println!("created category: {} ({id})", args.name);
        }
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if users::Entity::find()
                .filter(users::Column::Email.eq(args.email.as_str()))
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.email);
                std::process::exit(1);
            }

            let department_id = match args.department.as_deref() {
                Some(code) => Some(department_by_code(&db, code).await?.id),
                None => None,
            };
            if args.role == Role::Manager && department_id.is_none() {
                eprintln!("a MANAGER needs --department");
                std::process::exit(2);
            }

            let password = prompt_password_twice()?;
            let id = Uuid::new_v4();
            let user = users::ActiveModel {
                id: Set(id),
                name: Set(args.name),
                email: Set(args.email.clone()),
                password: Set(password),
                role: Set(args.role.as_str().to_string()),
                department_id: Set(department_id),
                active: Set(true),
                created_at: Set(Utc::now()),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {} ({id})", args.email);
        }
        Command::User(User {
            command: UserCommand::Deactivate(args),
        }) => {
            let result = users::Entity::update_many()
                .col_expr(users::Column::Active, sea_orm::sea_query::Expr::value(false))
                .filter(users::Column::Email.eq(args.email.as_str()))
                .exec(&db)
                .await?;
            if result.rows_affected == 0 {
                eprintln!("user not found: {}", args.email);
                std::process::exit(1);
            }
            println!("deactivated user: {}", args.email);
        }
        Command::Budget(Budget {
            command: BudgetCommand::Create(args),
        }) => {
            let Some(user) = users::Entity::find()
                .filter(users::Column::Email.eq(args.actor_email.as_str()))
                .one(&db)
                .await?
            else {
                eprintln!("user not found: {}", args.actor_email);
                std::process::exit(1);
            };
            let actor = Actor::try_from(&user)?;

            let Some(category) = categories::Entity::find()
                .filter(categories::Column::Name.eq(args.category.as_str()))
                .one(&db)
                .await?
            else {
                eprintln!("category not found: {}", args.category);
                std::process::exit(1);
            };

            let mut cmd = BudgetNew::new(
                args.name,
                category.id,
                args.amount,
                args.period,
                args.start,
                args.end,
            );
            if let Some(code) = args.department.as_deref() {
                cmd = cmd.department_id(department_by_code(&db, code).await?.id);
            }

            let engine = Engine::builder().database(db.clone()).build().await?;
            let detail = engine.create_budget(&actor, cmd).await?;
            println!(
                "created budget: {} ({}) amount {}",
                detail.budget.name, detail.budget.id, detail.budget.amount
            );
        }
    }

    Ok(())
}
