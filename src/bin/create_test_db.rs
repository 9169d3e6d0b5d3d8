use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use fintrack::{
    AccountType, CategoryKind, Email, NewAccount, NewTransaction, NewUser, PasswordHash, Role,
    TransactionStatus, TransactionType, ValidatedPassword, create_account,
    create_default_categories, create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the fintrack server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'fintrack.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user test@example.com with the password 'test1234'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test1234"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: Email::new_unchecked("test@example.com"),
            password_hash: Some(password_hash),
            role: Role::Admin,
            whatsapp: None,
        },
        &conn,
    )?;

    println!("Creating accounts...");

    let personal = create_account(
        NewAccount {
            user_id: user.id,
            name: "Personal".to_owned(),
            account_type: AccountType::Personal,
        },
        &conn,
    )?;
    let business = create_account(
        NewAccount {
            user_id: user.id,
            name: "Business".to_owned(),
            account_type: AccountType::Business,
        },
        &conn,
    )?;

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().date();

    for account in [&personal, &business] {
        let categories = create_default_categories(account.id, &conn)?;
        let income_category = categories
            .iter()
            .find(|category| category.kind == CategoryKind::Income);
        let expense_categories: Vec<_> = categories
            .iter()
            .filter(|category| category.kind == CategoryKind::Expense)
            .collect();

        for month in 0..3 {
            let payday = today - Duration::days(30 * month);

            create_transaction(
                NewTransaction {
                    user_id: user.id,
                    account_id: account.id,
                    category_id: income_category.map(|category| category.id),
                    credit_card_id: None,
                    description: "Salary".to_owned(),
                    amount: 500_000,
                    transaction_type: TransactionType::Income,
                    transaction_date: payday,
                    payment_method: Some("Bank transfer".to_owned()),
                    status: TransactionStatus::Paid,
                    expense_type: None,
                    is_recurring: true,
                },
                &conn,
            )?;

            for (i, category) in expense_categories.iter().enumerate() {
                let offset = i as i64 + 1;

                create_transaction(
                    NewTransaction {
                        user_id: user.id,
                        account_id: account.id,
                        category_id: Some(category.id),
                        credit_card_id: None,
                        description: format!("{} expense", category.name),
                        amount: 2_500 * offset,
                        transaction_type: TransactionType::Expense,
                        transaction_date: payday - Duration::days(offset),
                        payment_method: None,
                        status: TransactionStatus::Paid,
                        expense_type: None,
                        is_recurring: false,
                    },
                    &conn,
                )?;
            }
        }
    }

    println!("Success!");

    Ok(())
}
