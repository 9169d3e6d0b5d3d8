use std::{
    error::Error,
    io::{self},
    path::Path,
    process::exit,
};

use clap::Parser;
use rusqlite::Connection;

use fintrack::{
    Email, PasswordHash, User, ValidatedPassword, get_user_by_email, set_password_hash,
};

/// A utility for changing the password for a registered user.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address of the user whose password should be reset.
    #[arg(long)]
    email: String,
}

/// Set a new password for a user, e.g. after they have forgotten it.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let email = match Email::new(&args.email) {
        Ok(email) => email,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    let conn = Connection::open(db_path)?;
    let user = get_user(&email, &conn);
    println!("Resetting password for {}", user.email);

    let password_hash = match get_new_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };

    set_password_hash(user.id, &password_hash, &conn)?;
    println!("Password updated successfully!");

    Ok(())
}

fn get_user(email: &Email, conn: &Connection) -> User {
    match get_user_by_email(email, conn) {
        Ok(user) => user,
        Err(error) => {
            print_error(format!("Could not get the user {email}: {error}"));
            exit(1);
        }
    }
}

fn validate_db_path(db_path: &Path) {
    if db_path.extension().is_none_or(|extension| extension.is_empty()) {
        print_error("Database path must include a file extension (e.g., 'fintrack.db').");
        exit(1);
    }

    if !db_path.is_file() {
        print_error(format!("No database at {db_path:?}"));
        exit(1);
    }
}

/// Read a password from the terminal without echoing it.
///
/// Returns `None` when input ends, e.g. on ctrl+d, or cannot be read.
fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

/// Ask for a new password until a valid one is entered twice.
fn get_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let password = prompt("Enter a new password: ")?;
        if let Err(error) = ValidatedPassword::new(&password) {
            print_error(error);
            continue;
        }

        if prompt("Enter the same password again: ")? != password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::from_raw_password(&password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(format!("Could not hash password: {error}. Try again.")),
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
