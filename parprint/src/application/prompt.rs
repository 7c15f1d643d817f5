use std::io::{self, BufRead, Write};

use parprint_core::Credentials;
use parprint_core::error::{ParprintError, Result};

/// Ask for whatever part of the login was not given on the command line.
/// Prompts go to stderr so stdout only carries remote output.
pub fn credentials(user: Option<String>) -> Result<Credentials> {
    let username = match user {
        Some(u) => u,
        None => {
            eprint!("stu username: ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };
    if username.is_empty() {
        return Err(ParprintError::Config("username must not be empty".into()));
    }
    let secret = rpassword::prompt_password("stu password: ")?;
    Ok(Credentials::new(username, secret))
}
