//! User CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::session::Session;
use crate::domain::{Role, User};
use crate::service::CatalogService;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a user (the first user becomes an administrator)
    Register {
        /// E-mail address
        email: String,

        /// Display name
        #[arg(long)]
        nickname: Option<String>,
    },

    /// List registered users (admin)
    List,

    /// Change a user's e-mail address or nickname (admin)
    Edit {
        /// User ID or e-mail
        user: String,

        /// New e-mail address
        #[arg(long)]
        email: Option<String>,

        /// New display name
        #[arg(long, conflicts_with = "clear_nickname")]
        nickname: Option<String>,

        /// Remove the display name
        #[arg(long)]
        clear_nickname: bool,
    },

    /// Give a user the admin role (admin)
    GrantAdmin {
        /// User ID or e-mail
        user: String,
    },

    /// Take the admin role away from a user (admin)
    RevokeAdmin {
        /// User ID or e-mail
        user: String,
    },

    /// Show who commands run as
    Whoami,
}

pub fn run(cmd: UserCommands, output: &Output, as_user: Option<&str>) -> Result<()> {
    match cmd {
        // Registration must work before the configured identity exists
        UserCommands::Register { email, nickname } => register(output, &email, nickname),
        UserCommands::List => list(&Session::open(as_user)?, output),
        UserCommands::Edit {
            user,
            email,
            nickname,
            clear_nickname,
        } => {
            let nickname = if clear_nickname {
                Some(None)
            } else {
                nickname.map(Some)
            };
            if email.is_none() && nickname.is_none() {
                anyhow::bail!("Nothing to change; pass --email, --nickname or --clear-nickname");
            }

            let session = Session::open(as_user)?;
            let user = session
                .catalog
                .edit_user(&session.actor, &user, email.as_deref(), nickname)?;
            if output.is_json() {
                output.data(&user_json(&user));
            } else {
                output.success(&format!("Updated user: {} - {}", user.id, user.email));
            }
            Ok(())
        }
        UserCommands::GrantAdmin { user } => {
            let session = Session::open(as_user)?;
            let user = session.catalog.grant_admin(&session.actor, &user)?;
            if output.is_json() {
                output.data(&user_json(&user));
            } else {
                output.success(&format!("{} is now an administrator", user.email));
            }
            Ok(())
        }
        UserCommands::RevokeAdmin { user } => {
            let session = Session::open(as_user)?;
            let user = session.catalog.revoke_admin(&session.actor, &user)?;
            if output.is_json() {
                output.data(&user_json(&user));
            } else {
                output.success(&format!("{} is no longer an administrator", user.email));
            }
            Ok(())
        }
        UserCommands::Whoami => whoami(&Session::open(as_user)?, output),
    }
}

fn list(session: &Session, output: &Output) -> Result<()> {
    let users = session.catalog.list_users(&session.actor)?;
    if output.is_json() {
        let items: Vec<_> = users.iter().map(user_json).collect();
        output.data(&items);
        return Ok(());
    }

    println!("{:<12} {:<8} {:<32} NAME", "ID", "ROLE", "EMAIL");
    println!("{}", "-".repeat(70));
    for user in &users {
        let role = if user.is_admin() { Role::Admin } else { Role::User };
        println!(
            "{:<12} {:<8} {:<32} {}",
            user.id,
            role.to_string(),
            user.email,
            user.nickname.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn whoami(session: &Session, output: &Output) -> Result<()> {
    let user = match session.actor.user_id() {
        Some(id) => Some(session.catalog.find_user(&id.to_string())?),
        None => None,
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "authenticated": session.actor.is_authenticated(),
            "user": user.as_ref().map(user_json),
            "roles": session.actor.roles(),
        }));
        return Ok(());
    }

    match user {
        Some(user) => {
            let admin = if user.is_admin() { ", admin" } else { "" };
            println!("{} <{}>{}", user.display_name(), user.email, admin);
        }
        None => println!("anonymous (pass --as or set LEND_USER to act as a user)"),
    }
    Ok(())
}

fn register(output: &Output, email: &str, nickname: Option<String>) -> Result<()> {
    let project = Project::open_current()?;
    let user = CatalogService::for_project(&project).register_user(email, nickname)?;

    if output.is_json() {
        output.data(&user_json(&user));
    } else {
        let admin = if user.is_admin() { " (admin)" } else { "" };
        output.success(&format!("Registered user: {} - {}{}", user.id, user.email, admin));
    }

    Ok(())
}

fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "email": user.email,
        "nickname": user.nickname,
        "admin": user.is_admin(),
        "created_at": user.created_at.to_rfc3339(),
    })
}
