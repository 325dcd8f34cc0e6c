//! Agentdeck - a terminal client for the Agent Platform marketplace.
//!
//! Provides a keyboard-driven interface for signing in, browsing and
//! running agents, and watching the marketplace and leaderboards.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agentdeck::api::ApiClient;
use agentdeck::auth::{
    AuthFlow, AuthForm, KeyringTokenStore, SignInOutcome, Submission, TwoFactorError,
};
use agentdeck::config::Config;
use agentdeck::models::LeaderboardCategory;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() {
    eprintln!(
        "usage: agentdeck <command>\n\
         \n\
         commands:\n\
         \x20 login [email]          sign in (prompts for password)\n\
         \x20 register               create an account\n\
         \x20 logout                 sign out and clear the stored token\n\
         \x20 whoami                 show the current identity\n\
         \x20 reset-password <email> request a password reset email\n\
         \x20 2fa                    enroll in two-factor authentication\n\
         \x20 agents                 list agents\n\
         \x20 run <agent-id> <msg>   send a message to an agent\n\
         \x20 market                 list marketplace listings\n\
         \x20 buy <listing-id>       purchase a listing\n\
         \x20 rent <listing-id>      rent a listing\n\
         \x20 leaderboard [category] show rankings (earnings|tasks|rating)\n\
         \x20 stats                  show your usage statistics\n\
         \x20 health                 check backend availability"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    let mut config = Config::load().context("Failed to load configuration")?;
    let client = ApiClient::new(config.resolve_api_url())?;
    let mut flow = AuthFlow::new(client, Box::new(KeyringTokenStore));

    match command {
        Some("login") => cmd_login(&mut flow, &mut config, args.get(2).cloned()).await,
        Some("register") => cmd_register(&mut flow, &mut config).await,
        Some("logout") => cmd_logout(&mut flow).await,
        Some("whoami") => cmd_whoami(&mut flow).await,
        Some("reset-password") => {
            let email = args.get(2).context("usage: agentdeck reset-password <email>")?;
            let message = flow.reset_password(email).await?;
            println!("{}", message);
            Ok(())
        }
        Some("2fa") => cmd_enroll_2fa(&mut flow).await,
        Some("agents") => cmd_agents(&mut flow).await,
        Some("run") => {
            let agent_id = args.get(2).context("usage: agentdeck run <agent-id> <message>")?;
            let message = args.get(3).context("usage: agentdeck run <agent-id> <message>")?;
            cmd_run_agent(&mut flow, agent_id, message).await
        }
        Some("market") => cmd_market(&mut flow).await,
        Some("buy") => {
            let listing_id = args.get(2).context("usage: agentdeck buy <listing-id>")?;
            cmd_order(&mut flow, listing_id, true).await
        }
        Some("rent") => {
            let listing_id = args.get(2).context("usage: agentdeck rent <listing-id>")?;
            cmd_order(&mut flow, listing_id, false).await
        }
        Some("leaderboard") => {
            let category = args
                .get(2)
                .map(|s| {
                    LeaderboardCategory::parse(s)
                        .with_context(|| format!("unknown category: {}", s))
                })
                .transpose()?
                .unwrap_or(LeaderboardCategory::Earnings);
            cmd_leaderboard(&mut flow, category).await
        }
        Some("stats") => cmd_stats(&mut flow).await,
        Some("health") => {
            flow.client().health_check().await?;
            println!("backend is up");
            Ok(())
        }
        _ => {
            usage();
            Ok(())
        }
    }
}

// ============================================================================
// Prompt helpers
// ============================================================================

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

fn confirm(label: &str) -> Result<bool> {
    Ok(matches!(prompt(&format!("{} [y/N]", label))?.as_str(), "y" | "Y" | "yes"))
}

// ============================================================================
// Auth commands
// ============================================================================

async fn cmd_login(flow: &mut AuthFlow, config: &mut Config, email: Option<String>) -> Result<()> {
    let mut form = AuthForm::new();
    form.email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => {
            println!("Signing in as {}", email);
            email
        }
        None => prompt("Email")?,
    };
    form.password = prompt_password("Password")?;

    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(message) => {
            eprintln!("{}", message);
            return Ok(());
        }
    };

    let Submission::Login { email, password } = submission else {
        unreachable!("login form validated in login mode");
    };

    if !form.begin_submit() {
        return Ok(());
    }
    let outcome = flow.sign_in(&email, &password).await;
    form.finish_submit();

    match outcome {
        Ok(SignInOutcome::Authenticated(user)) => {
            config.last_email = Some(email);
            config.save()?;
            println!("Signed in as {}", user.display_name());
        }
        Ok(SignInOutcome::TwoFactorRequired(user)) => {
            println!(
                "Account {} requires a two-factor code.",
                user.display_name()
            );
            complete_two_factor(flow).await?;
            config.last_email = Some(email);
            config.save()?;
        }
        Err(e) => {
            form.set_error(e.to_string());
            eprintln!("Sign-in failed: {}", e);
        }
    }
    Ok(())
}

/// Prompt for TOTP codes until the pending sign-in completes or the
/// user gives up with an empty entry.
async fn complete_two_factor(flow: &mut AuthFlow) -> Result<()> {
    loop {
        let code = prompt("Two-factor code (blank to cancel)")?;
        if code.is_empty() {
            flow.cancel_pending();
            println!("Sign-in cancelled.");
            return Ok(());
        }

        match flow.complete_two_factor_sign_in(&code).await {
            Ok(user) => {
                println!("Signed in as {}", user.display_name());
                return Ok(());
            }
            Err(e) => eprintln!("Code rejected: {}", e),
        }
    }
}

async fn cmd_register(flow: &mut AuthFlow, config: &mut Config) -> Result<()> {
    let mut form = AuthForm::new();
    form.toggle_mode();
    form.username = prompt("Username")?;
    form.email = prompt("Email")?;
    form.password = prompt_password("Password")?;
    form.confirm_password = prompt_password("Confirm password")?;

    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(message) => {
            eprintln!("{}", message);
            return Ok(());
        }
    };

    let Submission::Register {
        username,
        email,
        password,
    } = submission
    else {
        unreachable!("register form validated in register mode");
    };

    if !form.begin_submit() {
        return Ok(());
    }
    let result = flow.sign_up(&username, &email, &password).await;
    form.finish_submit();

    let user = match result {
        Ok(user) => user,
        Err(e) => {
            eprintln!("Registration failed: {}", e);
            return Ok(());
        }
    };
    println!("Registered {}.", user.display_name());

    // Registration does not authenticate; offer the follow-up steps
    if !confirm("Sign in now?")? {
        return Ok(());
    }
    let password = prompt_password("Password")?;
    match flow.sign_in(&email, &password).await? {
        SignInOutcome::Authenticated(user) => {
            config.last_email = Some(email);
            config.save()?;
            println!("Signed in as {}", user.display_name());
        }
        SignInOutcome::TwoFactorRequired(_) => complete_two_factor(flow).await?,
    }

    if flow.is_authenticated() && confirm("Set up two-factor authentication?")? {
        enroll_two_factor(flow).await?;
    }
    Ok(())
}

async fn cmd_logout(flow: &mut AuthFlow) -> Result<()> {
    flow.bootstrap().await?;
    // Local state is cleared even when the server call below fails
    if let Err(e) = flow.sign_out().await {
        eprintln!("Signed out locally; server logout failed: {}", e);
    } else {
        println!("Signed out.");
    }
    Ok(())
}

async fn cmd_whoami(flow: &mut AuthFlow) -> Result<()> {
    flow.bootstrap().await?;
    match flow.identity() {
        Some(user) => {
            println!("{}", user.display_name());
            if let Some(email) = &user.email {
                println!("  email: {}", email);
            }
            println!("  2fa:   {}", if user.totp_enabled { "enabled" } else { "disabled" });
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

async fn cmd_enroll_2fa(flow: &mut AuthFlow) -> Result<()> {
    flow.bootstrap().await?;
    let Some(user) = flow.identity().cloned() else {
        eprintln!("Sign in before enrolling in two-factor authentication.");
        return Ok(());
    };
    if user.totp_enabled {
        println!("Two-factor authentication is already enabled.");
        return Ok(());
    }
    enroll_two_factor(flow).await
}

async fn enroll_two_factor(flow: &mut AuthFlow) -> Result<()> {
    let secret = flow.get_2fa_secret().await?;
    let account = flow
        .identity()
        .map(|u| u.display_name().to_string())
        .unwrap_or_default();

    println!("Add this secret to your authenticator app:");
    println!("  {}", secret);
    println!("  {}", AuthFlow::provisioning_uri(&secret, &account));

    loop {
        let code = prompt("Code from your app (blank to cancel)")?;
        if code.is_empty() {
            flow.cancel_pending();
            println!("Enrollment cancelled.");
            return Ok(());
        }

        match flow.enable_2fa(&code).await {
            Ok(()) => {
                info!("2FA enrollment complete");
                println!("Two-factor authentication enabled.");
                return Ok(());
            }
            Err(TwoFactorError::InvalidCode(message)) => {
                eprintln!("{} - try the next code", message);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// ============================================================================
// Resource commands
// ============================================================================

async fn cmd_agents(flow: &mut AuthFlow) -> Result<()> {
    flow.bootstrap().await?;
    let agents = flow.client().list_agents().await?;
    if agents.is_empty() {
        println!("No agents.");
        return Ok(());
    }
    for agent in agents {
        println!(
            "{:<24} {:<32} rating {:.1}  {}",
            agent.id,
            agent.name,
            agent.rating,
            agent.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn cmd_run_agent(flow: &mut AuthFlow, agent_id: &str, message: &str) -> Result<()> {
    flow.bootstrap().await?;
    let result = flow.client().run_agent(agent_id, message).await?;
    println!("{}", result.message.as_deref().unwrap_or("(no reply)"));
    Ok(())
}

async fn cmd_market(flow: &mut AuthFlow) -> Result<()> {
    flow.bootstrap().await?;
    let listings = flow.client().list_listings().await?;
    if listings.is_empty() {
        println!("No listings.");
        return Ok(());
    }
    for listing in listings {
        println!(
            "{:<24} {:<32} {:?} ${:.2}",
            listing.id,
            listing.agent_name.as_deref().unwrap_or(&listing.agent_id),
            listing.listing_type,
            listing.price
        );
    }
    Ok(())
}

async fn cmd_order(flow: &mut AuthFlow, listing_id: &str, purchase: bool) -> Result<()> {
    flow.bootstrap().await?;
    if !flow.is_authenticated() {
        eprintln!("Sign in first.");
        return Ok(());
    }
    let receipt = if purchase {
        flow.client().purchase_agent(listing_id).await?
    } else {
        flow.client().rent_agent(listing_id).await?
    };
    println!(
        "Order {} ({})",
        receipt.id.as_deref().unwrap_or("submitted"),
        receipt.status.as_deref().unwrap_or("ok")
    );
    Ok(())
}

async fn cmd_leaderboard(flow: &mut AuthFlow, category: LeaderboardCategory) -> Result<()> {
    flow.bootstrap().await?;
    let entries = flow.client().fetch_leaderboard(category).await?;
    for (i, entry) in entries.iter().enumerate() {
        let rank = entry.rank.unwrap_or(i as i64 + 1);
        println!("{:>3}. {:<24} {:.1}", rank, entry.display_name(), entry.score);
    }
    Ok(())
}

async fn cmd_stats(flow: &mut AuthFlow) -> Result<()> {
    flow.bootstrap().await?;
    if !flow.is_authenticated() {
        eprintln!("Sign in first.");
        return Ok(());
    }
    let stats = flow.client().fetch_user_stats().await?;
    println!("earnings:     ${:.2}", stats.total_earnings);
    println!("tasks done:   {}", stats.tasks_completed);
    println!("avg rating:   {:.1}", stats.average_rating);
    println!("achievements: {}", stats.achievements_earned);
    Ok(())
}
