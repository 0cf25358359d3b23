use skillport_client::{
    Client, ClientConfig, Env, GuardDecision, Identity, Role, RoutePolicy,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// A small console consumer of the client core, standing in for the view
/// layer: it initializes configuration and logging, runs cold-start
/// session resolution, and walks a few navigations through the route
/// guard so the whole identity surface is exercised end to end.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = ClientConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "skillport_client=debug".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty print for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for centralized log ingestion.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Client starting in {:?} mode", config.env);
    tracing::info!(provider = ?config.provider, api_base = %config.api_base, "backend selected");

    // 4. Core Assembly & Cold-Start Resolution
    let client = Client::from_config(config).await;
    let identity = client.identity();

    match identity.snapshot().identity {
        Identity::Anonymous => tracing::info!("no session restored, visitor is anonymous"),
        Identity::Authenticated { actor, .. } => {
            tracing::info!(id = %actor.id, role = %actor.role, name = %actor.display_name(), "session restored")
        }
        Identity::Demo { actor } => {
            tracing::info!(role = %actor.role, "demo session restored")
        }
    }

    // 5. Guarded Navigation Walkthrough
    // An anonymous visitor lands on the student dashboard, enters demo mode
    // as a recruiter, and tries both a permitted and a forbidden area.
    let student_area = client.guard(RoutePolicy::role(Role::Student));
    let recruiter_area = client.guard(RoutePolicy::role(Role::Recruiter));
    let any_signed_in = client.guard(RoutePolicy::authenticated());

    report("/dashboard/student", student_area.check());

    if identity.actor().is_none() {
        let actor = client.resolver.enter_demo_mode(Role::Recruiter).await;
        tracing::info!(role = %actor.role, home = %actor.role.dashboard_path(), "entered demo mode");
    }

    report("/dashboard/recruiter", recruiter_area.check());
    report("/dashboard/student", student_area.check());
    report("/portfolio/preview", any_signed_in.check());

    client.resolver.sign_out().await;
    report("/dashboard/recruiter", recruiter_area.check());

    tracing::info!("walkthrough complete");
}

fn report(route: &str, decision: GuardDecision) {
    match decision.redirect_path() {
        None => tracing::info!(route, "navigation allowed"),
        Some(target) => tracing::info!(route, target, "navigation redirected"),
    }
}
