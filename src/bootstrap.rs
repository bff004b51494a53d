//! Wiring: build adapters from config and inject them into the services.

use crate::adapters::http::AppState;
use crate::adapters::mail::{LogNotifier, SmtpNotifier};
use crate::adapters::persistence::SqliteRepo;
use crate::adapters::security::{BcryptHasher, JwtTokens};
use crate::ports::NotifierPort;
use crate::shared::config::AppConfig;
use crate::usecases::{
    AuthService, DashboardService, DepartmentService, EmployeeService, ImportService,
    ProjectService, TaskService, TicketService,
};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let secret = cfg
        .secret_key()
        .context("Set SECRET_KEY (env or .env) to sign auth tokens")?;

    let data_dir = PathBuf::from(cfg.data_dir_or_default());
    let repo = Arc::new(
        SqliteRepo::connect(&data_dir)
            .await
            .with_context(|| format!("open database in {}", data_dir.display()))?,
    );
    info!(path = %repo.db_path().display(), "database ready");

    let notifier: Arc<dyn NotifierPort> = match cfg.email() {
        Some(settings) => {
            info!(host = %settings.host, port = settings.port, "smtp notifications enabled");
            Arc::new(SmtpNotifier::new(&settings).context("configure smtp transport")?)
        }
        None => {
            warn!("EMAIL_HOST not set; notifications are only logged");
            Arc::new(LogNotifier::new())
        }
    };

    let tokens = Arc::new(JwtTokens::new(
        secret,
        Duration::from_secs(cfg.token_ttl_minutes_or_default() * 60),
    ));
    let passwords = Arc::new(BcryptHasher::new(cfg.bcrypt_cost_or_default()));

    Ok(AppState {
        auth: Arc::new(AuthService::new(repo.clone(), passwords, tokens)),
        departments: Arc::new(DepartmentService::new(repo.clone(), repo.clone())),
        employees: Arc::new(EmployeeService::new(repo.clone(), repo.clone())),
        projects: Arc::new(ProjectService::new(repo.clone(), repo.clone(), repo.clone())),
        tasks: Arc::new(TaskService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            notifier.clone(),
            cfg.default_page_limit_or_default(),
        )),
        tickets: Arc::new(TicketService::new(repo.clone(), repo.clone(), repo.clone())),
        imports: Arc::new(ImportService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            notifier,
        )),
        dashboard: Arc::new(DashboardService::new(repo.clone(), repo)),
        cors_allowed_origins: Arc::new(cfg.cors_allowed_origins()),
        max_body_bytes: cfg.max_body_bytes_or_default(),
    })
}
