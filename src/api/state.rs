//! Application state for shared services

use std::sync::Arc;

use crate::domain::Store;
use crate::infrastructure::member::MemberService;
use crate::infrastructure::observability::PrometheusMetrics;
use crate::infrastructure::project::ProjectService;
use crate::infrastructure::team::TeamService;

/// Application state: one store shared by every service
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub team_service: Arc<TeamService>,
    pub member_service: Arc<MemberService>,
    pub project_service: Arc<ProjectService>,
    pub metrics: Option<PrometheusMetrics>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            team_service: Arc::new(TeamService::new(store.clone())),
            member_service: Arc::new(MemberService::new(store.clone())),
            project_service: Arc::new(ProjectService::new(store.clone())),
            store,
            metrics: None,
        }
    }

    /// Serve the Prometheus scrape endpoint from this state
    pub fn with_metrics(mut self, metrics: Option<PrometheusMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}
