// Streaming dashboard service - Progressive loading, one update per panel as it resolves
use crate::application::dashboard_service::fetch_panel;
use crate::application::data_source::DashboardDataSource;
use crate::domain::dashboard::{DashboardEvent, PanelId, PanelSkeleton, PanelState};
use crate::domain::range::TimeRange;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct StreamingDashboardService {
    source: Arc<dyn DashboardDataSource>,
}

impl StreamingDashboardService {
    pub fn new(source: Arc<dyn DashboardDataSource>) -> Self {
        Self { source }
    }

    pub async fn stream_dashboard(&self, range: TimeRange) -> mpsc::Receiver<DashboardEvent> {
        let (tx, rx) = mpsc::channel(32);
        let start_time = Instant::now();
        let panels = PanelId::ALL;

        // 1. Skeleton first so every panel can render its placeholders
        let skeleton = DashboardEvent::Skeleton {
            panels: panels.iter().copied().map(PanelSkeleton::from).collect(),
        };
        let _ = tx.send(skeleton).await;

        // 2. One task per panel; no panel waits on another
        let mut join_set = JoinSet::new();
        for panel in panels {
            let tx = tx.clone();
            let source = self.source.clone();

            join_set.spawn(async move {
                let state = PanelState::from_result(fetch_panel(source.as_ref(), panel, range).await);
                if let PanelState::Errored(e) = &state {
                    tracing::warn!("Panel {:?} failed: {}", panel, e);
                }
                // The receiver may be gone if the client disconnected; the result is dropped.
                let _ = tx.send(DashboardEvent::PanelUpdate { panel, state }).await;
            });
        }

        // 3. Completion once every panel task has finished
        tokio::spawn(async move {
            while let Some(result) = join_set.join_next().await {
                if let Err(e) = result {
                    tracing::error!("Panel task aborted: {}", e);
                }
            }

            let duration_ms = start_time.elapsed().as_millis() as i64;
            let _ = tx
                .send(DashboardEvent::Complete {
                    panels: panels.len(),
                    duration_ms,
                })
                .await;
        });

        rx
    }
}
