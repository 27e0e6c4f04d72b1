use chrono::{NaiveDate, NaiveTime};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use visitation::config::FacilityConfig;
use visitation::workflows::visits::domain::hhmm;
use visitation::workflows::visits::{
    Clock, InmateRecord, JsonCredentialRenderer, MemoryNotifier, MemoryRecordStore,
    StaticInmateRegistry, VisitLifecycleService,
};

pub(crate) type InMemoryVisitService = VisitLifecycleService<MemoryRecordStore, MemoryNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Roster used by the demo and by local runs until a registry is wired in.
pub(crate) fn demo_registry() -> StaticInmateRegistry {
    StaticInmateRegistry::new([
        InmateRecord {
            id: "inmate-1".to_string(),
            inmate_number: "PDL-1001".to_string(),
            name: "Juan Dela Cruz".to_string(),
            active: true,
        },
        InmateRecord {
            id: "inmate-2".to_string(),
            inmate_number: "PDL-1002".to_string(),
            name: "Andres Bonifacio Reyes".to_string(),
            active: true,
        },
        InmateRecord {
            id: "inmate-3".to_string(),
            inmate_number: "PDL-2002".to_string(),
            name: "Pedro Santos".to_string(),
            active: false,
        },
    ])
}

pub(crate) fn in_memory_service(
    facility: FacilityConfig,
    clock: Arc<dyn Clock>,
) -> (Arc<InMemoryVisitService>, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::default());
    let service = VisitLifecycleService::new(
        Arc::new(MemoryRecordStore::new()),
        notifier.clone(),
        Arc::new(demo_registry()),
        Arc::new(JsonCredentialRenderer),
        facility,
    )
    .with_clock(clock);
    (Arc::new(service), notifier)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    hhmm::parse(raw).map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
}
