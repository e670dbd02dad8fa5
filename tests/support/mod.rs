// ABOUTME: Test support utilities.
// ABOUTME: Scripted in-memory collaborators for driving the deployment engine.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::Duration;

use roughneck::config::{ConfigStore, FeatureConfig, ProviderKind};
use roughneck::deploy::{
    Collaborators, DeploymentOutcome, Orchestrator, RecoveryAction, WaitPolicy,
};
use roughneck::diagnostics::Warning;
use roughneck::error::{Error, Result};
use roughneck::output::{Output, OutputMode};
use roughneck::probe::ConnectivityProbe;
use roughneck::prompt::{Choice, UserInteraction};
use roughneck::providers::{CatalogError, ResourceCatalog, ResourceType};
use roughneck::provision::{ApplyReport, BackendError, ConfigurationBackend, ProvisioningBackend};
use roughneck::types::DeploymentName;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("roughneck=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn name(s: &str) -> DeploymentName {
    DeploymentName::new(s).unwrap()
}

pub fn ip() -> IpAddr {
    "203.0.113.9".parse().unwrap()
}

pub fn hetzner_config() -> FeatureConfig {
    let mut config = FeatureConfig::template(ProviderKind::Hetzner);
    if let roughneck::config::ProviderConfig::Hetzner(h) = &mut config.provider {
        h.token = "test-token".to_string();
        h.location = "hel1".to_string();
        h.server_type = "cpx31".to_string();
    }
    config
}

pub fn unavailable_type_error() -> String {
    "Error: creating server: Resource Type \"cpx31\" is unavailable in \"hel1\"\n".to_string()
}

/// Ordered record of collaborator calls, shared by all fakes of one harness.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.lock().iter().filter(|c| *c == call).count()
    }
}

#[derive(Debug, Clone, Default)]
struct Record {
    config: Option<FeatureConfig>,
    ip: Option<IpAddr>,
    has_state: bool,
}

/// In-memory deployment store.
#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    records: Arc<Mutex<BTreeMap<DeploymentName, Record>>>,
    writes: Arc<Mutex<usize>>,
    unreadable: Arc<Mutex<bool>>,
}

impl FakeStore {
    pub fn add(&self, name: &DeploymentName, config: FeatureConfig) {
        self.records.lock().entry(name.clone()).or_default().config = Some(config);
    }

    pub fn set_ip(&self, name: &DeploymentName, ip: Option<IpAddr>) {
        let mut records = self.records.lock();
        let record = records.entry(name.clone()).or_default();
        record.ip = ip;
        if ip.is_some() {
            record.has_state = true;
        }
    }

    pub fn set_state(&self, name: &DeploymentName, has_state: bool) {
        self.records.lock().entry(name.clone()).or_default().has_state = has_state;
    }

    pub fn set_unreadable(&self, unreadable: bool) {
        *self.unreadable.lock() = unreadable;
    }

    pub fn config(&self, name: &DeploymentName) -> Option<FeatureConfig> {
        self.records.lock().get(name).and_then(|r| r.config.clone())
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl ConfigStore for FakeStore {
    fn exists(&self, name: &DeploymentName) -> bool {
        self.config(name).is_some()
    }

    fn list(&self) -> Result<Vec<DeploymentName>> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|(_, r)| r.config.is_some())
            .map(|(n, _)| n.clone())
            .collect())
    }

    fn read(&self, name: &DeploymentName) -> Result<Option<FeatureConfig>> {
        if *self.unreadable.lock() {
            return Err(Error::InvalidConfig("corrupt var file".to_string()));
        }
        Ok(self.config(name))
    }

    fn write(&self, name: &DeploymentName, config: &FeatureConfig) -> Result<()> {
        *self.writes.lock() += 1;
        self.add(name, config.clone());
        Ok(())
    }

    fn ip(&self, name: &DeploymentName) -> Option<IpAddr> {
        self.records.lock().get(name).and_then(|r| r.ip)
    }

    fn has_persisted_state(&self, name: &DeploymentName) -> bool {
        self.records.lock().get(name).is_some_and(|r| r.has_state)
    }

    fn deployment_dir(&self, name: &DeploymentName) -> PathBuf {
        PathBuf::from("/nonexistent/deployments").join(name.as_str())
    }

    fn delete(&self, name: &DeploymentName) -> Result<()> {
        self.records.lock().remove(name);
        Ok(())
    }
}

/// Infrastructure tool whose results are scripted per call. Unscripted calls succeed.
/// A successful apply records `apply_ip` in the store, like a real state file would.
pub struct FakeProvisioner {
    log: CallLog,
    store: FakeStore,
    apply_ip: Mutex<Option<IpAddr>>,
    init_results: Mutex<VecDeque<bool>>,
    apply_results: Mutex<VecDeque<ApplyReport>>,
}

impl FakeProvisioner {
    pub fn new(log: CallLog, store: FakeStore) -> Self {
        Self {
            log,
            store,
            apply_ip: Mutex::new(Some(ip())),
            init_results: Mutex::new(VecDeque::new()),
            apply_results: Mutex::new(VecDeque::new()),
        }
    }

    /// Address recorded by a successful apply; `None` records nothing.
    pub fn set_apply_ip(&self, ip: Option<IpAddr>) {
        *self.apply_ip.lock() = ip;
    }

    pub fn script_init(&self, results: impl IntoIterator<Item = bool>) {
        self.init_results.lock().extend(results);
    }

    pub fn script_apply(&self, results: impl IntoIterator<Item = ApplyReport>) {
        self.apply_results.lock().extend(results);
    }
}

#[async_trait]
impl ProvisioningBackend for FakeProvisioner {
    async fn init(&self, _name: &DeploymentName) -> std::result::Result<bool, BackendError> {
        self.log.push("init");
        Ok(self.init_results.lock().pop_front().unwrap_or(true))
    }

    async fn apply(&self, name: &DeploymentName) -> std::result::Result<ApplyReport, BackendError> {
        self.log.push("apply");
        self.store.set_state(name, true);
        let report = self
            .apply_results
            .lock()
            .pop_front()
            .unwrap_or_else(ApplyReport::succeeded);
        if report.success {
            self.store.set_ip(name, *self.apply_ip.lock());
        }
        Ok(report)
    }

    async fn destroy(&self, name: &DeploymentName) -> std::result::Result<bool, BackendError> {
        self.log.push("destroy");
        self.store.set_ip(name, None);
        self.store.set_state(name, false);
        Ok(true)
    }
}

/// Configuration tool with scripted playbook results and a fixed validation result.
pub struct FakeConfigurator {
    log: CallLog,
    playbook_results: Mutex<VecDeque<std::result::Result<bool, String>>>,
    validate_result: Mutex<bool>,
}

impl FakeConfigurator {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            playbook_results: Mutex::new(VecDeque::new()),
            validate_result: Mutex::new(true),
        }
    }

    pub fn script_playbook(&self, results: impl IntoIterator<Item = bool>) {
        self.playbook_results
            .lock()
            .extend(results.into_iter().map(Ok));
    }

    /// Next playbook run fails because the inventory is missing.
    pub fn script_missing_inventory(&self) {
        self.playbook_results
            .lock()
            .push_back(Err("inventory".to_string()));
    }

    pub fn set_validate(&self, result: bool) {
        *self.validate_result.lock() = result;
    }
}

#[async_trait]
impl ConfigurationBackend for FakeConfigurator {
    async fn run_playbook(&self, _name: &DeploymentName) -> std::result::Result<bool, BackendError> {
        self.log.push("playbook");
        match self.playbook_results.lock().pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(_)) => Err(BackendError::MissingInventory(PathBuf::from(
                "/nonexistent/inventory.ini",
            ))),
            None => Ok(true),
        }
    }

    async fn run_validate(&self, _name: &DeploymentName) -> std::result::Result<bool, BackendError> {
        self.log.push("validate");
        Ok(*self.validate_result.lock())
    }

    async fn run_update(
        &self,
        _name: &DeploymentName,
        tags: &[String],
    ) -> std::result::Result<bool, BackendError> {
        self.log.push(format!("update:{}", tags.join(",")));
        Ok(true)
    }
}

/// Reachability scripted per probe; falls back to `default_reachable`.
pub struct FakeProbe {
    log: CallLog,
    results: Mutex<VecDeque<bool>>,
    default_reachable: Mutex<bool>,
}

impl FakeProbe {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            results: Mutex::new(VecDeque::new()),
            default_reachable: Mutex::new(true),
        }
    }

    pub fn script(&self, results: impl IntoIterator<Item = bool>) {
        self.results.lock().extend(results);
    }

    pub fn set_default(&self, reachable: bool) {
        *self.default_reachable.lock() = reachable;
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn is_reachable(&self, _ip: IpAddr) -> bool {
        self.log.push("probe");
        self.results
            .lock()
            .pop_front()
            .unwrap_or(*self.default_reachable.lock())
    }

    async fn forget_host_key(&self, _ip: IpAddr) {
        self.log.push("forget-host-key");
    }
}

/// Catalog returning a fixed list, or an HTTP error status.
pub struct FakeCatalog {
    response: Mutex<std::result::Result<Vec<ResourceType>, u16>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self {
            response: Mutex::new(Ok(vec![
                resource_type("cpx21", 7.5),
                resource_type("cpx41", 28.56),
            ])),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCatalog {
    pub fn respond(&self, response: std::result::Result<Vec<ResourceType>, u16>) {
        *self.response.lock() = response;
    }

    /// `(token, location)` of every request.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

pub fn resource_type(name: &str, price: f64) -> ResourceType {
    ResourceType {
        name: name.to_string(),
        cores: 4,
        memory_gb: 8.0,
        cpu_type: "shared".to_string(),
        price_monthly: Some(price),
    }
}

#[async_trait]
impl ResourceCatalog for FakeCatalog {
    async fn list_types(
        &self,
        token: &str,
        location: &str,
    ) -> std::result::Result<Vec<ResourceType>, CatalogError> {
        self.requests
            .lock()
            .push((token.to_string(), location.to_string()));
        self.response
            .lock()
            .clone()
            .map_err(|status| CatalogError::Status {
                status,
                body: "scripted failure".to_string(),
            })
    }
}

/// Operator whose answers are scripted. Unscripted menus are cancelled (which
/// the engine treats as abort); unscripted confirmations take the default.
#[derive(Default)]
pub struct ScriptedUi {
    actions: Mutex<VecDeque<RecoveryAction>>,
    confirms: Mutex<VecDeque<bool>>,
    selections: Mutex<VecDeque<Option<String>>>,
    edit_succeeds: Mutex<bool>,
    menus: Mutex<Vec<Vec<RecoveryAction>>>,
    edited: Mutex<Vec<PathBuf>>,
    confirm_prompts: Mutex<Vec<String>>,
}

impl ScriptedUi {
    pub fn actions(&self, actions: impl IntoIterator<Item = RecoveryAction>) {
        self.actions.lock().extend(actions);
    }

    pub fn confirms(&self, answers: impl IntoIterator<Item = bool>) {
        self.confirms.lock().extend(answers);
    }

    pub fn selections(&self, answers: impl IntoIterator<Item = Option<&'static str>>) {
        self.selections
            .lock()
            .extend(answers.into_iter().map(|a| a.map(str::to_string)));
    }

    pub fn set_edit_succeeds(&self, succeeds: bool) {
        *self.edit_succeeds.lock() = succeeds;
    }

    /// Every recovery menu offered, in order.
    pub fn menus(&self) -> Vec<Vec<RecoveryAction>> {
        self.menus.lock().clone()
    }

    pub fn edited(&self) -> Vec<PathBuf> {
        self.edited.lock().clone()
    }

    pub fn confirm_prompts(&self) -> Vec<String> {
        self.confirm_prompts.lock().clone()
    }
}

impl UserInteraction for ScriptedUi {
    fn select(&self, _prompt: &str, choices: &[Choice]) -> Option<String> {
        let answer = self.selections.lock().pop_front().flatten()?;
        choices
            .iter()
            .find(|c| c.value == answer)
            .map(|c| c.value.clone())
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        self.confirm_prompts.lock().push(prompt.to_string());
        self.confirms.lock().pop_front().unwrap_or(default)
    }

    fn edit_file(&self, path: &Path) -> bool {
        self.edited.lock().push(path.to_path_buf());
        *self.edit_succeeds.lock()
    }

    fn choose_action(&self, _prompt: &str, options: &[RecoveryAction]) -> Option<RecoveryAction> {
        self.menus.lock().push(options.to_vec());
        self.actions.lock().pop_front()
    }
}

/// One deployment wired to a full set of fakes.
pub struct Harness {
    pub name: DeploymentName,
    pub log: CallLog,
    pub store: FakeStore,
    pub provisioner: FakeProvisioner,
    pub configurator: FakeConfigurator,
    pub probe: FakeProbe,
    pub catalog: FakeCatalog,
    pub ui: ScriptedUi,
    pub output: Output,
    pub wait: WaitPolicy,
}

impl Harness {
    /// A configured Hetzner deployment named `dev` with no infrastructure yet.
    pub fn new() -> Self {
        init_tracing();
        let log = CallLog::default();
        let store = FakeStore::default();
        let name = name("dev");
        store.add(&name, hetzner_config());

        Self {
            provisioner: FakeProvisioner::new(log.clone(), store.clone()),
            configurator: FakeConfigurator::new(log.clone()),
            probe: FakeProbe::new(log.clone()),
            catalog: FakeCatalog::default(),
            ui: ScriptedUi::default(),
            output: Output::new(OutputMode::Quiet),
            wait: WaitPolicy {
                timeout: Duration::from_millis(200),
                interval: Duration::from_millis(1),
            },
            name,
            log,
            store,
        }
    }

    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            store: &self.store,
            provisioner: &self.provisioner,
            configurator: &self.configurator,
            probe: &self.probe,
            catalog: &self.catalog,
            ui: &self.ui,
        }
    }

    /// Run the orchestrator once, returning its outcome and collected warnings.
    pub async fn run(&self) -> (DeploymentOutcome, Vec<Warning>) {
        let mut orchestrator = Orchestrator::new(self.collaborators(), &self.output, self.wait);
        let outcome = orchestrator.run_deployment(&self.name).await;
        (outcome, orchestrator.diagnostics().warnings().to_vec())
    }

    /// Stage collaborator calls only (probes and host key cleanup filtered out).
    pub fn stage_calls(&self) -> Vec<String> {
        self.log
            .calls()
            .into_iter()
            .filter(|c| c != "probe" && c != "forget-host-key")
            .collect()
    }
}
