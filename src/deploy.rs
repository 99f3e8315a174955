//! Deployment orchestration
//!
//! A deployment runs in two batches. The first holds every resource that
//! can be rendered up front; once it is applied the two load-balanced
//! services receive ingress addresses, and only then can the controllers
//! that embed those addresses be rendered and applied as the second batch.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::TeardownFailure;
use crate::kubectl::{IngressFormat, Kubectl};
use crate::persist::append_manifests;
use crate::poll::{AddressPoller, PollPolicy};
use crate::secret::SecretData;
use crate::template::{DeploymentConfig, ManifestKind, ManifestRenderer};
use crate::{Error, Result};

/// Default path of the first batch
pub const SPECS_FILE: &str = "/tmp/kontinuous-specs.yml";
/// Default path of the second batch
pub const CONTROLLERS_FILE: &str = "/tmp/kontinuous-rc-spec.yml";

/// Load-balanced service fronting the Kontinuous API
pub const APP_SERVICE: &str = "kontinuous";
/// Load-balanced service fronting the dashboard
pub const DASHBOARD_SERVICE: &str = "kontinuous-ui";

/// Manifests that do not depend on ingress addresses, rendered before the secret
const STATIC_MANIFESTS: [ManifestKind; 5] = [
    ManifestKind::ObjectStore,
    ManifestKind::KeyValueStore,
    ManifestKind::Registry,
    ManifestKind::AppService,
    ManifestKind::DashboardService,
];

/// Manifests that embed both ingress addresses
const CONTROLLER_MANIFESTS: [ManifestKind; 2] = [
    ManifestKind::AppController,
    ManifestKind::DashboardController,
];

/// Where the two batches are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPaths {
    pub specs: PathBuf,
    pub controllers: PathBuf,
}

impl Default for BatchPaths {
    fn default() -> Self {
        Self {
            specs: PathBuf::from(SPECS_FILE),
            controllers: PathBuf::from(CONTROLLERS_FILE),
        }
    }
}

/// Outcome of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub namespace: String,
    pub kontinuous_ip: String,
    pub dashboard_ip: String,
    pub paths: BatchPaths,
}

/// Encode the credentials into `config` and render the first batch.
///
/// Returns the secret followed by the object store, key-value store,
/// registry and both services.
pub fn render_specs(
    renderer: &ManifestRenderer,
    config: &mut DeploymentConfig,
) -> Result<Vec<String>> {
    let static_manifests = renderer.render_all(&STATIC_MANIFESTS, config)?;

    config.secret_data = Some(SecretData::from_config(config).encode()?);
    let secret = renderer.render(ManifestKind::Secret, config)?;

    let mut batch = Vec::with_capacity(STATIC_MANIFESTS.len() + 1);
    batch.push(secret);
    batch.extend(static_manifests);
    Ok(batch)
}

/// Render the second batch; `config` must carry both ingress addresses
pub fn render_controllers(
    renderer: &ManifestRenderer,
    config: &DeploymentConfig,
) -> Result<Vec<String>> {
    Ok(renderer.render_all(&CONTROLLER_MANIFESTS, config)?)
}

/// Drives a deployment against the cluster through `kubectl`
pub struct Deployer<K: Kubectl> {
    kubectl: K,
    renderer: ManifestRenderer,
    paths: BatchPaths,
    poll_policy: PollPolicy,
    ingress_format: IngressFormat,
}

impl<K: Kubectl> Deployer<K> {
    pub fn new(kubectl: K, renderer: ManifestRenderer) -> Self {
        Self {
            kubectl,
            renderer,
            paths: BatchPaths::default(),
            poll_policy: PollPolicy::default(),
            ingress_format: IngressFormat::default(),
        }
    }

    pub fn with_paths(mut self, paths: BatchPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn with_ingress_format(mut self, format: IngressFormat) -> Self {
        self.ingress_format = format;
        self
    }

    /// Render, persist and apply both batches.
    ///
    /// Every step must succeed before the next one starts; the first error
    /// aborts the deployment and leaves already-applied resources in place.
    pub async fn deploy(&self, mut config: DeploymentConfig) -> Result<DeploymentReport> {
        config.validate()?;
        let namespace = config.namespace.clone();
        info!(namespace = %namespace, "Deploying Kontinuous");

        let specs = render_specs(&self.renderer, &mut config)?;
        append_manifests(&self.paths.specs, &specs).await?;
        info!(path = %self.paths.specs.display(), documents = specs.len(), "Wrote specs");

        self.kubectl.apply(&self.paths.specs).await?;
        info!("Applied specs, waiting for ingress addresses");

        let poller = AddressPoller::new(&self.kubectl, self.poll_policy, self.ingress_format);
        let kontinuous_ip = poller.resolve(APP_SERVICE, &namespace).await?;
        let dashboard_ip = poller.resolve(DASHBOARD_SERVICE, &namespace).await?;
        config.kontinuous_ip = Some(kontinuous_ip.clone());
        config.dashboard_ip = Some(dashboard_ip.clone());

        let controllers = render_controllers(&self.renderer, &config)?;
        append_manifests(&self.paths.controllers, &controllers).await?;
        info!(
            path = %self.paths.controllers.display(),
            documents = controllers.len(),
            "Wrote controllers"
        );

        self.kubectl.apply(&self.paths.controllers).await?;
        info!(
            kontinuous = %kontinuous_ip,
            dashboard = %dashboard_ip,
            "Kontinuous deployed"
        );

        Ok(DeploymentReport {
            namespace,
            kontinuous_ip,
            dashboard_ip,
            paths: self.paths.clone(),
        })
    }

    /// Delete everything in both batch files.
    ///
    /// Both deletions are attempted in order even if the first fails; every
    /// failure is reported in a single [`Error::TeardownFailed`].
    pub async fn teardown(&self) -> Result<()> {
        let mut failures = Vec::new();

        for path in [&self.paths.specs, &self.paths.controllers] {
            match self.kubectl.delete(path).await {
                Ok(()) => info!(path = %path.display(), "Deleted resources"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete resources");
                    failures.push(TeardownFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::TeardownFailed { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use base64::{engine::general_purpose::STANDARD, Engine};
    use mockall::Sequence;

    use super::*;
    use crate::kubectl::MockKubectl;

    fn demo_config() -> DeploymentConfig {
        DeploymentConfig::builder()
            .namespace("demo")
            .access_key("AK")
            .secret_key("SK")
            .auth_code("AUTH")
            .client_id("CID")
            .client_secret("CSEC")
            .build()
    }

    fn temp_paths(dir: &Path) -> BatchPaths {
        BatchPaths {
            specs: dir.join("kontinuous-specs.yml"),
            controllers: dir.join("kontinuous-rc-spec.yml"),
        }
    }

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            interval: std::time::Duration::from_millis(1),
            max_wait: None,
        }
    }

    fn deployer(mock: MockKubectl, paths: BatchPaths) -> Deployer<MockKubectl> {
        Deployer::new(mock, ManifestRenderer::default())
            .with_paths(paths)
            .with_poll_policy(fast_policy())
    }

    /// Story: a clean deployment applies specs, waits for both services,
    /// then applies the controllers.
    #[tokio::test]
    async fn story_full_deployment_runs_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        let specs_path = paths.specs.clone();
        let controllers_path = paths.controllers.clone();

        let mut mock = MockKubectl::new();
        let mut seq = Sequence::new();
        let applied_specs = Arc::new(Mutex::new(String::new()));
        let applied_controllers = Arc::new(Mutex::new(String::new()));

        let specs_seen = applied_specs.clone();
        let expected_specs = specs_path.clone();
        mock.expect_apply()
            .withf(move |path| path.ends_with("kontinuous-specs.yml"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |path| {
                *specs_seen.lock().unwrap() =
                    std::fs::read_to_string(path).unwrap_or_default();
                assert_eq!(path, expected_specs.as_path());
                Ok(())
            });
        mock.expect_service_ingress()
            .withf(|service, namespace, _| {
                service.to_string() == "kontinuous" && namespace.to_string() == "demo"
            })
            .times(2)
            .in_sequence(&mut seq)
            .returning({
                let mut first = true;
                move |_, _, _| {
                    let output = if first { "<no value>" } else { "[map[ip:10.0.0.1]]" };
                    first = false;
                    Ok(output.to_string())
                }
            });
        mock.expect_service_ingress()
            .withf(|service, namespace, _| {
                service.to_string() == "kontinuous-ui" && namespace.to_string() == "demo"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("[map[ip:10.0.0.2]]".to_string()));

        let controllers_seen = applied_controllers.clone();
        mock.expect_apply()
            .withf(move |path| path.ends_with("kontinuous-rc-spec.yml"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |path| {
                *controllers_seen.lock().unwrap() =
                    std::fs::read_to_string(path).unwrap_or_default();
                Ok(())
            });

        let report = deployer(mock, paths).deploy(demo_config()).await.unwrap();

        assert_eq!(report.namespace, "demo");
        assert_eq!(report.kontinuous_ip, "10.0.0.1");
        assert_eq!(report.dashboard_ip, "10.0.0.2");
        assert_eq!(report.paths.controllers, controllers_path);

        // Batch 1 was fully written before it was applied
        let specs = applied_specs.lock().unwrap().clone();
        assert_eq!(specs, std::fs::read_to_string(&specs_path).unwrap());
        assert!(specs.starts_with("---\nkind: Secret"));
        assert!(!specs.contains("10.0.0.1"));

        let controllers = applied_controllers.lock().unwrap().clone();
        assert!(controllers.contains("http://10.0.0.1:8080"));
        assert!(controllers.contains("http://10.0.0.2:5000"));
    }

    #[test]
    fn specs_batch_holds_secret_then_static_resources() {
        let mut config = demo_config();
        let batch = render_specs(&ManifestRenderer::default(), &mut config).unwrap();

        assert_eq!(batch.len(), 6);
        assert!(batch[0].contains("kind: Secret"));
        assert!(batch[1].contains("minio"));
        assert!(batch[2].contains("etcd"));
        assert!(batch[3].contains("registry"));
        assert!(batch[4].contains("name: kontinuous\n"));
        assert!(batch[5].contains("name: kontinuous-ui\n"));
        for manifest in &batch {
            assert!(manifest.contains("namespace: demo"));
        }
    }

    #[test]
    fn demo_secret_in_batch_decodes_to_credentials() {
        let mut config = demo_config();
        let batch = render_specs(&ManifestRenderer::default(), &mut config).unwrap();

        let encoded = config.secret_data.clone().unwrap();
        assert!(batch[0].contains(&format!("kontinuous-secrets: {}", encoded)));

        let json = String::from_utf8(STANDARD.decode(&encoded).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"AuthSecret":"AUTH","S3SecretKey":"SK","S3AccessKey":"AK","GithubClientID":"CID","GithubClientSecret":"CSEC"}"#
        );
    }

    #[test]
    fn controllers_need_resolved_addresses() {
        let renderer = ManifestRenderer::default();
        assert!(matches!(
            render_controllers(&renderer, &demo_config()),
            Err(Error::Template(_))
        ));

        let config = DeploymentConfig::builder()
            .namespace("demo")
            .client_id("CID")
            .addresses(Some("10.0.0.1".to_string()), Some("10.0.0.2".to_string()))
            .build();
        let controllers = render_controllers(&renderer, &config).unwrap();
        assert_eq!(controllers.len(), 2);
    }

    #[tokio::test]
    async fn existing_batches_are_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        std::fs::write(&paths.specs, "# previous run\n").unwrap();

        let mut mock = MockKubectl::new();
        mock.expect_apply().returning(|_| Ok(()));
        mock.expect_service_ingress()
            .returning(|_, _, _| Ok("[map[ip:10.0.0.1]]".to_string()));

        deployer(mock, paths.clone())
            .deploy(demo_config())
            .await
            .unwrap();

        let specs = std::fs::read_to_string(&paths.specs).unwrap();
        assert!(specs.starts_with("# previous run\n---\nkind: Secret"));
    }

    #[tokio::test]
    async fn apply_failure_stops_before_polling() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());

        let mut mock = MockKubectl::new();
        mock.expect_apply()
            .times(1)
            .returning(|_| Err(Error::command_failed("kubectl apply failed: forbidden")));
        mock.expect_service_ingress().never();

        let err = deployer(mock, paths.clone())
            .deploy(demo_config())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CommandFailed { .. }));
        assert!(paths.specs.exists());
        assert!(!paths.controllers.exists());
    }

    #[tokio::test]
    async fn empty_namespace_is_rejected_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());

        let mut mock = MockKubectl::new();
        mock.expect_apply().never();

        let config = DeploymentConfig {
            namespace: String::new(),
            ..demo_config()
        };
        let err = deployer(mock, paths.clone())
            .deploy(config)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
        assert!(!paths.specs.exists());
    }

    #[tokio::test]
    async fn unrecognized_ingress_aborts_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());

        let mut mock = MockKubectl::new();
        mock.expect_apply().times(1).returning(|_| Ok(()));
        mock.expect_service_ingress()
            .times(1)
            .returning(|_, _, _| Ok("[]".to_string()));

        let err = deployer(mock, paths.clone())
            .deploy(demo_config())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnexpectedOutput { .. }));
        assert!(!paths.controllers.exists());
    }

    #[tokio::test]
    async fn teardown_deletes_specs_then_controllers() {
        let mut mock = MockKubectl::new();
        let mut seq = Sequence::new();
        mock.expect_delete()
            .withf(|path| path.ends_with("kontinuous-specs.yml"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_delete()
            .withf(|path| path.ends_with("kontinuous-rc-spec.yml"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        Deployer::new(mock, ManifestRenderer::default())
            .teardown()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn teardown_attempts_both_and_reports_every_failure() {
        let mut mock = MockKubectl::new();
        mock.expect_delete()
            .times(2)
            .returning(|path| {
                Err(Error::command_failed(format!(
                    "kubectl delete --filename {} failed: not found",
                    path.display()
                )))
            });

        let err = Deployer::new(mock, ManifestRenderer::default())
            .teardown()
            .await
            .unwrap_err();

        match err {
            Error::TeardownFailed { failures } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].path, PathBuf::from(SPECS_FILE));
                assert_eq!(failures[1].path, PathBuf::from(CONTROLLERS_FILE));
                assert!(failures[0].reason.contains("not found"));
            }
            other => panic!("expected TeardownFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn teardown_continues_after_first_failure() {
        let mut mock = MockKubectl::new();
        mock.expect_delete()
            .withf(|path| path.ends_with("kontinuous-specs.yml"))
            .times(1)
            .returning(|_| Err(Error::command_failed("connection refused")));
        mock.expect_delete()
            .withf(|path| path.ends_with("kontinuous-rc-spec.yml"))
            .times(1)
            .returning(|_| Ok(()));

        let err = Deployer::new(mock, ManifestRenderer::default())
            .teardown()
            .await
            .unwrap_err();

        match err {
            Error::TeardownFailed { failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].reason.contains("connection refused"));
            }
            other => panic!("expected TeardownFailed, got {:?}", other),
        }
    }
}
