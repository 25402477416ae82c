//! End-to-end deployment orchestration.
//!
//! Drives the run through its phases in strict order: ensure network
//! policy, package the payload, ensure the bucket, upload, create the
//! instance, wait, pause for the user, delete the instance, wait. Any
//! collaborator error aborts the run; once the create call has been
//! issued, teardown is attempted on every exit path before the error is
//! surfaced.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::DeployConfig;
use crate::domain::{Artifact, DeployPhase, Instance, Operation, TeardownRecord};
use crate::error::{Error, Result};
use crate::providers::{Compute, ObjectStore};

use super::instances::InstanceLifecycleManager;
use super::network::NetworkPolicyManager;
use super::package::Packager;
use super::storage::ArtifactStore;
use super::waiter::OperationWaiter;

/// Composes the collaborators into the full deployment flow
pub struct Orchestrator {
    compute: Arc<dyn Compute>,
    store: Arc<dyn ObjectStore>,
    config: DeployConfig,
}

impl Orchestrator {
    pub fn new(
        compute: Arc<dyn Compute>,
        store: Arc<dyn ObjectStore>,
        config: DeployConfig,
    ) -> Self {
        Self {
            compute,
            store,
            config,
        }
    }

    /// Run the deployment to completion
    #[instrument(skip(self), fields(project = %self.config.project, instance = %self.config.instance_name))]
    pub async fn run(&self) -> Result<()> {
        let run_id = Uuid::new_v4();
        let mut phase = DeployPhase::Init;
        info!(%run_id, phase = %phase, "starting deployment");

        let network = NetworkPolicyManager::new(self.compute.clone(), &self.config.project);
        let packager = Packager::new(&self.config.staging_dir);
        let artifact_store = ArtifactStore::new(self.store.clone(), &self.config.project);
        let instances = InstanceLifecycleManager::new(self.compute.clone(), &self.config);
        let waiter = OperationWaiter::new(
            self.compute.clone(),
            &self.config.project,
            &self.config.zone,
            self.config.poll.clone(),
        );

        let result = self
            .deploy(run_id, &mut phase, &network, &packager, &artifact_store, &instances, &waiter)
            .await;

        match result {
            Ok(()) => {
                self.advance(&mut phase, DeployPhase::Done);
                info!(%run_id, "deployment finished");
                Ok(())
            }
            Err(e) => {
                phase = DeployPhase::Failed;
                error!(%run_id, phase = %phase, error = %e, "deployment failed");
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn deploy(
        &self,
        run_id: Uuid,
        phase: &mut DeployPhase,
        network: &NetworkPolicyManager,
        packager: &Packager,
        artifact_store: &ArtifactStore,
        instances: &InstanceLifecycleManager,
        waiter: &OperationWaiter,
    ) -> Result<()> {
        network.ensure_ingress_rule(&self.config.ports).await?;
        self.advance(phase, DeployPhase::PolicyReady);

        let artifact = packager.package(&self.config.app_dir)?;
        self.advance(phase, DeployPhase::Packaged);

        let bucket = artifact_store.ensure_bucket(&self.config.bucket).await?;
        artifact_store.upload(&bucket, &artifact).await?;
        self.advance(phase, DeployPhase::Stored);

        let create_op = instances
            .create(&self.config.instance_name, &bucket.name, &artifact)
            .await?;
        self.advance(phase, DeployPhase::InstanceCreating);

        // The create call is irrevocable; record the intent to delete
        // before anything else can fail. The record is best-effort intent
        // for an out-of-process recovery pass; the in-process teardown
        // below is the primary guarantee and must run regardless.
        if let Err(e) = self.write_teardown_record(run_id).await {
            warn!(error = %e, "could not write teardown record");
        }

        let outcome = self
            .serve_until_signal(phase, instances, waiter, &create_op, &artifact)
            .await;

        self.advance(phase, DeployPhase::InstanceDeleting);
        let teardown = self.teardown(instances, waiter).await;

        match (outcome, teardown) {
            (Ok(()), Ok(())) => {
                self.clear_teardown_record().await;
                Ok(())
            }
            (Err(e), Ok(())) => {
                // The original failure is the one worth surfacing; the
                // instance itself was still torn down.
                self.clear_teardown_record().await;
                Err(e)
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), Err(teardown_err)) => {
                error!(error = %teardown_err, "teardown also failed; instance may be leaked");
                Err(e)
            }
        }
    }

    /// Everything between instance creation and the teardown decision
    async fn serve_until_signal(
        &self,
        phase: &mut DeployPhase,
        instances: &InstanceLifecycleManager,
        waiter: &OperationWaiter,
        create_op: &Operation,
        artifact: &Artifact,
    ) -> Result<()> {
        waiter.wait(create_op).await?;
        self.advance(phase, DeployPhase::InstanceReady);

        let all = instances.list().await?;
        info!(
            project = %self.config.project,
            zone = %self.config.zone,
            count = all.len(),
            "instances in zone"
        );
        for instance in &all {
            info!(" - {}", instance.name);
        }

        let instance = instances.get(&self.config.instance_name).await?;
        self.print_endpoints(&instance, artifact);

        if self.config.wait_for_user {
            self.advance(phase, DeployPhase::AwaitingUser);
            self.pause_for_user().await?;
        }

        Ok(())
    }

    /// Delete the instance and wait for the delete operation to finish
    async fn teardown(
        &self,
        instances: &InstanceLifecycleManager,
        waiter: &OperationWaiter,
    ) -> Result<()> {
        info!(instance = %self.config.instance_name, "deleting instance");
        let delete_op = instances.delete(&self.config.instance_name).await?;
        waiter.wait(&delete_op).await?;
        info!(instance = %self.config.instance_name, "instance deleted");
        Ok(())
    }

    fn print_endpoints(&self, instance: &Instance, artifact: &Artifact) {
        println!("\nInstance created.");
        println!(
            "It will take a minute or two to fetch {} and start the app.",
            artifact.blob_name
        );
        println!("\nURLs the instance may be available at:\n");

        let ips = instance.external_ips();
        if ips.is_empty() {
            warn!("instance has no public address yet");
        }
        for ip in ips {
            for port in &self.config.ports {
                println!("http://{}:{}/", ip, port);
            }
        }
    }

    /// Block until the user presses Enter
    async fn pause_for_user(&self) -> Result<()> {
        use tokio::io::{AsyncBufReadExt, BufReader};

        println!("\nPress Enter to tear the instance down...");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| Error::io("waiting for keypress", e))?;
        Ok(())
    }

    async fn write_teardown_record(&self, run_id: Uuid) -> Result<()> {
        let record = TeardownRecord::new(
            run_id,
            &self.config.project,
            &self.config.zone,
            &self.config.instance_name,
        );
        let path = TeardownRecord::path(&self.config.staging_dir);

        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| Error::io("encoding teardown record", std::io::Error::other(e)))?;
        tokio::fs::create_dir_all(&self.config.staging_dir)
            .await
            .map_err(|e| Error::io("creating staging directory", e))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| Error::io("writing teardown record", e))?;

        info!(record = %path.display(), "teardown record written");
        Ok(())
    }

    async fn clear_teardown_record(&self) {
        let path = TeardownRecord::path(&self.config.staging_dir);
        // The record only matters while the instance exists; failing to
        // remove it leaves a stale pointer, not a leak.
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(record = %path.display(), error = %e, "could not remove teardown record");
            }
        }
    }

    fn advance(&self, phase: &mut DeployPhase, next: DeployPhase) {
        *phase = next;
        info!(phase = %next, "entering phase");
    }
}
