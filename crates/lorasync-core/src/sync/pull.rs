// ── Pull: remote → local ──

use tracing::{debug, info};

use super::{SyncEngine, SyncOutcome, SyncReport};
use crate::adapter::{NetworkProtocol, Remote, RemoteDevice};
use crate::error::CoreError;
use crate::model::{Application, LocalId, Network};
use crate::store::{DataKey, EntityKind};

impl SyncEngine {
    /// Import every application and device of `network` under `company_id`.
    ///
    /// Aborts on the first error. Records already written stay written;
    /// a re-run picks up where the previous one stopped because every
    /// step is find-or-create.
    pub async fn pull(
        &self,
        network: &Network,
        adapter: &dyn NetworkProtocol,
        company_id: LocalId,
    ) -> Result<SyncReport, CoreError> {
        self.locals
            .get_company(company_id)
            .await?
            .ok_or_else(|| CoreError::not_found("company", company_id))?;
        adapter.connect(network).await?;

        let mut report = SyncReport::new(network.id.clone());
        let remote_apps = adapter.list_applications(network).await?;
        debug!(network = %network.id, count = remote_apps.len(), "remote applications listed");

        for remote_app in &remote_apps {
            let app_id = self
                .pull_application(network, company_id, remote_app, &mut report)
                .await?;

            let devices = adapter.list_devices(network, &remote_app.id).await?;
            debug!(
                network = %network.id,
                application_id = %remote_app.id,
                count = devices.len(),
                "remote devices listed"
            );
            for remote_device in &devices {
                self.pull_device(network, company_id, app_id, remote_device, &mut report)
                    .await?;
            }
        }

        info!(
            network = %network.id,
            created = report.created(),
            already_synced = report.already_synced(),
            "pull complete"
        );
        Ok(report)
    }

    async fn pull_application(
        &self,
        network: &Network,
        company_id: LocalId,
        remote: &Remote<Application>,
        report: &mut SyncReport,
    ) -> Result<LocalId, CoreError> {
        let name = remote.entity.name.as_str();
        let record = match self.locals.find_application_by_name(company_id, name).await? {
            Some(record) => record,
            None => {
                let record = self
                    .locals
                    .create_application(company_id, remote.entity.clone())
                    .await?;
                info!(local_id = %record.id, name, "local application created");
                record
            }
        };

        if self
            .locals
            .find_application_link(record.id, &network.id)
            .await?
            .is_some()
        {
            report.record(EntityKind::Application, record.id, name, SyncOutcome::AlreadySynced);
            return Ok(record.id);
        }

        self.locals
            .create_application_link(record.id, &network.id, remote.entity.clone())
            .await?;
        self.data
            .upsert(
                &network.id,
                &DataKey::remote_id(EntityKind::Application, record.id),
                remote.id.as_str(),
            )
            .await?;
        report.record(
            EntityKind::Application,
            record.id,
            name,
            SyncOutcome::Created {
                remote_id: remote.id.clone(),
            },
        );
        Ok(record.id)
    }

    /// Resolve the device profile, then the device, then its link.
    async fn pull_device(
        &self,
        network: &Network,
        company_id: LocalId,
        application_id: LocalId,
        remote: &RemoteDevice,
        report: &mut SyncReport,
    ) -> Result<(), CoreError> {
        let profile_id = self
            .pull_device_profile(network, company_id, remote, report)
            .await?;

        let device = &remote.device;
        let record = match self.locals.find_device_by_dev_eui(&device.dev_eui).await? {
            Some(record) => record,
            None => {
                let record = self
                    .locals
                    .create_device(application_id, device.clone())
                    .await?;
                info!(local_id = %record.id, dev_eui = %device.dev_eui, "local device created");
                record
            }
        };

        if self
            .locals
            .find_device_link(record.id, &network.id)
            .await?
            .is_some()
        {
            report.record(EntityKind::Device, record.id, &device.name, SyncOutcome::AlreadySynced);
            return Ok(());
        }

        self.locals
            .create_device_link(record.id, &network.id, profile_id, device.clone())
            .await?;
        self.data
            .upsert(
                &network.id,
                &DataKey::remote_id(EntityKind::Device, record.id),
                remote.id.as_str(),
            )
            .await?;
        report.record(
            EntityKind::Device,
            record.id,
            &device.name,
            SyncOutcome::Created {
                remote_id: remote.id.clone(),
            },
        );
        Ok(())
    }

    /// Find or create the local profile a remote device uses. A profile
    /// is reported once: when its mapping is first recorded, or when a
    /// synthesized one is first stored.
    async fn pull_device_profile(
        &self,
        network: &Network,
        company_id: LocalId,
        remote: &RemoteDevice,
        report: &mut SyncReport,
    ) -> Result<LocalId, CoreError> {
        let name = remote.profile.name.as_str();
        let (record, created) = match self
            .locals
            .find_device_profile_by_name(company_id, name)
            .await?
        {
            Some(record) => (record, false),
            None => {
                let record = self
                    .locals
                    .create_device_profile(company_id, remote.profile.clone())
                    .await?;
                info!(local_id = %record.id, name, "local device profile created");
                (record, true)
            }
        };

        let Some(remote_id) = &remote.profile_id else {
            if created {
                report.record(EntityKind::DeviceProfile, record.id, name, SyncOutcome::Synthesized);
            }
            return Ok(record.id);
        };

        let key = DataKey::remote_id(EntityKind::DeviceProfile, record.id);
        if self.data.load_value(&network.id, &key).await?.is_none() {
            self.data
                .upsert(&network.id, &key, remote_id.as_str())
                .await?;
            report.record(
                EntityKind::DeviceProfile,
                record.id,
                name,
                SyncOutcome::Created {
                    remote_id: remote_id.clone(),
                },
            );
        }
        Ok(record.id)
    }
}
