// TTN handler device and downlink endpoints

use crate::error::Error;
use crate::ttn::client::{Server, TtnClient};
use crate::ttn::models::{Device, DeviceList, DownlinkMessage};

impl TtnClient {
    /// `GET {handler}/applications/{app_id}/devices`
    pub async fn list_devices(&self, app_id: &str) -> Result<Vec<Device>, Error> {
        let list: DeviceList = self
            .get(Server::Handler, &format!("applications/{app_id}/devices"))
            .await?;
        Ok(list.devices)
    }

    /// `GET {handler}/applications/{app_id}/devices/{dev_id}`
    pub async fn get_device(&self, app_id: &str, dev_id: &str) -> Result<Device, Error> {
        self.get(
            Server::Handler,
            &format!("applications/{app_id}/devices/{dev_id}"),
        )
        .await
    }

    /// `POST {handler}/applications/{app_id}/devices`
    pub async fn create_device(&self, device: &Device) -> Result<(), Error> {
        self.post(
            Server::Handler,
            &format!("applications/{}/devices", device.app_id),
            device,
        )
        .await
    }

    /// `POST {handler}/applications/{app_id}/devices/{dev_id}`
    ///
    /// The v2 handler updates devices with a POST on the device path.
    pub async fn update_device(&self, device: &Device) -> Result<(), Error> {
        self.post(
            Server::Handler,
            &format!("applications/{}/devices/{}", device.app_id, device.dev_id),
            device,
        )
        .await
    }

    /// `DELETE {handler}/applications/{app_id}/devices/{dev_id}`
    pub async fn delete_device(&self, app_id: &str, dev_id: &str) -> Result<(), Error> {
        self.delete(
            Server::Handler,
            &format!("applications/{app_id}/devices/{dev_id}"),
        )
        .await
    }

    /// Schedule a downlink.
    ///
    /// `POST {handler}/applications/{app_id}/down`
    pub async fn send_downlink(&self, app_id: &str, msg: &DownlinkMessage) -> Result<(), Error> {
        self.post(Server::Handler, &format!("applications/{app_id}/down"), msg)
            .await
    }
}
