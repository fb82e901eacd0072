//! Mock implementation of DeviceRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::device::DeviceRecord;
use crate::errors::DomainResult;

use super::r#trait::DeviceRepository;

#[derive(Clone, Default)]
pub struct MockDeviceRepository {
    devices: Arc<RwLock<HashMap<(Uuid, String), DeviceRecord>>>,
}

impl MockDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: Uuid, device_id: &str) -> Option<DeviceRecord> {
        self.devices
            .read()
            .await
            .get(&(user_id, device_id.to_string()))
            .cloned()
    }

    pub async fn put(&self, record: DeviceRecord) {
        self.devices
            .write()
            .await
            .insert((record.user_id, record.device_id.clone()), record);
    }
}

#[async_trait]
impl DeviceRepository for MockDeviceRepository {
    async fn find(&self, user_id: Uuid, device_id: &str) -> DomainResult<Option<DeviceRecord>> {
        Ok(self.get(user_id, device_id).await)
    }

    async fn touch(
        &self,
        user_id: Uuid,
        device_id: &str,
        user_agent: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<DeviceRecord> {
        let mut devices = self.devices.write().await;
        let record = devices
            .entry((user_id, device_id.to_string()))
            .and_modify(|d| d.touch(user_agent, ip, now))
            .or_insert_with(|| DeviceRecord::new(user_id, device_id, user_agent, ip, now));
        Ok(record.clone())
    }

    async fn list_trusted(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<Vec<DeviceRecord>> {
        let devices = self.devices.read().await;
        Ok(devices
            .values()
            .filter(|d| d.user_id == user_id && d.is_trusted(now))
            .cloned()
            .collect())
    }

    async fn set_trusted_until(
        &self,
        user_id: Uuid,
        device_id: &str,
        trusted_until: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut devices = self.devices.write().await;
        match devices.get_mut(&(user_id, device_id.to_string())) {
            Some(device) => {
                device.trusted_until = Some(trusted_until);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_trust(&self, user_id: Uuid, device_id: &str) -> DomainResult<bool> {
        let mut devices = self.devices.write().await;
        Ok(devices
            .get_mut(&(user_id, device_id.to_string()))
            .and_then(|d| d.trusted_until.take())
            .is_some())
    }

    async fn clear_idle_trust(
        &self,
        user_id: Option<Uuid>,
        idle_before: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let mut devices = self.devices.write().await;
        let mut cleared = 0;
        for device in devices.values_mut() {
            let in_scope = user_id.map_or(true, |id| id == device.user_id);
            if in_scope && device.last_seen_at < idle_before && device.trusted_until.take().is_some() {
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}
