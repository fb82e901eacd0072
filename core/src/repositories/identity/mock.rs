//! Mock implementation of IdentityStore for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::entities::user::UserAccount;
use crate::errors::DomainResult;

use super::r#trait::IdentityStore;

/// In-memory accounts with plaintext passwords
#[derive(Clone, Default)]
pub struct MockIdentityStore {
    pub users: Arc<Mutex<Vec<UserAccount>>>,
    passwords: Arc<Mutex<HashMap<Uuid, String>>>,
}

impl MockIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password_user(login_name: &str, password: &str, phone: Option<&str>) -> (Self, UserAccount) {
        let store = Self::new();
        let mut user = UserAccount::for_phone(phone.unwrap_or_default(), Utc::now());
        user.login_name = Some(login_name.to_string());
        user.phone_number = phone.map(str::to_string);
        user.phone_confirmed = phone.is_some();
        store.users.lock().unwrap().push(user.clone());
        store
            .passwords
            .lock()
            .unwrap()
            .insert(user.id, password.to_string());
        (store, user)
    }

    pub fn user(&self, user_id: Uuid) -> Option<UserAccount> {
        self.users.lock().unwrap().iter().find(|u| u.id == user_id).cloned()
    }

    fn update<F: FnOnce(&mut UserAccount)>(&self, user_id: Uuid, f: F) {
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == user_id) {
            f(user);
        }
    }
}

#[async_trait]
impl IdentityStore for MockIdentityStore {
    async fn find_by_id(&self, user_id: Uuid) -> DomainResult<Option<UserAccount>> {
        Ok(self.user(user_id))
    }

    async fn find_by_login(&self, login_name_or_email: &str) -> DomainResult<Option<UserAccount>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| {
                u.login_name.as_deref() == Some(login_name_or_email)
                    || u.email.as_deref() == Some(login_name_or_email)
            })
            .cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> DomainResult<Option<UserAccount>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.phone_number.as_deref() == Some(phone_number))
            .cloned())
    }

    async fn create_for_phone(&self, phone_number: &str, now: DateTime<Utc>) -> DomainResult<UserAccount> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter().find(|u| u.phone_number.as_deref() == Some(phone_number)) {
            return Ok(existing.clone());
        }
        let user = UserAccount::for_phone(phone_number, now);
        users.push(user.clone());
        Ok(user)
    }

    async fn confirm_phone(&self, user_id: Uuid) -> DomainResult<()> {
        self.update(user_id, |u| u.phone_confirmed = true);
        Ok(())
    }

    async fn check_password(&self, user_id: Uuid, password: &str) -> DomainResult<bool> {
        let passwords = self.passwords.lock().unwrap();
        Ok(passwords.get(&user_id).map(|p| p == password).unwrap_or(false))
    }

    async fn is_locked_out(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<bool> {
        Ok(self.user(user_id).map(|u| u.is_locked_out(now)).unwrap_or(false))
    }

    async fn record_failed_attempt(&self, user_id: Uuid) -> DomainResult<i32> {
        let mut count = 0;
        self.update(user_id, |u| {
            u.access_failed_count += 1;
            count = u.access_failed_count;
        });
        Ok(count)
    }

    async fn set_lockout_end(&self, user_id: Uuid, lockout_end: Option<DateTime<Utc>>) -> DomainResult<()> {
        self.update(user_id, |u| u.lockout_end = lockout_end);
        Ok(())
    }

    async fn reset_failed_attempts(&self, user_id: Uuid) -> DomainResult<()> {
        self.update(user_id, |u| u.access_failed_count = 0);
        Ok(())
    }
}
