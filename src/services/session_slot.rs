// src/services/session_slot.rs

use crate::{
    error::AppError,
    models::user::Account,
    store::{Bucket, Records},
};

/// The persisted "who is signed in" slot. Holds a secret-free account or nothing.
#[derive(Clone)]
pub struct SessionSlot {
    records: Records,
}

impl SessionSlot {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    pub async fn current(&self) -> Option<Account> {
        self.records.read_one(Bucket::CurrentAccount).await
    }

    pub async fn set(&self, account: &Account) -> Result<(), AppError> {
        self.records.write_one(Bucket::CurrentAccount, account).await
    }

    /// Signs out.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.records.clear(Bucket::CurrentAccount).await
    }

    pub(crate) async fn is_current(&self, account_id: &str) -> bool {
        self.current().await.is_some_and(|a| a.id == account_id)
    }
}
