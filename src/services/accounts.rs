// src/services/accounts.rs

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::HashCost,
    error::AppError,
    models::user::{Account, Role, StoredAccount},
    services::{notifications::NotificationLog, scores::ScoreCollection, session_slot::SessionSlot},
    store::{Bucket, Records},
    utils::hash::{hash_password, verify_password},
};

const DUPLICATE_EMAIL: &str = "An account with this email already exists.";
const EMAIL_TAKEN: &str = "This email is already taken by another account.";
const USER_NOT_FOUND: &str = "User not found.";
const WRONG_PASSWORD: &str = "Incorrect current password.";

/// User and administrator accounts.
///
/// Password hashes never leave this type: every returned or notified account is the
/// secret-free `Account`. Email changes and deletions cascade into the score collection.
#[derive(Clone)]
pub struct AccountCollection {
    records: Records,
    scores: ScoreCollection,
    notifications: NotificationLog,
    slot: SessionSlot,
    hash_cost: HashCost,
}

impl AccountCollection {
    pub fn new(
        records: Records,
        scores: ScoreCollection,
        notifications: NotificationLog,
        slot: SessionSlot,
        hash_cost: HashCost,
    ) -> Self {
        Self {
            records,
            scores,
            notifications,
            slot,
            hash_cost,
        }
    }

    /// Seeds the owner administrator when no account exists yet.
    /// Returns whether the owner was created.
    pub async fn initialize_defaults(&self, email: &str, password: &str) -> Result<bool, AppError> {
        let existing: Vec<StoredAccount> = self.records.read_all(Bucket::Accounts).await;
        if !existing.is_empty() {
            return Ok(false);
        }

        let owner = StoredAccount {
            account: Account {
                id: Uuid::new_v4().to_string(),
                email: email.to_string(),
                role: Role::Admin,
                last_login: None,
                owner: true,
            },
            password: hash_password(password, self.hash_cost)?,
        };

        let seeded = self
            .records
            .update(Bucket::Accounts, move |accounts: &mut Vec<StoredAccount>| {
                if !accounts.is_empty() {
                    return Err(AppError::Conflict("Accounts already present".to_string()));
                }
                accounts.push(owner);
                Ok(())
            })
            .await;

        match seeded {
            Ok(()) => {
                tracing::info!(email = %email, "Seeded owner administrator");
                Ok(true)
            }
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Checks credentials.
    ///
    /// On success stamps `last_login`, stores the account in the session slot,
    /// and records a login notification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Account>, AppError> {
        self.records.simulate_latency().await;

        let accounts: Vec<StoredAccount> = self.records.read_all(Bucket::Accounts).await;
        let Some(stored) = accounts.into_iter().find(|a| a.account.email == email) else {
            return Ok(None);
        };

        match verify_password(password, &stored.password) {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => {
                tracing::warn!(account_id = %stored.account.id, error = %e, "Unreadable password hash");
                return Ok(None);
            }
        }

        let id = stored.account.id;
        let stamped = self
            .records
            .update(Bucket::Accounts, |accounts: &mut Vec<StoredAccount>| {
                let stored = find_mut(accounts, &id)?;
                stored.account.last_login = Some(Utc::now());
                Ok(stored.public())
            })
            .await;

        let account = match stamped {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.slot.set(&account).await?;
        tracing::info!(account_id = %account.id, "Login");
        self.notify(format!("'{}' ({}) has logged in.", account.email, account.role))
            .await;
        Ok(Some(account))
    }

    /// Self-service registration as a `user`. Returns `None` if the email is taken.
    /// The new account becomes the signed-in account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Account>, AppError> {
        self.records.simulate_latency().await;

        let account = match self.insert(email, password, Role::User).await {
            Ok(account) => account,
            Err(AppError::Conflict(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.slot.set(&account).await?;
        self.notify(format!("New user signed up: {}.", email)).await;
        Ok(Some(account))
    }

    /// Admin-initiated creation of a `user` account.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<Account, AppError> {
        self.records.simulate_latency().await;
        let account = self.insert(email, password, Role::User).await?;
        self.notify(format!("New user account created: {}.", email)).await;
        Ok(account)
    }

    /// Admin-initiated creation of an `admin` account.
    pub async fn create_admin_user(&self, email: &str, password: &str) -> Result<Account, AppError> {
        self.records.simulate_latency().await;
        let account = self.insert(email, password, Role::Admin).await?;
        self.notify(format!("New admin account created: {}.", email)).await;
        Ok(account)
    }

    /// Changes an account's email and rewrites the email snapshot on its scores.
    ///
    /// If the scores cannot be rewritten, the account gets its previous email back and
    /// the storage error is returned, so account and scores never disagree.
    pub async fn change_email(&self, account_id: &str, new_email: &str) -> Result<Account, AppError> {
        self.records.simulate_latency().await;

        let (previous_email, updated) = self
            .records
            .update(Bucket::Accounts, |accounts: &mut Vec<StoredAccount>| {
                if accounts
                    .iter()
                    .any(|a| a.account.email == new_email && a.account.id != account_id)
                {
                    return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
                }
                let stored = find_mut(accounts, account_id)?;
                let previous = std::mem::replace(&mut stored.account.email, new_email.to_string());
                Ok((previous, stored.public()))
            })
            .await?;

        let rewritten = match self.scores.propagate_email(account_id, new_email).await {
            Ok(rewritten) => rewritten,
            Err(e) => {
                tracing::error!(
                    account_id = %account_id,
                    error = %e,
                    "Failed to rewrite score emails, restoring account email"
                );
                self.restore_email(account_id, new_email, &previous_email).await;
                return Err(e);
            }
        };
        tracing::info!(account_id = %account_id, scores = rewritten, "Email changed");

        if self.slot.is_current(account_id).await {
            self.slot.set(&updated).await?;
        }
        Ok(updated)
    }

    /// Puts `previous` back unless the account has been changed again meanwhile.
    async fn restore_email(&self, account_id: &str, attempted: &str, previous: &str) {
        let restored = self
            .records
            .update(Bucket::Accounts, |accounts: &mut Vec<StoredAccount>| {
                let stored = find_mut(accounts, account_id)?;
                if stored.account.email != attempted {
                    return Err(AppError::Conflict("Email changed again".to_string()));
                }
                stored.account.email = previous.to_string();
                Ok(())
            })
            .await;

        match restored {
            Ok(()) | Err(AppError::NotFound(_)) | Err(AppError::Conflict(_)) => {}
            Err(e) => {
                tracing::error!(account_id = %account_id, error = %e, "Failed to restore account email");
            }
        }
    }

    pub async fn change_password(
        &self,
        account_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.records.simulate_latency().await;

        let accounts: Vec<StoredAccount> = self.records.read_all(Bucket::Accounts).await;
        let stored = accounts
            .iter()
            .find(|a| a.account.id == account_id)
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        if !verify_password(current_password, &stored.password).unwrap_or(false) {
            return Err(AppError::AuthError(WRONG_PASSWORD.to_string()));
        }

        let hashed = hash_password(new_password, self.hash_cost)?;
        self.records
            .update(Bucket::Accounts, move |accounts: &mut Vec<StoredAccount>| {
                find_mut(accounts, account_id)?.password = hashed;
                Ok(())
            })
            .await
    }

    /// Returns `None` for an unknown id. The owner cannot be demoted.
    pub async fn set_role(&self, account_id: &str, role: Role) -> Result<Option<Account>, AppError> {
        self.records.simulate_latency().await;

        let updated = self
            .records
            .update(Bucket::Accounts, |accounts: &mut Vec<StoredAccount>| {
                let stored = find_mut(accounts, account_id)?;
                if stored.account.owner && role != Role::Admin {
                    return Err(AppError::Forbidden(
                        "The owner account cannot be demoted.".to_string(),
                    ));
                }
                stored.account.role = role;
                Ok(stored.public())
            })
            .await;

        let account = match updated {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.notify(format!("Role for {} changed to {}.", account.email, role))
            .await;
        Ok(Some(account))
    }

    /// Deletes an account together with all of its scores.
    /// Unknown ids are ignored; the owner cannot be deleted.
    pub async fn delete_account(&self, account_id: &str) -> Result<(), AppError> {
        self.records.simulate_latency().await;

        let removed = self
            .records
            .update(Bucket::Accounts, |accounts: &mut Vec<StoredAccount>| {
                let index = accounts
                    .iter()
                    .position(|a| a.account.id == account_id)
                    .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;
                if accounts[index].account.owner {
                    return Err(AppError::Forbidden(
                        "The owner account cannot be deleted.".to_string(),
                    ));
                }
                Ok(accounts.remove(index).public())
            })
            .await;

        let account = match removed {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        let scores = self.scores.remove_all_for_user(account_id).await?;
        tracing::info!(account_id = %account_id, scores, "Account deleted");

        if self.slot.is_current(account_id).await {
            self.slot.clear().await?;
        }
        self.notify(format!("User {} has been deleted.", account.email))
            .await;
        Ok(())
    }

    pub async fn list_all(&self) -> Vec<Account> {
        self.records.simulate_latency().await;
        let accounts: Vec<StoredAccount> = self.records.read_all(Bucket::Accounts).await;
        accounts.iter().map(StoredAccount::public).collect()
    }

    pub async fn get_by_id(&self, account_id: &str) -> Option<Account> {
        self.list_all().await.into_iter().find(|a| a.id == account_id)
    }

    pub async fn current(&self) -> Option<Account> {
        self.slot.current().await
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.slot.clear().await
    }

    /// Hashes outside the write lock, then inserts if the email is still free.
    async fn insert(&self, email: &str, password: &str, role: Role) -> Result<Account, AppError> {
        let stored = StoredAccount {
            account: Account {
                id: Uuid::new_v4().to_string(),
                email: email.to_string(),
                role,
                last_login: None,
                owner: false,
            },
            password: hash_password(password, self.hash_cost)?,
        };

        self.records
            .update(Bucket::Accounts, move |accounts: &mut Vec<StoredAccount>| {
                if accounts.iter().any(|a| a.account.email == stored.account.email) {
                    return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
                }
                let account = stored.public();
                accounts.push(stored);
                Ok(account)
            })
            .await
    }

    /// Notification failures never fail the account operation that triggered them.
    async fn notify(&self, message: String) {
        if let Err(e) = self.notifications.append(message).await {
            tracing::error!(error = %e, "Failed to record notification");
        }
    }
}

fn find_mut<'a>(accounts: &'a mut [StoredAccount], id: &str) -> Result<&'a mut StoredAccount, AppError> {
    accounts
        .iter_mut()
        .find(|a| a.account.id == id)
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
}
