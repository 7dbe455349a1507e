//! Spreadsheet-style record store backed by a delimited text file.
//!
//! Rows follow the persisted layout in [`crate::layout`], so a sheet can be
//! opened in any spreadsheet tool or exported from and imported into the SQL
//! backend.
//!
//! The file has no conditional write of its own. Mutations are serialized per
//! user with [`KeyedLocks`], the target row is re-read immediately before the
//! write, and the write itself re-checks the row and gives up rather than
//! overwrite a code. Each write replaces the whole file through a temporary
//! file and a rename, so readers see either the old or the new document.
//!
//! Edits made by another process between the re-read and the rename are not
//! seen; run a single writer per file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::keyed::KeyedLocks;
use crate::layout::{self, HeaderKind, Sheet};
use crate::record::{
    IssueOutcome, JoinOutcome, PromoCode, StoredTime, StubOutcome, UserId, UserRecord, non_empty,
};
use crate::traits::RecordStore;

/// Record store kept in a single sheet file.
#[derive(Debug)]
pub struct SheetStore {
    path: PathBuf,
    /// Serializes read-modify-write of the file itself.
    file: AsyncMutex<()>,
    /// Serializes check-then-write sequences per user.
    keys: KeyedLocks<UserId>,
}

impl SheetStore {
    /// Open a sheet, creating it with a header row if it does not exist.
    ///
    /// Fails with [`StoreError::Layout`] if the file has an unknown header.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            file: AsyncMutex::new(()),
            keys: KeyedLocks::new(),
        };

        let sheet = store.read_sheet().await?;
        if !fs::try_exists(&store.path).await? {
            store.write_sheet(&sheet).await?;
        } else if sheet.header == HeaderKind::Legacy {
            debug!(path = %store.path.display(), "legacy sheet header, upgraded on next write");
        }
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_sheet(&self) -> Result<Sheet, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => layout::decode(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Sheet::empty()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_sheet(&self, sheet: &Sheet) -> Result<(), StoreError> {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(layout::encode_sheet(sheet)?.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the sheet, apply `edit`, and write it back if `edit` reports a change.
    async fn patch<T, F>(&self, edit: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Sheet) -> Result<(T, bool), StoreError>,
    {
        let _file = self.file.lock().await;
        let mut sheet = self.read_sheet().await?;
        let (result, changed) = edit(&mut sheet)?;
        if changed {
            self.write_sheet(&sheet).await?;
        }
        Ok(result)
    }
}

/// Index of the row used for `user_id`: the first one, with a loud warning
/// when the sheet holds more than one.
fn first_row(sheet: &Sheet, user_id: UserId) -> Option<usize> {
    let positions = sheet.positions(user_id);
    if positions.len() > 1 {
        warn!(
            user_id = %user_id,
            duplicates = positions.len(),
            "duplicate records in sheet, using the first"
        );
    }
    positions.first().copied()
}

#[async_trait]
impl RecordStore for SheetStore {
    async fn find(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let sheet = self.read_sheet().await?;
        Ok(first_row(&sheet, user_id).and_then(|i| sheet.record(i).cloned()))
    }

    async fn upsert_join(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        let _key = self.keys.lock(&user_id).await;
        self.patch(|sheet| {
            let Some(i) = first_row(sheet, user_id) else {
                sheet.push(UserRecord::joined(user_id, display_name, joined_at));
                return Ok((JoinOutcome::Created, true));
            };
            let row = sheet
                .record_mut(i)
                .ok_or(StoreError::MissingRecord(user_id))?;
            if row.joined_at.is_some() {
                return Ok((JoinOutcome::AlreadyJoined, false));
            }
            row.joined_at = Some(StoredTime::At(joined_at));
            if row.display_name.is_none() {
                row.display_name = non_empty(display_name);
            }
            Ok((JoinOutcome::WindowOpened, true))
        })
        .await
    }

    async fn issue_code(
        &self,
        user_id: UserId,
        code: &PromoCode,
        issued_at: DateTime<Utc>,
    ) -> Result<IssueOutcome, StoreError> {
        let _key = self.keys.lock(&user_id).await;

        // Re-read the row right before the conditional write.
        match self.find(user_id).await? {
            None => return Err(StoreError::MissingRecord(user_id)),
            Some(record) if record.has_code() => return Ok(IssueOutcome::AlreadyIssued),
            Some(_) => {}
        }

        self.patch(|sheet| {
            let row = first_row(sheet, user_id)
                .and_then(|i| sheet.record_mut(i))
                .ok_or(StoreError::MissingRecord(user_id))?;
            if row.has_code() {
                return Ok((IssueOutcome::AlreadyIssued, false));
            }
            row.code = Some(code.clone());
            row.code_issued_at = Some(StoredTime::At(issued_at));
            Ok((IssueOutcome::Issued, true))
        })
        .await
    }

    async fn create_stub(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<StubOutcome, StoreError> {
        let _key = self.keys.lock(&user_id).await;
        self.patch(|sheet| {
            if first_row(sheet, user_id).is_some() {
                return Ok((StubOutcome::AlreadyExists, false));
            }
            sheet.push(UserRecord::stub(user_id, display_name));
            Ok((StubOutcome::Created, true))
        })
        .await
    }

    async fn create_joined(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<StubOutcome, StoreError> {
        let _key = self.keys.lock(&user_id).await;
        self.patch(|sheet| {
            if first_row(sheet, user_id).is_some() {
                return Ok((StubOutcome::AlreadyExists, false));
            }
            sheet.push(UserRecord::joined(user_id, display_name, joined_at));
            Ok((StubOutcome::Created, true))
        })
        .await
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let sheet = self.read_sheet().await?;
        let mut rows: Vec<UserRecord> = sheet.records().cloned().collect();
        // Stable sort keeps duplicates in file order.
        rows.sort_by_key(|r| r.user_id);
        Ok(rows)
    }
}
